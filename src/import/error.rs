use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::commit::SinkError;

/// Everything that can stop a statement upload. `Display` output is meant
/// for the uploader and never includes the wrapped error's text; the
/// source chain is for logs.
#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("unsupported file type; upload a .csv, .tsv or .xlsx statement")]
    UnsupportedFormat,

    #[error("the statement file is malformed and could not be read")]
    Parse {
        line: Option<u64>,
        #[source]
        source: ParseFailure,
    },

    #[error("{} row(s) in the statement are invalid; nothing was imported", .0.len())]
    RowValidation(Vec<RowError>),

    #[error("the transactions could not be saved; nothing was imported")]
    Commit(#[source] SinkError),

    #[error("the import was cancelled; nothing was imported")]
    Cancelled,
}

impl ImportError {
    pub(crate) fn parse(line: Option<u64>, source: impl Into<ParseFailure>) -> Self {
        Self::Parse {
            line,
            source: source.into(),
        }
    }

    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat => ErrorKind::UnsupportedFormat,
            Self::Parse { .. } => ErrorKind::ParseError,
            Self::RowValidation(_) => ErrorKind::RowValidationError,
            Self::Commit(_) => ErrorKind::CommitError,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn row_errors(&self) -> &[RowError] {
        match self {
            Self::RowValidation(rows) => rows,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    UnsupportedFormat,
    ParseError,
    RowValidationError,
    CommitError,
    Cancelled,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "UnsupportedFormat",
            Self::ParseError => "ParseError",
            Self::RowValidationError => "RowValidationError",
            Self::CommitError => "CommitError",
            Self::Cancelled => "Cancelled",
        }
    }

    /// True when the uploader has to fix the file; false when retrying the
    /// same file could succeed.
    pub(crate) fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat | Self::ParseError | Self::RowValidationError
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a statement body could not be decoded.
#[derive(Debug, Error)]
pub(crate) enum ParseFailure {
    #[error("failed to read the upload stream")]
    Io(#[from] std::io::Error),
    #[error("malformed delimited text")]
    Csv(#[from] csv::Error),
    #[error("corrupt spreadsheet container")]
    Spreadsheet(#[from] calamine::XlsxError),
    #[error("workbook has no worksheet")]
    NoWorksheet,
}

/// Canonical columns of a statement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Date,
    Description,
    Category,
    Amount,
    Type,
}

impl Field {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Description => "description",
            Self::Category => "category",
            Self::Amount => "amount",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum RowFault {
    #[error("a value is required")]
    Missing,
    #[error("'{0}' is not a recognised date")]
    InvalidDate(String),
    #[error("'{0}' is not a number")]
    InvalidAmount(String),
    #[error("'{0}' is not one of income, expense")]
    InvalidType(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}, column '{field}': {fault}")]
pub(crate) struct RowError {
    pub(crate) row: u64,
    pub(crate) field: Field,
    pub(crate) fault: RowFault,
}

/// Body returned to the uploader when an import fails.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorReport {
    pub(crate) status: &'static str,
    pub(crate) kind: &'static str,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) line: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) rows: Vec<RowErrorReport>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RowErrorReport {
    pub(crate) row: u64,
    pub(crate) field: &'static str,
    pub(crate) reason: String,
}

impl From<&ImportError> for ErrorReport {
    fn from(err: &ImportError) -> Self {
        Self {
            status: "error",
            kind: err.kind().as_str(),
            message: err.to_string(),
            line: match err {
                ImportError::Parse { line, .. } => *line,
                _ => None,
            },
            rows: err
                .row_errors()
                .iter()
                .map(|e| RowErrorReport {
                    row: e.row,
                    field: e.field.column(),
                    reason: e.fault.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
