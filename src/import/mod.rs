mod commit;
mod detect;
mod error;
mod normalize;
mod table;

#[cfg(test)]
mod fixtures;

pub(crate) use commit::{SinkError, TransactionSink};
pub(crate) use error::{ErrorKind, ErrorReport, ImportError};

use serde::Serialize;
use std::io::{Read, Seek};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::UserId;

/// An uploaded statement: the client-supplied name and its bytes.
pub(crate) struct Statement<R> {
    pub(crate) filename: String,
    pub(crate) content: R,
}

/// Shared flag the caller flips to abandon an in-flight import. Checked
/// between rows and between inserts; a cancelled commit is rolled back.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// For a caller that drives the import from another thread; the one-shot
    /// CLI never cancels.
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Status {
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ImportSummary {
    pub(crate) status: Status,
    /// Transactions committed.
    pub(crate) count: usize,
    /// Blank rows passed over.
    pub(crate) skipped: usize,
}

/// Detect, parse, normalize and commit one statement for `user`.
///
/// Any invalid row aborts the batch: every row is still checked so the
/// error carries the full list, but nothing reaches the sink.
pub(crate) fn ingest_statement<R, S>(
    statement: Statement<R>,
    user: &UserId,
    sink: &mut S,
    cancel: &CancelToken,
) -> Result<ImportSummary, ImportError>
where
    R: Read + Seek,
    S: TransactionSink + ?Sized,
{
    let Statement {
        filename,
        mut content,
    } = statement;

    let format = detect::detect_format(&filename, &mut content)?;
    debug!(filename = %filename, ?format, "statement format detected");

    let mut txns = Vec::new();
    let mut rejected = Vec::new();
    let mut skipped = 0;

    for row in table::read_table(format, content)? {
        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }
        let row = row?;
        if row.is_blank() {
            skipped += 1;
            continue;
        }
        match normalize::normalize_row(user, &row) {
            Ok(txn) => txns.push(txn),
            Err(e) => {
                warn!(filename = %filename, "{e}");
                rejected.push(e);
            }
        }
    }

    if !rejected.is_empty() {
        warn!(
            filename = %filename,
            rejected = rejected.len(),
            valid = txns.len(),
            "statement rejected"
        );
        return Err(ImportError::RowValidation(rejected));
    }

    let count = commit::commit_batch(sink, user, &txns, cancel)?;
    Ok(ImportSummary {
        status: Status::Success,
        count,
        skipped,
    })
}
