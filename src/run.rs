mod cli;

pub(crate) use cli::{as_cli, flag_value, print_usage, shellexpand};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::import::{
    ingest_statement, CancelToken, ImportError, ImportSummary, Statement, TransactionSink,
};
use crate::models::UserId;

/// Import a statement from disk. The file name is what format detection sees.
pub(crate) fn import_file<S: TransactionSink>(
    path: &Path,
    user: &UserId,
    sink: &mut S,
    cancel: &CancelToken,
) -> Result<ImportSummary, ImportError> {
    let file = File::open(path).map_err(|e| ImportError::parse(None, e))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ingest_statement(
        Statement {
            filename,
            content: BufReader::new(file),
        },
        user,
        sink,
        cancel,
    )
}
