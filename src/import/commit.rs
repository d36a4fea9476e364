use thiserror::Error;
use tracing::{error, info};

use super::error::ImportError;
use super::CancelToken;
use crate::models::{Transaction, UserId};

#[derive(Debug, Error)]
pub(crate) enum SinkError {
    #[error("storage failure")]
    Storage(#[from] rusqlite::Error),
    #[error("transaction belongs to another user")]
    UserMismatch,
    #[error("commit cancelled before completion")]
    Cancelled,
}

/// Write contract for the store that receives an uploaded batch.
///
/// Implementations must make the whole slice visible at once or not at all:
/// on any error, including `Cancelled`, nothing from this call may remain.
pub(crate) trait TransactionSink {
    fn commit_batch(
        &mut self,
        user: &UserId,
        txns: &[Transaction],
        cancel: &CancelToken,
    ) -> Result<usize, SinkError>;
}

/// Persist a validated batch for `user` as one unit. Single attempt; retry
/// policy belongs to the caller.
pub(crate) fn commit_batch<S: TransactionSink + ?Sized>(
    sink: &mut S,
    user: &UserId,
    txns: &[Transaction],
    cancel: &CancelToken,
) -> Result<usize, ImportError> {
    if txns.iter().any(|t| &t.user_id != user) {
        error!(user = %user, "refusing batch containing another user's transactions");
        return Err(ImportError::Commit(SinkError::UserMismatch));
    }
    if cancel.is_cancelled() {
        return Err(ImportError::Cancelled);
    }
    if txns.is_empty() {
        return Ok(0);
    }

    match sink.commit_batch(user, txns, cancel) {
        Ok(count) => {
            let income = txns.iter().filter(|t| t.is_income()).count();
            let uncategorized = txns.iter().filter(|t| t.is_uncategorized()).count();
            info!(user = %user, count, income, uncategorized, "batch committed");
            Ok(count)
        }
        Err(SinkError::Cancelled) => {
            info!(user = %user, "batch rolled back after cancellation");
            Err(ImportError::Cancelled)
        }
        Err(e) => {
            error!(user = %user, error = ?e, "batch commit failed; rolled back");
            Err(ImportError::Commit(e))
        }
    }
}
