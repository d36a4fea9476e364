mod transaction;

pub use transaction::{Transaction, TransactionType, UserId, DEFAULT_CATEGORY};
