pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL CHECK (user_id <> ''),
    date        TEXT NOT NULL CHECK (date <> ''),
    description TEXT NOT NULL DEFAULT '',
    category    TEXT NOT NULL DEFAULT 'Uncategorized',
    amount      TEXT NOT NULL,
    type        TEXT NOT NULL DEFAULT 'expense' CHECK (type IN ('income', 'expense')),
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
// no migrations yet; version 1 is the first released schema
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
