mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::import::{CancelToken, SinkError, TransactionSink};
use crate::models::*;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tx.commit()?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .context("Failed to read schema version")?;

        if current > schema::CURRENT_VERSION {
            anyhow::bail!(
                "Database schema version {current} is newer than supported version {}",
                schema::CURRENT_VERSION
            );
        }

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    #[cfg(test)]
    pub(crate) fn get_transactions_for_user(&self, user: &UserId) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, date, description, category, amount, type
             FROM transactions WHERE user_id = ?1 ORDER BY date, id",
        )?;
        let rows = stmt.query_map(params![user.as_str()], |row| {
            let user_id: String = row.get(0)?;
            let amount_str: String = row.get(4)?;
            let kind_str: String = row.get(5)?;
            Ok((
                user_id,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                amount_str,
                kind_str,
            ))
        })?;

        let mut txns = Vec::new();
        for row in rows {
            let (user_id, date, description, category, amount, kind) = row?;
            txns.push(Transaction {
                user_id: UserId::new(user_id)
                    .ok_or_else(|| anyhow::anyhow!("Stored transaction has no owner"))?,
                date,
                description,
                category,
                amount: Decimal::from_str(&amount)
                    .with_context(|| format!("Stored amount '{amount}' is not a decimal"))?,
                kind: TransactionType::parse(&kind)
                    .ok_or_else(|| anyhow::anyhow!("Stored type '{kind}' is not recognised"))?,
            });
        }
        Ok(txns)
    }

    #[cfg(test)]
    pub(crate) fn get_transaction_count(&self, user: &UserId) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?1",
            params![user.as_str()],
            |row| row.get(0),
        )?)
    }
}

impl TransactionSink for Database {
    fn commit_batch(
        &mut self,
        user: &UserId,
        txns: &[Transaction],
        cancel: &CancelToken,
    ) -> std::result::Result<usize, SinkError> {
        let now = chrono::Utc::now().to_rfc3339();
        // Dropping `tx` without commit rolls back.
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO transactions (user_id, date, description, category, amount, type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for txn in txns {
                if cancel.is_cancelled() {
                    return Err(SinkError::Cancelled);
                }
                if &txn.user_id != user {
                    return Err(SinkError::UserMismatch);
                }
                stmt.execute(params![
                    user.as_str(),
                    txn.date,
                    txn.description,
                    txn.category,
                    txn.amount.to_string(),
                    txn.kind.as_str(),
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(txns.len())
    }
}
