//! SQLite store adapter.

use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::error::PapertradeError;
use crate::domain::transaction::{Holding, NewTransaction, Transaction};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{StorePort, UserRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PapertradeError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| PapertradeError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| PapertradeError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    /// Single-connection in-memory database, for tests and one-shot CLI use.
    pub fn in_memory() -> Result<Self, PapertradeError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| PapertradeError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), PapertradeError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                cash REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                symbol TEXT NOT NULL,
                company TEXT NOT NULL,
                shares INTEGER NOT NULL,
                price REAL NOT NULL,
                total REAL NOT NULL,
                executed_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_user_symbol
                ON transactions(user_id, symbol);",
        )
        .map_err(query_err)?;

        Ok(())
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, PapertradeError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| PapertradeError::Database {
                reason: e.to_string(),
            })
    }
}

fn query_err(e: rusqlite::Error) -> PapertradeError {
    PapertradeError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            raw.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> Result<Transaction, rusqlite::Error> {
    let executed_at: String = row.get(7)?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symbol: row.get(2)?,
        company: row.get(3)?,
        shares: row.get(4)?,
        price: row.get(5)?,
        total: row.get(6)?,
        executed_at: parse_timestamp(&executed_at)?,
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<UserRecord, rusqlite::Error> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        cash: row.get(3)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl StorePort for SqliteAdapter {
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        starting_cash: f64,
    ) -> Result<i64, PapertradeError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, password_hash, cash) VALUES (?1, ?2, ?3)",
            params![username, password_hash, starting_cash],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                PapertradeError::DuplicateUsername {
                    username: username.to_string(),
                }
            } else {
                query_err(e)
            }
        })?;
        Ok(conn.last_insert_rowid())
    }

    fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>, PapertradeError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, username, password_hash, cash FROM users WHERE id = ?1",
            params![user_id],
            row_to_user,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(query_err(other)),
        })
    }

    fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, PapertradeError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, username, password_hash, cash FROM users WHERE username = ?1",
            params![username],
            row_to_user,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(query_err(other)),
        })
    }

    fn cash(&self, user_id: i64) -> Result<f64, PapertradeError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT cash FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(query_err)
    }

    fn set_cash(&self, user_id: i64, amount: f64) -> Result<(), PapertradeError> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE users SET cash = ?1 WHERE id = ?2",
                params![amount, user_id],
            )
            .map_err(query_err)?;
        if updated == 0 {
            return Err(PapertradeError::DatabaseQuery {
                reason: format!("no such user: {user_id}"),
            });
        }
        Ok(())
    }

    fn record_transaction(
        &self,
        user_id: i64,
        tx: &NewTransaction,
    ) -> Result<i64, PapertradeError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions (user_id, symbol, company, shares, price, total, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                tx.symbol,
                tx.company,
                tx.shares,
                tx.price,
                tx.total,
                tx.executed_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )
        .map_err(query_err)?;
        Ok(conn.last_insert_rowid())
    }

    fn transactions(&self, user_id: i64) -> Result<Vec<Transaction>, PapertradeError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, symbol, company, shares, price, total, executed_at
                 FROM transactions WHERE user_id = ?1 ORDER BY id ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![user_id], row_to_transaction)
            .map_err(query_err)?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row.map_err(query_err)?);
        }
        Ok(transactions)
    }

    fn net_shares(&self, user_id: i64, symbol: &str) -> Result<i64, PapertradeError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COALESCE(SUM(shares), 0) FROM transactions
             WHERE user_id = ?1 AND symbol = ?2",
            params![user_id, symbol],
            |row| row.get(0),
        )
        .map_err(query_err)
    }

    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, PapertradeError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, MAX(company), SUM(shares) AS net
                 FROM transactions
                 WHERE user_id = ?1
                 GROUP BY symbol
                 HAVING net > 0
                 ORDER BY symbol",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(Holding {
                    symbol: row.get(0)?,
                    company: row.get(1)?,
                    shares: row.get(2)?,
                })
            })
            .map_err(query_err)?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row.map_err(query_err)?);
        }
        Ok(holdings)
    }

    fn apply_trade(
        &self,
        user_id: i64,
        tx: &NewTransaction,
        new_cash: f64,
    ) -> Result<i64, PapertradeError> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction().map_err(query_err)?;

        db_tx
            .execute(
                "INSERT INTO transactions (user_id, symbol, company, shares, price, total, executed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user_id,
                    tx.symbol,
                    tx.company,
                    tx.shares,
                    tx.price,
                    tx.total,
                    tx.executed_at.format(TIMESTAMP_FORMAT).to_string(),
                ],
            )
            .map_err(query_err)?;
        let id = db_tx.last_insert_rowid();

        let updated = db_tx
            .execute(
                "UPDATE users SET cash = ?1 WHERE id = ?2",
                params![new_cash, user_id],
            )
            .map_err(query_err)?;
        if updated == 0 {
            return Err(PapertradeError::DatabaseQuery {
                reason: format!("no such user: {user_id}"),
            });
        }

        db_tx.commit().map_err(query_err)?;
        Ok(id)
    }
}
