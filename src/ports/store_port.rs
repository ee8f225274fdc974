//! Persistent store port trait.

use crate::domain::error::PapertradeError;
use crate::domain::transaction::{Holding, NewTransaction, Transaction};

/// A user row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub cash: f64,
}

/// Access to the users and transactions tables. Implementations must make
/// `apply_trade` atomic: the inserted transaction and the cash update become
/// visible together or not at all.
pub trait StorePort {
    /// Insert a new user. Fails with `DuplicateUsername` if the name is taken.
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        starting_cash: f64,
    ) -> Result<i64, PapertradeError>;

    fn find_user(&self, user_id: i64) -> Result<Option<UserRecord>, PapertradeError>;

    fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, PapertradeError>;

    fn cash(&self, user_id: i64) -> Result<f64, PapertradeError>;

    fn set_cash(&self, user_id: i64, amount: f64) -> Result<(), PapertradeError>;

    /// Append a transaction row. No validation; that is the settlement
    /// engine's job.
    fn record_transaction(
        &self,
        user_id: i64,
        tx: &NewTransaction,
    ) -> Result<i64, PapertradeError>;

    /// All transactions for a user in insertion order.
    fn transactions(&self, user_id: i64) -> Result<Vec<Transaction>, PapertradeError>;

    /// Sum of signed shares for one symbol.
    fn net_shares(&self, user_id: i64, symbol: &str) -> Result<i64, PapertradeError>;

    /// Per-symbol net positions with net shares > 0.
    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, PapertradeError>;

    /// Record a transaction and overwrite the cash balance in one store
    /// transaction.
    fn apply_trade(
        &self,
        user_id: i64,
        tx: &NewTransaction,
        new_cash: f64,
    ) -> Result<i64, PapertradeError>;
}
