//! Core domain types and logic.

pub mod error;
pub mod money;
pub mod quote;
pub mod transaction;
pub mod ledger;
pub mod settlement;
pub mod projection;

#[cfg(test)]
pub(crate) mod test_support;
