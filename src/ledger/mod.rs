//! Ledger persistence layer
//!
//! Append-only transaction log keyed by owner. Aggregates are computed on
//! every read; nothing derived is stored.

use crate::models::{
    BalanceSnapshot, CategoryBreakdown, NewTransaction, OwnerId, Transaction, UserProfile,
};
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Trait for ledger persistence
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the user or replace its display attributes. Financial history is untouched.
    async fn upsert_user(&self, owner: OwnerId, profile: &UserProfile) -> Result<()>;

    /// Display attributes of a known user.
    async fn user(&self, owner: OwnerId) -> Result<Option<UserProfile>>;

    /// Validate and persist one transaction, creating the owner if unknown.
    async fn append(&self, owner: OwnerId, transaction: NewTransaction) -> Result<Transaction>;

    /// Most recent first by `occurred_at`, then `recorded_at`; at most `limit` entries.
    async fn recent(&self, owner: OwnerId, limit: usize) -> Result<Vec<Transaction>>;

    /// Totals over all of the owner's transactions; zero snapshot when there are none.
    async fn balance(&self, owner: OwnerId) -> Result<BalanceSnapshot>;

    /// Expense totals per category, largest first.
    async fn expenses_by_category(&self, owner: OwnerId) -> Result<CategoryBreakdown>;
}
