//! In-memory ledger for development and tests

use super::LedgerStore;
use crate::models::{
    BalanceSnapshot, CategoryBreakdown, NewTransaction, OwnerId, Transaction, TransactionKind,
    UserProfile,
};
use crate::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    users: HashMap<OwnerId, UserProfile>,
    transactions: HashMap<OwnerId, Vec<Transaction>>,
}

/// In-memory ledger store; one write lock per mutation keeps appends atomic.
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {

    async fn upsert_user(&self, owner: OwnerId, profile: &UserProfile) -> Result<()> {
        let mut state = self.state.write().await;
        state.users.insert(owner, profile.clone());
        Ok(())
    }

    async fn user(&self, owner: OwnerId) -> Result<Option<UserProfile>> {
        let state = self.state.read().await;
        Ok(state.users.get(&owner).cloned())
    }

    async fn append(&self, owner: OwnerId, transaction: NewTransaction) -> Result<Transaction> {
        transaction.validate()?;

        let stored = Transaction::from_new(owner, transaction, Utc::now());

        let mut state = self.state.write().await;
        state.users.entry(owner).or_default();
        state
            .transactions
            .entry(owner)
            .or_insert_with(Vec::new)
            .push(stored.clone());

        Ok(stored)
    }

    async fn recent(&self, owner: OwnerId, limit: usize) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;

        let mut items: Vec<Transaction> = state
            .transactions
            .get(&owner)
            .cloned()
            .unwrap_or_default();

        items.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.recorded_at.cmp(&a.recorded_at))
        });
        items.truncate(limit);

        Ok(items)
    }

    async fn balance(&self, owner: OwnerId) -> Result<BalanceSnapshot> {
        let state = self.state.read().await;
        let Some(items) = state.transactions.get(&owner) else {
            return Ok(BalanceSnapshot::default());
        };

        let (income, expense) = items.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expense), tx| match tx.kind {
                TransactionKind::Income => (income + tx.amount, expense),
                TransactionKind::Expense => (income, expense + tx.amount),
            },
        );

        Ok(BalanceSnapshot::new(income, expense, items.len() as u64))
    }

    async fn expenses_by_category(&self, owner: OwnerId) -> Result<CategoryBreakdown> {
        let state = self.state.read().await;

        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for tx in state
            .transactions
            .get(&owner)
            .into_iter()
            .flatten()
            .filter(|tx| tx.kind == TransactionKind::Expense)
        {
            *totals.entry(tx.category_or_source.clone()).or_insert(Decimal::ZERO) += tx.amount;
        }

        Ok(CategoryBreakdown::from_totals(totals))
    }
}
