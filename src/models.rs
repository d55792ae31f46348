//! Core data models for the ledger

use crate::error::LedgerError;
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Longest category/source label the store accepts.
pub const MAX_LABEL_CHARS: usize = 100;

/// Amounts are stored as NUMERIC(12,2).
pub const MAX_AMOUNT_SCALE: u32 = 2;

pub const DEFAULT_CURRENCY: &str = "RUB";

//
// ================= Identity =================
//

/// Stable external identity of a user (chat or account id).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display attributes of a user. Never carries financial data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub username: Option<String>,
}

impl UserProfile {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.username.is_none()
    }
}

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(LedgerError::Validation(format!(
                "unknown transaction kind '{}'",
                other
            ))),
        }
    }
}

/// Classified purpose of an utterance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Transaction,
    BalanceCheck,
    ReportRequest,
    General,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::Transaction => "transaction",
            Intent::BalanceCheck => "balance_check",
            Intent::ReportRequest => "report_request",
            Intent::General => "general",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl FromStr for Locale {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            other => Err(LedgerError::Config(format!("unsupported locale '{}'", other))),
        }
    }
}

//
// ================= Transactions =================
//

/// A validated transaction that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub category_or_source: String,
    pub comment: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NewTransaction {
    /// Transaction happening now in the default currency.
    pub fn now(kind: TransactionKind, amount: Decimal, category_or_source: &str) -> Self {
        Self {
            kind,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            category_or_source: category_or_source.to_string(),
            comment: None,
            occurred_at: Utc::now(),
        }
    }

    /// Check the invariants every persisted transaction must hold.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }

        if self.amount.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(LedgerError::Validation(format!(
                "amount {} has more than {} decimal places",
                self.amount, MAX_AMOUNT_SCALE
            )));
        }

        if self.amount >= Decimal::from(10_000_000_000i64) {
            return Err(LedgerError::Validation(format!(
                "amount {} is out of range",
                self.amount
            )));
        }

        let label = self.category_or_source.trim();
        if label.is_empty() {
            return Err(LedgerError::Validation(
                "category or source is required".to_string(),
            ));
        }
        if label.chars().count() > MAX_LABEL_CHARS {
            return Err(LedgerError::Validation(format!(
                "category or source exceeds {} characters",
                MAX_LABEL_CHARS
            )));
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(LedgerError::Validation(format!(
                "invalid currency code '{}'",
                self.currency
            )));
        }

        Ok(())
    }
}

/// Immutable ledger fact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: OwnerId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub category_or_source: String,
    pub comment: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_new(owner: OwnerId, new: NewTransaction, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind: new.kind,
            amount: new.amount,
            currency: new.currency,
            category_or_source: new.category_or_source,
            comment: new.comment,
            occurred_at: new.occurred_at,
            recorded_at,
        }
    }
}

//
// ================= Aggregates =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: u64,
}

impl BalanceSnapshot {
    pub fn new(total_income: Decimal, total_expense: Decimal, transaction_count: u64) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            transaction_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryTotal {
    pub label: String,
    pub total: Decimal,
}

/// Expense totals per label, largest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryBreakdown(Vec<CategoryTotal>);

impl CategoryBreakdown {
    /// Build from unordered totals; sorts by total descending, then label.
    pub fn from_totals(totals: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        let mut entries: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(label, total)| CategoryTotal { label, total })
            .collect();
        entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
        Self(entries)
    }

    pub fn entries(&self) -> &[CategoryTotal] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Lightweight per-user context used to enrich general replies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerContext {
    pub balance: BalanceSnapshot,
    pub recent: Vec<Transaction>,
}

//
// ================= Vocabulary =================
//

const EXPENSE_CATEGORIES_EN: &[&str] = &[
    "Groceries", "Transport", "Housing", "Entertainment", "Health",
    "Education", "Clothing", "Communication", "Beauty", "Travel",
    "Gifts", "Cafes & Restaurants", "Sports", "Car",
    "Pets", "Children", "Other",
];

const INCOME_SOURCES_EN: &[&str] = &[
    "Salary", "Freelance", "Side Job", "Investments",
    "Dividends", "Sale", "Debt Repayment", "Gift", "Other",
];

const EXPENSE_CATEGORIES_RU: &[&str] = &[
    "Продукты", "Транспорт", "Жилье", "Развлечения", "Здоровье",
    "Образование", "Одежда", "Связь", "Красота", "Путешествия",
    "Подарки", "Кафе/Рестораны", "Спорт", "Автомобиль",
    "Домашние животные", "Дети", "Другое",
];

const INCOME_SOURCES_RU: &[&str] = &[
    "Зарплата", "Фриланс", "Подработка", "Инвестиции",
    "Дивиденды", "Продажа", "Возврат долга", "Подарок", "Другое",
];

/// Closed list of preferred labels, passed to the extraction backend as a hint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vocabulary {
    pub expense_categories: Vec<String>,
    pub income_sources: Vec<String>,
}

impl Vocabulary {
    pub fn for_locale(locale: Locale) -> Self {
        let (expenses, incomes) = match locale {
            Locale::En => (EXPENSE_CATEGORIES_EN, INCOME_SOURCES_EN),
            Locale::Ru => (EXPENSE_CATEGORIES_RU, INCOME_SOURCES_RU),
        };
        Self {
            expense_categories: expenses.iter().map(|s| s.to_string()).collect(),
            income_sources: incomes.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn labels_for(&self, kind: TransactionKind) -> &[String] {
        match kind {
            TransactionKind::Income => &self.income_sources,
            TransactionKind::Expense => &self.expense_categories,
        }
    }

    /// Canonical spelling of `label` if it names a vocabulary entry, ignoring case.
    pub fn canonical(&self, kind: TransactionKind, label: &str) -> Option<&str> {
        let wanted = label.trim().to_lowercase();
        self.labels_for(kind)
            .iter()
            .find(|entry| entry.to_lowercase() == wanted)
            .map(|s| s.as_str())
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::for_locale(Locale::default())
    }
}

//
// ================= Inbound =================
//

/// One user utterance as handed over by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub owner: OwnerId,
    pub text: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl InboundMessage {
    pub fn new(owner: OwnerId, text: impl Into<String>) -> Self {
        Self {
            owner,
            text: text.into(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }
}
