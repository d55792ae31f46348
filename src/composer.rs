//! Response Composer
//!
//! Pure rendering of ledger data into user-facing text. No I/O; identical
//! inputs always produce identical output.

use crate::error::LedgerError;
use crate::models::{
    BalanceSnapshot, CategoryBreakdown, LedgerContext, Transaction, TransactionKind,
    DEFAULT_CURRENCY,
};
use rust_decimal::Decimal;
use std::fmt::Write;

pub const VALIDATION_FAILED: &str = "⚠️ I couldn't understand the amount or type of that transaction.\n\
Please give a positive amount and say whether it was income or an expense, \
for example: \"spent 300 on groceries\".";

pub const EXTRACTION_FAILED: &str = "🤔 I couldn't extract a transaction from that message.\n\
Try something like \"spent 300 on groceries\" or \"received salary 50000\".";

pub const STORE_UNAVAILABLE: &str =
    "⏳ Your ledger is temporarily unavailable. Please try again in a moment.";

pub const BACKEND_UNAVAILABLE: &str =
    "⏳ I couldn't process that message right now. Please try again in a moment.";

pub const UNEXPECTED_FAILURE: &str =
    "❌ Something went wrong while handling your request. Please try again.";

/// Renders replies in one display currency.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    currency: String,
}

impl ResponseComposer {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    fn money(&self, amount: Decimal) -> String {
        format!("{:.2} {}", amount, self.currency)
    }

    /// Confirmation for a stored transaction, with the refreshed balance.
    pub fn transaction_recorded(&self, tx: &Transaction, balance: &BalanceSnapshot) -> String {
        let (kind_label, label_name) = match tx.kind {
            TransactionKind::Income => ("Income", "Source"),
            TransactionKind::Expense => ("Expense", "Category"),
        };

        let mut out = String::new();
        out.push_str("✅ **Transaction recorded:**\n\n");
        let _ = writeln!(out, "📊 **{}:** {:.2} {}", kind_label, tx.amount, tx.currency);
        let _ = writeln!(out, "🏷️ **{}:** {}", label_name, tx.category_or_source);
        if let Some(comment) = &tx.comment {
            let _ = writeln!(out, "💬 **Comment:** {}", comment);
        }
        let _ = writeln!(out, "📅 **Date:** {}", tx.occurred_at.format("%d.%m.%Y %H:%M"));
        let _ = write!(out, "\n💰 **Current balance:** {}", self.money(balance.balance));

        out
    }

    pub fn balance(&self, snapshot: &BalanceSnapshot) -> String {
        if snapshot.is_empty() {
            return format!(
                "💰 **Your balance:**\n\n\
                 Current balance: {}\n\
                 📝 You have no transactions yet.\n\n\
                 Start by telling me about income or expenses, \
                 for example: \"spent 300 on groceries\".",
                self.money(Decimal::ZERO)
            );
        }

        format!(
            "💰 **Your balance:**\n\n\
             **Current balance:** {}\n\n\
             💚 **Total income:** {}\n\
             ❤️ **Total expenses:** {}\n\
             📊 **Transactions:** {}",
            self.money(snapshot.balance),
            self.money(snapshot.total_income),
            self.money(snapshot.total_expense),
            snapshot.transaction_count
        )
    }

    /// Full report. `recent` is rendered in the order given.
    pub fn report(
        &self,
        snapshot: &BalanceSnapshot,
        breakdown: &CategoryBreakdown,
        recent: &[Transaction],
    ) -> String {
        if snapshot.is_empty() {
            return "📊 **Your report is empty.** Record some income or expenses first and \
                    I'll break them down for you."
                .to_string();
        }

        let mut out = String::from("📊 **FINANCIAL REPORT**\n\n");
        let _ = writeln!(out, "💰 **Balance:** {}", self.money(snapshot.balance));
        let _ = writeln!(out, "💚 **Income:** {}", self.money(snapshot.total_income));
        let _ = writeln!(out, "❤️ **Expenses:** {}", self.money(snapshot.total_expense));

        if !breakdown.is_empty() {
            out.push_str("\n💸 **EXPENSES BY CATEGORY:**\n");
            for entry in breakdown.entries() {
                let _ = writeln!(out, "   • {}: {}", entry.label, self.money(entry.total));
            }
        }

        if !recent.is_empty() {
            out.push_str("\n📝 **RECENT TRANSACTIONS:**\n");
            for tx in recent {
                let marker = match tx.kind {
                    TransactionKind::Income => "💚",
                    TransactionKind::Expense => "❤️",
                };
                let _ = writeln!(
                    out,
                    "   {} {}: {:.2} {} ({})",
                    marker,
                    tx.occurred_at.format("%d.%m"),
                    tx.amount,
                    tx.currency,
                    tx.category_or_source
                );
            }
        }

        out.trim_end().to_string()
    }

    /// Help text for messages that are not ledger operations.
    pub fn general(&self, text: &str, context: &LedgerContext) -> String {
        let mut out = format!(
            "🤖 **Message received!**\n\n\
             You wrote: _\"{}\"_\n\n\
             **What I can do:**\n\
             • \"spent 300 on groceries\" - record an expense\n\
             • \"received salary 50000\" - record income\n\
             • \"what's my balance?\" - check your balance\n\
             • \"show me a report\" - get a spending breakdown\n\n\
             **Your stats:**\n\
             💰 Balance: {}\n\
             📊 Transactions: {}",
            text.trim(),
            self.money(context.balance.balance),
            context.balance.transaction_count
        );

        if let Some(last) = context.recent.first() {
            let _ = write!(
                out,
                "\n🕒 Last: {:.2} {} ({})",
                last.amount, last.currency, last.category_or_source
            );
        }

        out
    }

    /// The single user-facing message for a failed request. Never includes
    /// internal error text.
    pub fn failure(&self, error: &LedgerError) -> String {
        match error {
            LedgerError::Validation(_) => VALIDATION_FAILED,
            LedgerError::Extraction(_) => EXTRACTION_FAILED,
            LedgerError::StoreUnavailable(_) => STORE_UNAVAILABLE,
            LedgerError::Backend(_) | LedgerError::Http(_) => BACKEND_UNAVAILABLE,
            LedgerError::Config(_) | LedgerError::Serialization(_) | LedgerError::Io(_) => {
                UNEXPECTED_FAILURE
            }
        }
        .to_string()
    }
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTransaction, OwnerId};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn stored(kind: TransactionKind, amount: Decimal, label: &str, day: u32) -> Transaction {
        let at = Utc.with_ymd_and_hms(2026, 10, day, 9, 30, 0).unwrap();
        let mut new = NewTransaction::now(kind, amount, label);
        new.occurred_at = at;
        Transaction::from_new(OwnerId(1), new, at)
    }

    #[test]
    fn test_transaction_recorded() {
        let composer = ResponseComposer::new("RUB");
        let mut tx = stored(TransactionKind::Expense, dec!(300), "Groceries", 16);
        tx.comment = Some("weekly shop".to_string());
        let balance = BalanceSnapshot::new(dec!(50000), dec!(300), 2);

        let text = composer.transaction_recorded(&tx, &balance);
        assert!(text.contains("**Expense:** 300.00 RUB"));
        assert!(text.contains("**Category:** Groceries"));
        assert!(text.contains("weekly shop"));
        assert!(text.contains("16.10.2026 09:30"));
        assert!(text.contains("**Current balance:** 49700.00 RUB"));

        let salary = stored(TransactionKind::Income, dec!(50000), "Salary", 16);
        let text = composer.transaction_recorded(&salary, &balance);
        assert!(text.contains("**Source:** Salary"));
        assert!(!text.contains("Comment"));
    }

    #[test]
    fn test_balance_variants() {
        let composer = ResponseComposer::new("RUB");

        let empty = composer.balance(&BalanceSnapshot::default());
        assert!(empty.contains("0.00 RUB"));
        assert!(empty.contains("no transactions yet"));

        let text = composer.balance(&BalanceSnapshot::new(dec!(50000), dec!(300), 2));
        assert!(text.contains("**Current balance:** 49700.00 RUB"));
        assert!(text.contains("**Total income:** 50000.00 RUB"));
        assert!(text.contains("**Total expenses:** 300.00 RUB"));
        assert!(text.contains("**Transactions:** 2"));
    }

    #[test]
    fn test_report_lists_categories_and_recent() {
        let composer = ResponseComposer::new("RUB");
        let snapshot = BalanceSnapshot::new(dec!(1000), dec!(350), 4);
        let breakdown = CategoryBreakdown::from_totals(vec![
            ("Groceries".to_string(), dec!(150)),
            ("Transport".to_string(), dec!(200)),
        ]);
        let recent = vec![
            stored(TransactionKind::Expense, dec!(200), "Transport", 15),
            stored(TransactionKind::Income, dec!(1000), "Salary", 14),
        ];

        let text = composer.report(&snapshot, &breakdown, &recent);
        let transport = text.find("• Transport: 200.00 RUB").unwrap();
        let groceries = text.find("• Groceries: 150.00 RUB").unwrap();
        assert!(transport < groceries);
        assert!(text.contains("❤️ 15.10: 200.00 RUB (Transport)"));
        assert!(text.contains("💚 14.10: 1000.00 RUB (Salary)"));
    }

    #[test]
    fn test_empty_messages_are_distinct() {
        let composer = ResponseComposer::default();
        let empty_balance = composer.balance(&BalanceSnapshot::default());
        let empty_report = composer.report(
            &BalanceSnapshot::default(),
            &CategoryBreakdown::default(),
            &[],
        );
        let extraction = composer.failure(&LedgerError::Extraction("none".into()));

        assert_ne!(empty_balance, extraction);
        assert_ne!(empty_report, extraction);
        assert_ne!(empty_balance, empty_report);
    }

    #[test]
    fn test_failures_hide_internal_details() {
        let composer = ResponseComposer::default();
        let errors = vec![
            LedgerError::Validation("amount must be positive, got -5".into()),
            LedgerError::Extraction("no transaction found".into()),
            LedgerError::StoreUnavailable("connection refused on 10.0.0.3".into()),
            LedgerError::Backend("Gemini API returned 503".into()),
            LedgerError::Config("GEMINI_API_KEY not configured".into()),
        ];

        let messages: Vec<String> = errors.iter().map(|e| composer.failure(e)).collect();
        for (error, message) in errors.iter().zip(&messages) {
            let detail = match error {
                LedgerError::Validation(d)
                | LedgerError::Extraction(d)
                | LedgerError::StoreUnavailable(d)
                | LedgerError::Backend(d)
                | LedgerError::Config(d) => d,
                _ => unreachable!(),
            };
            assert!(!message.contains(detail.as_str()));
        }

        // every category gets its own wording
        for i in 0..messages.len() {
            for j in (i + 1)..messages.len() {
                assert_ne!(messages[i], messages[j]);
            }
        }
    }

    #[test]
    fn test_general_uses_context() {
        let composer = ResponseComposer::new("RUB");
        let context = LedgerContext {
            balance: BalanceSnapshot::new(dec!(500), dec!(0), 1),
            recent: vec![stored(TransactionKind::Income, dec!(500), "Gift", 10)],
        };

        let text = composer.general("hello there", &context);
        assert!(text.contains("You wrote: _\"hello there\"_"));
        assert!(text.contains("Balance: 500.00 RUB"));
        assert!(text.contains("Transactions: 1"));
        assert!(text.contains("Last: 500.00 RUB (Gift)"));

        let fresh = composer.general("hi", &LedgerContext::default());
        assert!(fresh.contains("Balance: 0.00 RUB"));
        assert!(!fresh.contains("Last:"));
    }
}
