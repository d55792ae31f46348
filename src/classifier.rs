//! Intent Classifier
//!
//! Routes an utterance to one of four intents by keyword lookup:
//! - BalanceCheck: "what's my balance", "how much money is left"
//! - ReportRequest: "show me a report", "spending breakdown"
//! - Transaction: "spent 300 on groceries", "got my salary 50000"
//! - General: everything else
//!
//! Sets are checked in that order, so an utterance matching several wins by priority.

use crate::models::{Intent, Locale};

/// Static keyword lists — zero allocation
struct KeywordSets {
    balance: &'static [&'static str],
    report: &'static [&'static str],
    transaction: &'static [&'static str],
}

static ENGLISH: KeywordSets = KeywordSets {
    balance: &["balance", "how much", "money left", "remaining", "left over"],
    report: &["report", "statistics", "stats", "analytics", "breakdown", "spending"],
    transaction: &[
        // Expenses
        "spent", "paid", "bought", "purchased",
        // Income
        "received", "earned", "got paid", "salary", "income",
    ],
};

static RUSSIAN: KeywordSets = KeywordSets {
    balance: &["баланс", "сколько", "денег", "остаток"],
    report: &["отчет", "отчёт", "статистика", "аналитика", "траты"],
    transaction: &["потратил", "заплатил", "купил", "получил", "зарплата", "доход"],
};

/// Intent classifier for one locale
#[derive(Clone, Copy)]
pub struct IntentClassifier {
    keywords: &'static KeywordSets,
}

impl IntentClassifier {
    pub fn new(locale: Locale) -> Self {
        let keywords = match locale {
            Locale::En => &ENGLISH,
            Locale::Ru => &RUSSIAN,
        };
        Self { keywords }
    }

    /// Classify an utterance. Never fails; unmatched text is `General`.
    pub fn classify(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|kw| lowered.contains(kw));

        if has_any(self.keywords.balance) {
            Intent::BalanceCheck
        } else if has_any(self.keywords.report) {
            Intent::ReportRequest
        } else if has_any(self.keywords.transaction) {
            Intent::Transaction
        } else {
            Intent::General
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_statements() {
        let classifier = IntentClassifier::new(Locale::En);
        let cases = vec![
            "spent 300 on groceries",
            "Paid 2000 for internet",
            "bought coffee for 150",
            "got my SALARY 50000",
        ];

        for c in cases {
            assert_eq!(classifier.classify(c), Intent::Transaction, "{}", c);
        }
    }

    #[test]
    fn test_balance_and_report_queries() {
        let classifier = IntentClassifier::new(Locale::En);
        assert_eq!(classifier.classify("What's my balance?"), Intent::BalanceCheck);
        assert_eq!(classifier.classify("show me a report"), Intent::ReportRequest);
        assert_eq!(classifier.classify("category breakdown please"), Intent::ReportRequest);
    }

    #[test]
    fn test_priority_order() {
        let classifier = IntentClassifier::new(Locale::En);

        // balance + transaction cues
        assert_eq!(
            classifier.classify("how much did I spend, what's my balance"),
            Intent::BalanceCheck
        );
        assert_eq!(
            classifier.classify("how much did I spend on groceries"),
            Intent::BalanceCheck
        );
        // report + transaction cues
        assert_eq!(
            classifier.classify("report on what I paid this week"),
            Intent::ReportRequest
        );
    }

    #[test]
    fn test_fallthrough_to_general() {
        let classifier = IntentClassifier::new(Locale::En);
        assert_eq!(classifier.classify("hello there"), Intent::General);
        assert_eq!(classifier.classify(""), Intent::General);
    }

    #[test]
    fn test_russian_keywords() {
        let classifier = IntentClassifier::new(Locale::Ru);
        assert_eq!(classifier.classify("Потратил 300 рублей на продукты"), Intent::Transaction);
        assert_eq!(classifier.classify("Какой у меня баланс?"), Intent::BalanceCheck);
        assert_eq!(classifier.classify("Покажи отчет"), Intent::ReportRequest);
        assert_eq!(classifier.classify("Сколько потратил?"), Intent::BalanceCheck);
        assert_eq!(classifier.classify("привет"), Intent::General);
    }
}
