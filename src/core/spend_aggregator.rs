//! Spend aggregator
//!
//! Computes how much a card has already moved for a given operation type
//! inside the rolling limit windows. Sums come straight from the
//! transaction ledger every time; there are no cached counters to drift.

use crate::core::transaction_ledger::TransactionLedger;
use crate::time::{start_of_day, start_of_month};
use crate::types::{CardId, OperationType};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Rolling spend sums over the transaction ledger
pub struct SpendAggregator {
    ledger: Arc<TransactionLedger>,
}

impl SpendAggregator {
    /// An aggregator reading from the given ledger
    pub fn new(ledger: Arc<TransactionLedger>) -> Self {
        SpendAggregator { ledger }
    }

    /// Sum of matching amounts with `timestamp >= since`; zero if none
    pub fn spent_since(
        &self,
        card: CardId,
        operation: OperationType,
        since: NaiveDateTime,
    ) -> Decimal {
        self.ledger.sum_since(card, operation, since)
    }

    /// Spend inside the current calendar day
    pub fn spent_today(&self, card: CardId, operation: OperationType, now: NaiveDateTime) -> Decimal {
        self.spent_since(card, operation, start_of_day(now))
    }

    /// Spend inside the current calendar month
    pub fn spent_this_month(
        &self,
        card: CardId,
        operation: OperationType,
        now: NaiveDateTime,
    ) -> Decimal {
        self.spent_since(card, operation, start_of_month(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Transaction, TransactionId};
    use chrono::NaiveDate;

    fn at(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn record(ledger: &TransactionLedger, card: CardId, cents: i64, when: NaiveDateTime) {
        ledger
            .append(Transaction {
                id: TransactionId::new(),
                card,
                kind: OperationType::Withdrawal,
                amount: Decimal::new(cents, 2),
                description: String::new(),
                timestamp: when,
            })
            .unwrap();
    }

    #[test]
    fn test_daily_window_excludes_yesterday() {
        let ledger = Arc::new(TransactionLedger::new());
        let aggregator = SpendAggregator::new(Arc::clone(&ledger));
        let card = CardId::new();

        record(&ledger, card, 4000, at(6, 14, 23)); // yesterday
        record(&ledger, card, 2500, at(6, 15, 9));
        record(&ledger, card, 1500, at(6, 15, 18));

        let spent = aggregator.spent_today(card, OperationType::Withdrawal, at(6, 15, 20));
        assert_eq!(spent, Decimal::new(4000, 2)); // 25.00 + 15.00
    }

    #[test]
    fn test_monthly_window_includes_whole_month() {
        let ledger = Arc::new(TransactionLedger::new());
        let aggregator = SpendAggregator::new(Arc::clone(&ledger));
        let card = CardId::new();

        record(&ledger, card, 4000, at(5, 31, 23)); // last month
        record(&ledger, card, 2500, at(6, 1, 0));
        record(&ledger, card, 1500, at(6, 15, 18));

        let spent = aggregator.spent_this_month(card, OperationType::Withdrawal, at(6, 15, 20));
        assert_eq!(spent, Decimal::new(4000, 2));
    }

    #[test]
    fn test_empty_ledger_spends_zero() {
        let aggregator = SpendAggregator::new(Arc::new(TransactionLedger::new()));
        let spent = aggregator.spent_today(CardId::new(), OperationType::Deposit, at(6, 15, 12));
        assert_eq!(spent, Decimal::ZERO);
    }

    #[test]
    fn test_midnight_transaction_counts_for_the_day() {
        let ledger = Arc::new(TransactionLedger::new());
        let aggregator = SpendAggregator::new(Arc::clone(&ledger));
        let card = CardId::new();

        record(&ledger, card, 100, at(6, 15, 0));
        let spent = aggregator.spent_today(card, OperationType::Withdrawal, at(6, 15, 1));
        assert_eq!(spent, Decimal::new(100, 2));
    }
}
