//! Transaction ledger
//!
//! The append-only log of completed monetary movements. Records are never
//! updated or deleted; the only write is an append, so readers need no
//! conflict resolution, just a consistent view while summing.
//!
//! The orchestrator appends while holding the affected card lock(s), which
//! is what makes a limit check and the write it guards one atomic unit.
//! Lock order is always card lock(s) first, then the log; no path takes
//! them the other way around.

use crate::types::{
    CardId, LedgerError, OperationType, Page, PageRequest, Transaction, TransactionFilter,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Append-only store of transaction records
pub struct TransactionLedger {
    log: RwLock<Vec<Transaction>>,
}

impl TransactionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        TransactionLedger {
            log: RwLock::new(Vec::new()),
        }
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the amount is not strictly positive; a
    /// non-positive amount can never enter the log.
    pub fn append(&self, tx: Transaction) -> Result<(), LedgerError> {
        self.append_all(vec![tx])
    }

    /// Append several records in one critical section
    ///
    /// The transfer path uses this so its debit and credit records become
    /// visible together; no reader can observe one without the other.
    pub fn append_all(&self, txs: Vec<Transaction>) -> Result<(), LedgerError> {
        for tx in &txs {
            if tx.amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount { amount: tx.amount });
            }
        }
        self.log.write().extend(txs);
        Ok(())
    }

    /// Exact sum of amounts for a (card, type) pair since a moment in time
    ///
    /// Returns zero when nothing matches. Sums never round; this is the
    /// aggregation limit checks are computed from, not a cached counter.
    pub fn sum_since(
        &self,
        card: CardId,
        operation: OperationType,
        since: chrono::NaiveDateTime,
    ) -> Decimal {
        self.log
            .read()
            .iter()
            .filter(|tx| tx.card == card && tx.kind == operation && tx.timestamp >= since)
            .map(|tx| tx.amount)
            .sum()
    }

    /// Filtered, paged query over the log
    ///
    /// `owner_cards`, when present, restricts results to that set of card
    /// ids (the resolved form of an owner filter). Results are ordered by
    /// timestamp, newest first.
    pub fn find(
        &self,
        filter: &TransactionFilter,
        owner_cards: Option<&HashSet<CardId>>,
        page: PageRequest,
    ) -> Page<Transaction> {
        let mut matched: Vec<Transaction> = self
            .log
            .read()
            .iter()
            .filter(|tx| filter.matches(tx))
            .filter(|tx| owner_cards.is_none_or(|cards| cards.contains(&tx.card)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Page::from_slice(matched, page)
    }

    /// Number of records in the log
    pub fn len(&self) -> usize {
        self.log.read().len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.log.read().is_empty()
    }
}

impl Default for TransactionLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionId;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn tx(card: CardId, kind: OperationType, cents: i64, at: NaiveDateTime) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            card,
            kind,
            amount: Decimal::new(cents, 2),
            description: String::new(),
            timestamp: at,
        }
    }

    #[test]
    fn test_append_and_len() {
        let ledger = TransactionLedger::new();
        let card = CardId::new();
        ledger
            .append(tx(card, OperationType::Deposit, 1000, ts(1, 9)))
            .unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.is_empty());
    }

    #[test]
    fn test_append_rejects_non_positive_amounts() {
        let ledger = TransactionLedger::new();
        let card = CardId::new();
        let mut zero = tx(card, OperationType::Deposit, 0, ts(1, 9));
        zero.amount = Decimal::ZERO;
        assert!(matches!(
            ledger.append(zero).unwrap_err(),
            LedgerError::InvalidAmount { .. }
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_append_all_is_all_or_nothing() {
        let ledger = TransactionLedger::new();
        let card = CardId::new();
        let good = tx(card, OperationType::Transfer, 1000, ts(1, 9));
        let mut bad = tx(card, OperationType::Deposit, 0, ts(1, 9));
        bad.amount = Decimal::new(-500, 2);

        assert!(ledger.append_all(vec![good, bad]).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_sum_since_filters_card_type_and_time() {
        let ledger = TransactionLedger::new();
        let card = CardId::new();
        let other = CardId::new();

        ledger.append(tx(card, OperationType::Withdrawal, 6000, ts(15, 9))).unwrap();
        ledger.append(tx(card, OperationType::Withdrawal, 2500, ts(15, 14))).unwrap();
        // Different type, different card, and before the window:
        ledger.append(tx(card, OperationType::Deposit, 9999, ts(15, 10))).unwrap();
        ledger.append(tx(other, OperationType::Withdrawal, 1111, ts(15, 10))).unwrap();
        ledger.append(tx(card, OperationType::Withdrawal, 4000, ts(14, 23))).unwrap();

        let spent = ledger.sum_since(card, OperationType::Withdrawal, ts(15, 0));
        assert_eq!(spent, Decimal::new(8500, 2)); // 60.00 + 25.00
    }

    #[test]
    fn test_sum_since_is_zero_when_nothing_matches() {
        let ledger = TransactionLedger::new();
        assert_eq!(
            ledger.sum_since(CardId::new(), OperationType::Transfer, ts(1, 0)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_sum_preserves_exact_decimals() {
        let ledger = TransactionLedger::new();
        let card = CardId::new();
        ledger.append(tx(card, OperationType::Deposit, 1, ts(1, 9))).unwrap(); // 0.01
        ledger.append(tx(card, OperationType::Deposit, 2, ts(1, 10))).unwrap(); // 0.02
        assert_eq!(
            ledger.sum_since(card, OperationType::Deposit, ts(1, 0)),
            Decimal::new(3, 2)
        );
    }

    #[test]
    fn test_find_orders_newest_first_and_pages() {
        let ledger = TransactionLedger::new();
        let card = CardId::new();
        for day in 1..=5 {
            ledger
                .append(tx(card, OperationType::Deposit, 1000, ts(day, 9)))
                .unwrap();
        }

        let page = ledger.find(
            &TransactionFilter::default(),
            None,
            PageRequest::new(0, 2),
        );
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].timestamp, ts(5, 9));
        assert_eq!(page.items[1].timestamp, ts(4, 9));
    }

    #[test]
    fn test_find_restricts_to_owner_cards() {
        let ledger = TransactionLedger::new();
        let mine = CardId::new();
        let theirs = CardId::new();
        ledger.append(tx(mine, OperationType::Deposit, 1000, ts(1, 9))).unwrap();
        ledger.append(tx(theirs, OperationType::Deposit, 2000, ts(1, 10))).unwrap();

        let owned: HashSet<CardId> = [mine].into_iter().collect();
        let page = ledger.find(
            &TransactionFilter::default(),
            Some(&owned),
            PageRequest::default(),
        );
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].card, mine);
    }

    #[test]
    fn test_find_with_kind_and_amount_filters() {
        let ledger = TransactionLedger::new();
        let card = CardId::new();
        ledger.append(tx(card, OperationType::Deposit, 1000, ts(1, 9))).unwrap();
        ledger.append(tx(card, OperationType::Withdrawal, 5000, ts(1, 10))).unwrap();
        ledger.append(tx(card, OperationType::Withdrawal, 9000, ts(1, 11))).unwrap();

        let filter = TransactionFilter {
            kind: Some(OperationType::Withdrawal),
            max_amount: Some(Decimal::new(6000, 2)),
            ..Default::default()
        };
        let page = ledger.find(&filter, None, PageRequest::default());
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].amount, Decimal::new(5000, 2));
    }
}
