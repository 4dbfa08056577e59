//! Limit ledger
//!
//! Owns every [`CardLimit`] row, keyed by (card, operation type). Rows are
//! seeded with defaults when a card is created and changed only through the
//! explicit admin upsert; nothing here re-validates historical
//! transactions when a limit shrinks.

use crate::types::{CardId, CardLimit, LedgerError, OperationType};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::info;

/// Per-card, per-operation-type spend caps
pub struct LimitLedger {
    limits: DashMap<(CardId, OperationType), CardLimit>,
}

impl LimitLedger {
    /// Create an empty limit ledger
    pub fn new() -> Self {
        LimitLedger {
            limits: DashMap::new(),
        }
    }

    /// Seed the default row for every operation type of a new card
    pub fn seed_defaults(&self, card: CardId) {
        for operation in OperationType::ALL {
            self.limits
                .entry((card, operation))
                .or_insert_with(|| CardLimit::with_defaults(card, operation));
        }
    }

    /// Every limit row for a card
    ///
    /// # Errors
    ///
    /// Returns `CardLimitNotFound` when the card has no rows at all.
    pub fn limits_for(&self, card: CardId) -> Result<Vec<CardLimit>, LedgerError> {
        let mut rows: Vec<CardLimit> = OperationType::ALL
            .iter()
            .filter_map(|operation| {
                self.limits
                    .get(&(card, *operation))
                    .map(|entry| entry.value().clone())
            })
            .collect();
        if rows.is_empty() {
            return Err(LedgerError::CardLimitNotFound { card });
        }
        rows.sort_by_key(|row| OperationType::ALL.iter().position(|o| *o == row.operation));
        Ok(rows)
    }

    /// The limit row for one (card, operation type) pair
    ///
    /// # Errors
    ///
    /// Returns `CardLimitNotFound` if the row does not exist.
    pub fn limit_for(
        &self,
        card: CardId,
        operation: OperationType,
    ) -> Result<CardLimit, LedgerError> {
        self.limits
            .get(&(card, operation))
            .map(|entry| entry.value().clone())
            .ok_or(LedgerError::CardLimitNotFound { card })
    }

    /// Upsert the limit row for a (card, operation type) pair
    ///
    /// Updates the existing row or creates one; calling twice with the same
    /// values leaves exactly one row carrying the latest values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimit` if either value is negative. Upper bounds are
    /// a boundary concern and not checked here.
    pub fn set(
        &self,
        card: CardId,
        operation: OperationType,
        daily_limit: Decimal,
        monthly_limit: Decimal,
    ) -> Result<CardLimit, LedgerError> {
        if daily_limit < Decimal::ZERO || monthly_limit < Decimal::ZERO {
            return Err(LedgerError::InvalidLimit {
                daily: daily_limit,
                monthly: monthly_limit,
            });
        }

        let row = CardLimit {
            card,
            operation,
            daily_limit,
            monthly_limit,
        };
        self.limits.insert((card, operation), row.clone());
        info!(%card, %operation, %daily_limit, %monthly_limit, "card limit set");
        Ok(row)
    }
}

impl Default for LimitLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_creates_a_row_per_operation_type() {
        let ledger = LimitLedger::new();
        let card = CardId::new();
        ledger.seed_defaults(card);

        let rows = ledger.limits_for(card).unwrap();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.daily_limit, CardLimit::DEFAULT_CAP);
            assert_eq!(row.monthly_limit, CardLimit::DEFAULT_CAP);
        }
    }

    #[test]
    fn test_seed_does_not_overwrite_existing_rows() {
        let ledger = LimitLedger::new();
        let card = CardId::new();
        ledger
            .set(card, OperationType::Withdrawal, Decimal::new(100, 0), Decimal::new(200, 0))
            .unwrap();

        ledger.seed_defaults(card);

        let row = ledger.limit_for(card, OperationType::Withdrawal).unwrap();
        assert_eq!(row.daily_limit, Decimal::new(100, 0));
    }

    #[test]
    fn test_limits_for_unknown_card_fails() {
        let ledger = LimitLedger::new();
        let card = CardId::new();
        assert_eq!(
            ledger.limits_for(card).unwrap_err(),
            LedgerError::CardLimitNotFound { card }
        );
    }

    #[test]
    fn test_set_is_an_upsert() {
        let ledger = LimitLedger::new();
        let card = CardId::new();
        ledger.seed_defaults(card);

        ledger
            .set(card, OperationType::Deposit, Decimal::new(1000, 0), Decimal::new(2000, 0))
            .unwrap();
        ledger
            .set(card, OperationType::Deposit, Decimal::new(1000, 0), Decimal::new(2000, 0))
            .unwrap();

        // Still exactly one row per type, carrying the latest values.
        let rows = ledger.limits_for(card).unwrap();
        assert_eq!(rows.len(), 3);
        let row = ledger.limit_for(card, OperationType::Deposit).unwrap();
        assert_eq!(row.daily_limit, Decimal::new(1000, 0));
        assert_eq!(row.monthly_limit, Decimal::new(2000, 0));
    }

    #[test]
    fn test_set_rejects_negative_values() {
        let ledger = LimitLedger::new();
        let card = CardId::new();
        let result = ledger.set(
            card,
            OperationType::Withdrawal,
            Decimal::new(-1, 0),
            Decimal::ZERO,
        );
        assert!(matches!(result.unwrap_err(), LedgerError::InvalidLimit { .. }));
    }

    #[test]
    fn test_limit_for_missing_type_fails() {
        let ledger = LimitLedger::new();
        let card = CardId::new();
        ledger
            .set(card, OperationType::Deposit, Decimal::ONE, Decimal::ONE)
            .unwrap();
        assert!(ledger.limit_for(card, OperationType::Transfer).is_err());
    }
}
