//! Spend-limit types
//!
//! A [`CardLimit`] row exists per (card, operation type) pair and carries
//! the daily and monthly caps enforced by the orchestrator. Rows are seeded
//! with defaults when a card is created and changed only through the
//! explicit admin set-limit operation.

use crate::types::card::CardId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of monetary movement, and the dimension along which spend
/// limits are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    /// Debit funds from a card
    Withdrawal,
    /// Credit funds to a card
    Deposit,
    /// Move funds between two cards owned by the same user
    Transfer,
}

impl OperationType {
    /// Every operation type, in seeding order
    pub const ALL: [OperationType; 3] = [
        OperationType::Withdrawal,
        OperationType::Deposit,
        OperationType::Transfer,
    ];
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Withdrawal => write!(f, "WITHDRAWAL"),
            OperationType::Deposit => write!(f, "DEPOSIT"),
            OperationType::Transfer => write!(f, "TRANSFER"),
        }
    }
}

/// Daily and monthly caps for one (card, operation type) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLimit {
    pub card: CardId,
    pub operation: OperationType,
    /// Cap on the sum of amounts since the start of the current day
    pub daily_limit: Decimal,
    /// Cap on the sum of amounts since the start of the current month
    pub monthly_limit: Decimal,
}

impl CardLimit {
    /// The default cap applied to every operation type at card creation
    pub const DEFAULT_CAP: Decimal = Decimal::from_parts(500000, 0, 0, false, 2); // 5000.00

    /// Build the default limit row for one operation type
    pub fn with_defaults(card: CardId, operation: OperationType) -> Self {
        CardLimit {
            card,
            operation,
            daily_limit: Self::DEFAULT_CAP,
            monthly_limit: Self::DEFAULT_CAP,
        }
    }
}
