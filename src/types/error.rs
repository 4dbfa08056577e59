//! Error types for the card ledger
//!
//! This module defines every error the core can surface. Errors are
//! designed to carry enough context to diagnose the failure while mapping
//! onto a small, stable taxonomy ([`ErrorKind`]) that callers can switch on
//! without parsing messages.
//!
//! # Propagation
//!
//! Validation and business-rule failures abort the whole operation before
//! any write happens; there is never a partially-applied mutation to roll
//! back. Infrastructure failures (crypto, I/O) are reported generically
//! without leaking internals.

use crate::types::card::{CardId, CardStatus, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Stable, machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced card or limit row does not exist
    NotFound,
    /// The operator may not act on the referenced resource
    Forbidden,
    /// The operation conflicts with current state (duplicate, already done)
    Conflict,
    /// The input itself is malformed (non-positive amount, same-card transfer)
    Validation,
    /// A business rule rejected an otherwise well-formed operation
    BusinessRule,
    /// A collaborator failed (crypto, file I/O, parsing)
    Infrastructure,
}

/// Main error type for the card ledger
///
/// Each variant carries the identifiers and amounts relevant to the
/// failure. Helper constructors exist for the variants built in more than
/// one place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// No card exists with the given id
    #[error("Card {card} not found")]
    CardNotFound { card: CardId },

    /// No limit rows exist for the card (or none for the requested type)
    #[error("Card limit not found for card {card}")]
    CardLimitNotFound { card: CardId },

    /// No owner record exists with the given id
    #[error("Owner {owner} not found")]
    OwnerNotFound { owner: UserId },

    /// A card with the same encrypted number handle already exists
    #[error("Card already exists")]
    DuplicateCard,

    /// The card is not in a state that accepts operations
    #[error("Card {card} is not active (status {status})")]
    CardNotActive { card: CardId, status: CardStatus },

    /// The operator does not own the card
    #[error("User {user} has no access to card {card}")]
    CardOwnership { card: CardId, user: UserId },

    /// A block request is already pending for the card
    #[error("Blocking already requested for card {card}")]
    BlockAlreadyRequested { card: CardId },

    /// No block request is pending for the card
    #[error("Card {card} has no pending block request")]
    NoPendingBlockRequest { card: CardId },

    /// Restoring an owner who is not soft-deleted
    #[error("Owner {owner} is already active")]
    OwnerAlreadyActive { owner: UserId },

    /// Amount must be strictly positive
    #[error("Invalid amount {amount}: must be positive")]
    InvalidAmount { amount: Decimal },

    /// Source and destination of a transfer are the same card
    #[error("Cannot transfer card {card} to itself")]
    SameCardTransfer { card: CardId },

    /// A limit value is negative
    #[error("Invalid limit values: daily {daily}, monthly {monthly}")]
    InvalidLimit { daily: Decimal, monthly: Decimal },

    /// The card balance does not cover the requested amount
    #[error("Insufficient funds on card {card}: available {available}, requested {requested}")]
    InsufficientFunds {
        card: CardId,
        available: Decimal,
        requested: Decimal,
    },

    /// The daily spend cap would be exceeded
    #[error("Daily limit exceeded for card {card}: spent {spent}, requested {requested}, limit {limit}")]
    DailyLimitExceeded {
        card: CardId,
        spent: Decimal,
        requested: Decimal,
        limit: Decimal,
    },

    /// The monthly spend cap would be exceeded
    #[error("Monthly limit exceeded for card {card}: spent {spent}, requested {requested}, limit {limit}")]
    MonthlyLimitExceeded {
        card: CardId,
        spent: Decimal,
        requested: Decimal,
        limit: Decimal,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} on card {card}")]
    ArithmeticOverflow { operation: String, card: CardId },

    /// The crypto collaborator failed; details stay out of the message
    #[error("Card number crypto failure: {message}")]
    Crypto { message: String },

    /// File I/O failed while replaying a scenario
    #[error("I/O error: {message}")]
    Io { message: String },

    /// A scenario record could not be parsed
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse { line: Option<u64>, message: String },
}

impl LedgerError {
    /// The stable taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::CardNotFound { .. }
            | LedgerError::CardLimitNotFound { .. }
            | LedgerError::OwnerNotFound { .. } => ErrorKind::NotFound,
            LedgerError::CardOwnership { .. } => ErrorKind::Forbidden,
            LedgerError::DuplicateCard
            | LedgerError::BlockAlreadyRequested { .. }
            | LedgerError::NoPendingBlockRequest { .. }
            | LedgerError::OwnerAlreadyActive { .. } => ErrorKind::Conflict,
            LedgerError::InvalidAmount { .. }
            | LedgerError::SameCardTransfer { .. }
            | LedgerError::InvalidLimit { .. } => ErrorKind::Validation,
            LedgerError::CardNotActive { .. }
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::DailyLimitExceeded { .. }
            | LedgerError::MonthlyLimitExceeded { .. }
            | LedgerError::ArithmeticOverflow { .. } => ErrorKind::BusinessRule,
            LedgerError::Crypto { .. } | LedgerError::Io { .. } | LedgerError::Parse { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Create a CardNotFound error
    pub fn card_not_found(card: CardId) -> Self {
        LedgerError::CardNotFound { card }
    }

    /// Create a CardNotActive error
    pub fn card_not_active(card: CardId, status: CardStatus) -> Self {
        LedgerError::CardNotActive { card, status }
    }

    /// Create a CardOwnership error
    pub fn card_ownership(card: CardId, user: UserId) -> Self {
        LedgerError::CardOwnership { card, user }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(card: CardId, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            card,
            available,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, card: CardId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            card,
        }
    }

    /// Create a Crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        LedgerError::Crypto {
            message: message.into(),
        }
    }
}

// Conversion from io::Error for the replay path
impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error for the replay path
impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());
        LedgerError::Parse {
            line,
            message: error.to_string(),
        }
    }
}
