//! Ledger records, query filters, and pagination
//!
//! A [`Transaction`] is the immutable record of one completed monetary
//! movement. Records are appended by the orchestrator and never updated or
//! deleted afterwards.

use crate::types::card::{CardId, UserId};
use crate::types::limit::OperationType;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generate a fresh random transaction id
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One completed monetary movement
///
/// Invariant: `amount` is strictly positive. A transfer produces two of
/// these - a Transfer record on the source card and a Deposit record on the
/// destination card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub card: CardId,
    pub kind: OperationType,
    pub amount: Decimal,
    pub description: String,
    pub timestamp: NaiveDateTime,
}

/// Caller-supplied parameters for a monetary operation
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    /// Amount to move; validated against balance and limits
    pub amount: Decimal,
    /// Optional free-text description
    ///
    /// When absent, blank, or the literal placeholder "transaction", the
    /// orchestrator synthesizes a description embedding the operation type
    /// and the masked card number.
    pub description: Option<String>,
}

impl TransactionRequest {
    /// A request with no caller-supplied description
    pub fn amount(amount: Decimal) -> Self {
        TransactionRequest {
            amount,
            description: None,
        }
    }
}

/// Optional predicates for ledger queries
///
/// Each set field contributes a predicate; unset fields match everything.
/// The owner predicate is resolved by the orchestrator into the owner's set
/// of card ids before it reaches the ledger.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub kind: Option<OperationType>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub owner: Option<UserId>,
    pub card: Option<CardId>,
}

impl TransactionFilter {
    /// Whether a record satisfies every set predicate except the owner,
    /// which is matched against a pre-resolved card set by the ledger
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.start_date.is_none_or(|start| tx.timestamp >= start)
            && self.end_date.is_none_or(|end| tx.timestamp <= end)
            && self.kind.is_none_or(|kind| tx.kind == kind)
            && self.min_amount.is_none_or(|min| tx.amount >= min)
            && self.max_amount.is_none_or(|max| tx.amount <= max)
            && self.card.is_none_or(|card| tx.card == card)
    }
}

/// Zero-based page request
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    /// A request for the given page of the given size; size 0 is coerced to 1
    pub fn new(page: usize, size: usize) -> Self {
        PageRequest {
            page,
            size: size.max(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest { page: 0, size: 20 }
    }
}

/// One page of query results
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
}

impl<T> Page<T> {
    /// Slice a full, already-filtered result set into one page
    pub fn from_slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_elements = all.len();
        let items = all
            .into_iter()
            .skip(request.page * request.size)
            .take(request.size)
            .collect();
        Page {
            items,
            page: request.page,
            size: request.size,
            total_elements,
        }
    }

    /// Number of pages needed for the full result set
    pub fn total_pages(&self) -> usize {
        self.total_elements.div_ceil(self.size)
    }
}
