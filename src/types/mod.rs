//! Core data types for the card ledger
//!
//! This module contains the domain types shared by every component:
//!
//! - [`card`] - Card entity, status state machine, filters
//! - [`limit`] - Per-card, per-operation spend limits
//! - [`transaction`] - Immutable ledger records, filters, pagination
//! - [`operator`] - Caller identity and roles
//! - [`error`] - The crate-wide error type and taxonomy

pub mod card;
pub mod error;
pub mod limit;
pub mod operator;
pub mod transaction;

pub use card::{Card, CardCreateRequest, CardFilter, CardId, CardStatus, CardView, UserId};
pub use error::{ErrorKind, LedgerError};
pub use limit::{CardLimit, OperationType};
pub use operator::{Operator, Role};
pub use transaction::{
    Page, PageRequest, Transaction, TransactionFilter, TransactionId, TransactionRequest,
};
