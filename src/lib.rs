//! Card Ledger Library
//! # Overview
//!
//! This library manages monetary balances held on bank cards and enforces
//! spend controls on withdrawals, deposits, and transfers. Balance changes
//! are atomic per card, concurrent operations on the same card serialize,
//! and every movement is checked against rolling daily and monthly caps
//! computed from transaction history.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Card, CardLimit, Transaction, errors)
//! - [`core`] - Business logic components:
//!   - [`core::card_registry`] - Card state and the status state machine
//!   - [`core::limit_ledger`] - Per-card, per-operation spend caps
//!   - [`core::transaction_ledger`] - Append-only movement log
//!   - [`core::spend_aggregator`] - Rolling spend sums over the log
//!   - [`core::card_service`] - Admin/user card surface
//!   - [`core::orchestrator`] - Withdraw/deposit/transfer pipeline
//!   - [`core::sweeper`] - Scheduled Active → Expired transition
//! - [`engine`] - Explicit composition root
//! - [`crypto`] - Card-number crypto collaborator interface
//! - [`time`] - Clock abstraction and spend-window boundaries
//! - [`scheduler`] - Plain periodic trigger for the sweeper
//! - [`io`] / [`replay`] / [`cli`] - CSV scenario replay binary
//!
//! # Card Lifecycle
//!
//! A card is created Active with default limits for every operation type.
//! Admins may block or (re)activate any card; owners may request a block;
//! soft deletion forces a card Blocked and flags it deleted, cascading
//! owner-wide when the owner is deleted. The sweeper expires Active cards
//! whose expiration date has passed. Operations are accepted only while a
//! card is Active and not deleted, checked at the instant of mutation
//! under the card's lock.

// Module declarations
pub mod cli;
pub mod core;
pub mod crypto;
pub mod engine;
pub mod io;
pub mod replay;
pub mod scheduler;
pub mod time;
pub mod types;

pub use crate::core::{
    CardRegistry, CardService, ExpirationSweeper, LimitLedger, SpendAggregator,
    TransactionLedger, TransactionOrchestrator,
};
pub use crate::crypto::{mask_card_number, CardCrypto, PassthroughCrypto};
pub use crate::engine::Engine;
pub use crate::time::{Clock, SteppingClock, SystemClock};
pub use crate::types::{
    Card, CardCreateRequest, CardFilter, CardId, CardLimit, CardStatus, CardView, ErrorKind,
    LedgerError, Operator, OperationType, Page, PageRequest, Role, Transaction,
    TransactionFilter, TransactionId, TransactionRequest, UserId,
};
