//! Core business logic
//!
//! The components here form the transaction orchestration engine:
//!
//! - [`card_registry`] - Card ownership, status state machine, per-card locks
//! - [`limit_ledger`] - Per-card, per-operation daily/monthly caps
//! - [`transaction_ledger`] - Append-only log of completed movements
//! - [`spend_aggregator`] - Rolling daily/monthly spend sums over the log
//! - [`card_service`] - Admin/user card surface (create, block, delete, limits)
//! - [`orchestrator`] - The validate-then-mutate pipeline for withdraw/deposit/transfer
//! - [`sweeper`] - Scheduled Active → Expired transition

pub mod card_registry;
pub mod card_service;
pub mod limit_ledger;
pub mod orchestrator;
pub mod spend_aggregator;
pub mod sweeper;
pub mod transaction_ledger;

pub use card_registry::CardRegistry;
pub use card_service::CardService;
pub use limit_ledger::LimitLedger;
pub use orchestrator::TransactionOrchestrator;
pub use spend_aggregator::SpendAggregator;
pub use sweeper::ExpirationSweeper;
pub use transaction_ledger::TransactionLedger;
