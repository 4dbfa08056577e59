//! Composition root
//!
//! Every core component is constructed exactly once, here, and handed its
//! collaborators directly. There is no injection framework and no service
//! lookup: the [`Engine`] is the one place that knows how the pieces fit
//! together.

use crate::core::{
    CardRegistry, CardService, ExpirationSweeper, LimitLedger, TransactionLedger,
    TransactionOrchestrator,
};
use crate::crypto::CardCrypto;
use crate::scheduler::{Periodic, DAILY};
use crate::time::Clock;
use std::sync::Arc;

/// The assembled card ledger engine
///
/// Holds the admin card surface, the transaction orchestrator, and the
/// sweeper, all sharing one registry, one limit ledger, and one
/// transaction ledger.
pub struct Engine {
    pub registry: Arc<CardRegistry>,
    pub limits: Arc<LimitLedger>,
    pub ledger: Arc<TransactionLedger>,
    pub cards: CardService,
    pub transactions: TransactionOrchestrator,
    pub sweeper: Arc<ExpirationSweeper>,
}

impl Engine {
    /// Assemble an engine around the given crypto collaborator and clock
    pub fn new(crypto: Arc<dyn CardCrypto>, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(CardRegistry::new());
        let limits = Arc::new(LimitLedger::new());
        let ledger = Arc::new(TransactionLedger::new());

        let cards = CardService::new(
            Arc::clone(&registry),
            Arc::clone(&limits),
            Arc::clone(&crypto),
            Arc::clone(&clock),
        );
        let transactions = TransactionOrchestrator::new(
            Arc::clone(&registry),
            Arc::clone(&limits),
            Arc::clone(&ledger),
            Arc::clone(&crypto),
            Arc::clone(&clock),
        );
        let sweeper = Arc::new(ExpirationSweeper::new(
            Arc::clone(&registry),
            Arc::clone(&clock),
        ));

        Engine {
            registry,
            limits,
            ledger,
            cards,
            transactions,
            sweeper,
        }
    }

    /// Register the expiration sweep as a daily periodic task
    ///
    /// The returned handle owns the timer thread; dropping it stops the
    /// schedule. Long-running callers keep it alive for the process
    /// lifetime.
    pub fn schedule_expiration_sweep(&self) -> Periodic {
        let sweeper = Arc::clone(&self.sweeper);
        Periodic::spawn(DAILY, move || {
            sweeper.run();
        })
    }
}
