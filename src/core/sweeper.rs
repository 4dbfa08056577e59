//! Expiration sweeper
//!
//! The maintenance task that moves stale Active cards to Expired. It runs
//! once per day with no input, reads and writes only the card registry,
//! and takes each card's lock for the check-and-transition, so it can
//! neither overwrite an in-flight operation nor let one proceed on a card
//! it is expiring.

use crate::core::card_registry::CardRegistry;
use crate::time::Clock;
use crate::types::CardStatus;
use std::sync::Arc;
use tracing::info;

/// Scheduled Active → Expired transition
pub struct ExpirationSweeper {
    registry: Arc<CardRegistry>,
    clock: Arc<dyn Clock>,
}

impl ExpirationSweeper {
    /// Wire the sweeper to the registry and clock
    pub fn new(registry: Arc<CardRegistry>, clock: Arc<dyn Clock>) -> Self {
        ExpirationSweeper { registry, clock }
    }

    /// Run one sweep; returns how many cards were expired
    ///
    /// A card expires when its status is Active and its expiration date is
    /// strictly before today. The status is re-checked under the card lock,
    /// so a concurrent block or withdrawal serializes with the transition.
    /// Running twice is a no-op the second time.
    pub fn run(&self) -> usize {
        let today = self.clock.today();
        let mut expired = 0;

        for handle in self.registry.all_handles() {
            let mut card = handle.lock();
            if card.status == CardStatus::Active && card.expiration_date < today {
                card.status = CardStatus::Expired;
                expired += 1;
                info!(card = %card.id, "card has expired");
            }
        }

        info!(expired, "expiration sweep finished");
        expired
    }
}
