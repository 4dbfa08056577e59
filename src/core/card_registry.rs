//! Card registry
//!
//! The registry exclusively owns every [`Card`] and enforces the lifecycle
//! state machine. Each card sits behind its own mutex; all mutation goes
//! through [`CardRegistry::with_card`] (or the transfer path's ordered
//! two-card locking), which makes every check-then-act sequence on a card a
//! single atomic unit with respect to concurrent operations and the
//! expiration sweeper.
//!
//! # Locking discipline
//!
//! - The shard-level DashMap locks are held only long enough to clone the
//!   per-card `Arc`; no card mutex is ever acquired while a map reference
//!   is live.
//! - Code paths touching one card lock that one card. The transfer path
//!   locks two cards in ascending card-id order. Nothing else ever holds
//!   two card locks at once, so lock ordering is total and deadlock-free.

use crate::types::{
    Card, CardFilter, CardId, CardStatus, LedgerError, Page, PageRequest, UserId,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns all cards and the card-number uniqueness index
pub struct CardRegistry {
    /// Per-card state, each entry behind its own lock
    cards: DashMap<CardId, Arc<Mutex<Card>>>,

    /// Claimed encrypted-number handles, for duplicate detection
    numbers: DashMap<String, CardId>,

    /// Card ids per owner; append-only (ownership never moves)
    by_owner: DashMap<UserId, Vec<CardId>>,

    /// Soft-delete flag per known owner
    owners_deleted: DashMap<UserId, bool>,
}

impl CardRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        CardRegistry {
            cards: DashMap::new(),
            numbers: DashMap::new(),
            by_owner: DashMap::new(),
            owners_deleted: DashMap::new(),
        }
    }

    /// Make an owner known to the registry (idempotent)
    pub fn register_owner(&self, owner: UserId) {
        self.owners_deleted.entry(owner).or_insert(false);
    }

    /// Insert a freshly created card
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCard` if the encrypted-number handle is already
    /// claimed by another card. The claim is atomic: two concurrent inserts
    /// with the same handle cannot both succeed.
    pub fn insert(&self, card: Card) -> Result<CardId, LedgerError> {
        let id = card.id;
        match self.numbers.entry(card.number_encrypted.clone()) {
            Entry::Occupied(_) => {
                warn!(card = %id, "card number handle already exists");
                return Err(LedgerError::DuplicateCard);
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        self.register_owner(card.owner);
        self.by_owner.entry(card.owner).or_default().push(id);
        self.cards.insert(id, Arc::new(Mutex::new(card)));
        Ok(id)
    }

    /// The lock handle for a card
    ///
    /// # Errors
    ///
    /// Returns `CardNotFound` if no card has the given id.
    pub fn handle(&self, card_id: CardId) -> Result<Arc<Mutex<Card>>, LedgerError> {
        self.cards
            .get(&card_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::card_not_found(card_id))
    }

    /// A point-in-time copy of a card
    pub fn snapshot(&self, card_id: CardId) -> Result<Card, LedgerError> {
        Ok(self.handle(card_id)?.lock().clone())
    }

    /// Run a closure against a card under its lock
    ///
    /// The closure sees the card exclusively; concurrent operations on the
    /// same card wait. An `Err` from the closure leaves the card exactly as
    /// the closure left it, so closures must not bail after mutating.
    pub fn with_card<T, F>(&self, card_id: CardId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Card) -> Result<T, LedgerError>,
    {
        let handle = self.handle(card_id)?;
        let mut card = handle.lock();
        f(&mut card)
    }

    /// Set a card's status (admin block / activate)
    ///
    /// Any state may move to Blocked or Active; nothing here prevents
    /// reactivating an Expired card. The deleted flag is cleared on every
    /// status change, matching soft-delete being undone by activation.
    pub fn change_status(&self, card_id: CardId, status: CardStatus) -> Result<(), LedgerError> {
        self.with_card(card_id, |card| {
            info!(card = %card_id, from = %card.status, to = %status, "changing card status");
            card.status = status;
            card.deleted = false;
            Ok(())
        })
    }

    /// Soft-delete one card: forced Blocked and flagged deleted
    pub fn soft_delete(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.with_card(card_id, |card| {
            info!(card = %card_id, "soft-deleting card");
            card.status = CardStatus::Blocked;
            card.deleted = true;
            Ok(())
        })
    }

    /// Restore one soft-deleted card: forced Active and undeleted
    pub fn restore(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.with_card(card_id, |card| {
            info!(card = %card_id, "restoring card");
            card.status = CardStatus::Active;
            card.deleted = false;
            Ok(())
        })
    }

    /// File a block request on behalf of the card's owner
    ///
    /// # Errors
    ///
    /// In precedence order: `BlockAlreadyRequested` if a request is already
    /// pending, `CardOwnership` if the requester does not own the card,
    /// `CardNotActive` unless the card is Active.
    pub fn request_block(&self, card_id: CardId, requester: UserId) -> Result<(), LedgerError> {
        self.with_card(card_id, |card| {
            if card.block_requested {
                warn!(card = %card_id, "block already requested");
                return Err(LedgerError::BlockAlreadyRequested { card: card_id });
            }
            if card.owner != requester {
                warn!(card = %card_id, user = %requester, "block request on foreign card");
                return Err(LedgerError::card_ownership(card_id, requester));
            }
            if card.status != CardStatus::Active {
                return Err(LedgerError::card_not_active(card_id, card.status));
            }
            card.block_requested = true;
            info!(card = %card_id, "block request filed");
            Ok(())
        })
    }

    /// Clear a pending block request (admin rejection)
    ///
    /// # Errors
    ///
    /// Returns `NoPendingBlockRequest` if the flag is not set.
    pub fn reject_block_request(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.with_card(card_id, |card| {
            if !card.block_requested {
                return Err(LedgerError::NoPendingBlockRequest { card: card_id });
            }
            card.block_requested = false;
            info!(card = %card_id, "block request rejected");
            Ok(())
        })
    }

    /// Soft-delete an owner and every card they hold
    ///
    /// Each card is blocked and flagged deleted under its own lock, so the
    /// cascade serializes against in-flight operations per card.
    pub fn soft_delete_owner(&self, owner: UserId) -> Result<(), LedgerError> {
        let mut deleted = self
            .owners_deleted
            .get_mut(&owner)
            .ok_or(LedgerError::OwnerNotFound { owner })?;
        *deleted = true;
        drop(deleted);

        let affected = self.apply_to_owner_cards(owner, CardStatus::Blocked, true);
        info!(%owner, cards = affected, "owner and their cards soft-deleted");
        Ok(())
    }

    /// Restore a soft-deleted owner and reactivate every card they hold
    ///
    /// # Errors
    ///
    /// Returns `OwnerNotFound` for an unknown owner and `OwnerAlreadyActive`
    /// if the owner is not currently soft-deleted.
    pub fn restore_owner(&self, owner: UserId) -> Result<(), LedgerError> {
        let mut deleted = self
            .owners_deleted
            .get_mut(&owner)
            .ok_or(LedgerError::OwnerNotFound { owner })?;
        if !*deleted {
            warn!(%owner, "restore requested for active owner");
            return Err(LedgerError::OwnerAlreadyActive { owner });
        }
        *deleted = false;
        drop(deleted);

        let affected = self.apply_to_owner_cards(owner, CardStatus::Active, false);
        info!(%owner, cards = affected, "owner and their cards restored");
        Ok(())
    }

    fn apply_to_owner_cards(&self, owner: UserId, status: CardStatus, deleted: bool) -> usize {
        let ids = self.card_ids_for_owner(owner);
        for id in &ids {
            if let Some(entry) = self.cards.get(id) {
                let handle = Arc::clone(entry.value());
                drop(entry);
                let mut card = handle.lock();
                card.status = status;
                card.deleted = deleted;
            }
        }
        ids.len()
    }

    /// Ids of every card an owner holds, deleted or not
    pub fn card_ids_for_owner(&self, owner: UserId) -> Vec<CardId> {
        self.by_owner
            .get(&owner)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    /// Snapshots of an owner's cards, excluding soft-deleted ones
    pub fn cards_for_owner(&self, owner: UserId) -> Vec<Card> {
        self.card_ids_for_owner(owner)
            .into_iter()
            .filter_map(|id| self.snapshot(id).ok())
            .filter(|card| !card.deleted)
            .collect()
    }

    /// Filtered, paged card query for the admin surface
    ///
    /// Snapshots are taken one card at a time; the result is a consistent
    /// view per card, not across cards. Ordered by creation time, then id.
    pub fn find(&self, filter: &CardFilter, page: PageRequest) -> Page<Card> {
        let mut matched: Vec<Card> = self
            .cards
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.lock().clone())
            .filter(|card| filter.matches(card))
            .collect();
        matched.sort_by_key(|card| (card.created_at, card.id));
        Page::from_slice(matched, page)
    }

    /// Lock handles of every card, for the sweeper's scan
    pub fn all_handles(&self) -> Vec<Arc<Mutex<Card>>> {
        self.cards
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of cards in the registry
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the registry holds no cards
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for CardRegistry {
    fn default() -> Self {
        Self::new()
    }
}
