//! Card service
//!
//! The administrative and user-facing card surface: creation (with limit
//! seeding), block/activate, soft delete and restore (single card and
//! owner-level cascade), block requests, limit reads and upserts, and
//! masked card listings. Everything here mutates cards only through the
//! registry, so the per-card locking discipline holds.

use crate::core::card_registry::CardRegistry;
use crate::core::limit_ledger::LimitLedger;
use crate::crypto::{mask_card_number, CardCrypto};
use crate::time::Clock;
use crate::types::{
    Card, CardCreateRequest, CardFilter, CardId, CardLimit, CardStatus, CardView, LedgerError,
    Operator, OperationType, Page, PageRequest, UserId,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Card administration and listing operations
pub struct CardService {
    registry: Arc<CardRegistry>,
    limits: Arc<LimitLedger>,
    crypto: Arc<dyn CardCrypto>,
    clock: Arc<dyn Clock>,
}

impl CardService {
    /// Wire the service to its collaborators
    pub fn new(
        registry: Arc<CardRegistry>,
        limits: Arc<LimitLedger>,
        crypto: Arc<dyn CardCrypto>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        CardService {
            registry,
            limits,
            crypto,
            clock,
        }
    }

    /// Create a card for an owner and seed its default limits
    ///
    /// The plaintext number is encrypted before it reaches the registry and
    /// appears in the returned view only in masked form.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a negative opening balance, `Crypto` if
    /// encryption fails, `DuplicateCard` if the number is already claimed.
    pub fn create_card(
        &self,
        owner: UserId,
        request: &CardCreateRequest,
    ) -> Result<CardView, LedgerError> {
        info!(%owner, "creating card");

        if request.balance < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount {
                amount: request.balance,
            });
        }

        let number_encrypted = self.crypto.encrypt(&request.number)?;
        let card = Card::new(
            owner,
            number_encrypted,
            request.balance,
            request.expiration_date,
            self.clock.now(),
        );
        let snapshot = card.clone();
        let id = self.registry.insert(card)?;
        self.limits.seed_defaults(id);

        info!(card = %id, %owner, "card created");
        Ok(CardView::from_card(snapshot, mask_card_number(&request.number)))
    }

    /// Block a card (admin)
    pub fn block_card(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.registry.change_status(card_id, CardStatus::Blocked)
    }

    /// Activate a card (admin); also reactivates Expired and deleted cards
    pub fn activate_card(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.registry.change_status(card_id, CardStatus::Active)
    }

    /// Soft-delete one card
    pub fn delete_card(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.registry.soft_delete(card_id)
    }

    /// Restore one soft-deleted card
    pub fn restore_card(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.registry.restore(card_id)
    }

    /// Soft-delete an owner and all their cards
    pub fn delete_owner(&self, owner: UserId) -> Result<(), LedgerError> {
        self.registry.soft_delete_owner(owner)
    }

    /// Restore an owner and all their cards
    pub fn restore_owner(&self, owner: UserId) -> Result<(), LedgerError> {
        self.registry.restore_owner(owner)
    }

    /// File a block request on behalf of a card owner
    pub fn request_card_blocking(
        &self,
        card_id: CardId,
        requester: UserId,
    ) -> Result<(), LedgerError> {
        self.registry.request_block(card_id, requester)
    }

    /// Reject a pending block request (admin)
    pub fn reject_card_block_request(&self, card_id: CardId) -> Result<(), LedgerError> {
        self.registry.reject_block_request(card_id)
    }

    /// Read every limit row of a card
    ///
    /// The card must exist and be neither blocked nor expired; non-admin
    /// operators must own it.
    pub fn get_card_limits(
        &self,
        card_id: CardId,
        operator: &Operator,
    ) -> Result<Vec<CardLimit>, LedgerError> {
        let card = self.registry.snapshot(card_id)?;
        validate_card_is_active(&card)?;
        if card.owner != operator.id && !operator.is_admin() {
            warn!(card = %card_id, user = %operator.id, "limit read on foreign card");
            return Err(LedgerError::card_ownership(card_id, operator.id));
        }
        self.limits.limits_for(card_id)
    }

    /// Upsert the limit row for one (card, operation type) pair (admin)
    ///
    /// The card must exist and be neither blocked nor expired.
    pub fn set_card_limit(
        &self,
        card_id: CardId,
        operation: OperationType,
        daily_limit: Decimal,
        monthly_limit: Decimal,
    ) -> Result<CardLimit, LedgerError> {
        let card = self.registry.snapshot(card_id)?;
        validate_card_is_active(&card)?;
        self.limits.set(card_id, operation, daily_limit, monthly_limit)
    }

    /// An owner's cards, excluding soft-deleted ones, with masked numbers
    pub fn user_cards(&self, owner: UserId) -> Result<Vec<CardView>, LedgerError> {
        self.registry
            .cards_for_owner(owner)
            .into_iter()
            .map(|card| self.masked_view(card))
            .collect()
    }

    /// Filtered, paged card listing with masked numbers (admin)
    pub fn find_cards(
        &self,
        filter: &CardFilter,
        page: PageRequest,
    ) -> Result<Page<CardView>, LedgerError> {
        let cards = self.registry.find(filter, page);
        let items = cards
            .items
            .into_iter()
            .map(|card| self.masked_view(card))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            page: cards.page,
            size: cards.size,
            total_elements: cards.total_elements,
        })
    }

    fn masked_view(&self, card: Card) -> Result<CardView, LedgerError> {
        let masked = self.crypto.mask_decrypted(&card.number_encrypted)?;
        Ok(CardView::from_card(card, masked))
    }
}

/// Limits are only readable and writable for cards that are neither
/// blocked nor expired
fn validate_card_is_active(card: &Card) -> Result<(), LedgerError> {
    if card.status != CardStatus::Active {
        return Err(LedgerError::card_not_active(card.id, card.status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PassthroughCrypto;
    use crate::time::SteppingClock;
    use chrono::NaiveDate;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn create_request(number: &str) -> CardCreateRequest {
        CardCreateRequest {
            number: number.to_string(),
            balance: dec(10000),
            expiration_date: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
        }
    }

    struct Fixture {
        registry: Arc<CardRegistry>,
        limits: Arc<LimitLedger>,
        service: CardService,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(CardRegistry::new());
        let limits = Arc::new(LimitLedger::new());
        let clock = Arc::new(SteppingClock::starting_at(
            NaiveDate::from_ymd_opt(2024, 6, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ));
        let service = CardService::new(
            Arc::clone(&registry),
            Arc::clone(&limits),
            Arc::new(PassthroughCrypto),
            clock,
        );
        Fixture {
            registry,
            limits,
            service,
        }
    }

    #[test]
    fn test_create_card_masks_number_and_seeds_limits() {
        let fx = fixture();
        let owner = UserId::new();

        let view = fx
            .service
            .create_card(owner, &create_request("4111111111111111"))
            .unwrap();

        assert_eq!(view.masked_number, "**** **** **** 1111");
        assert_eq!(view.balance, dec(10000));
        assert_eq!(view.status, CardStatus::Active);

        let rows = fx.limits.limits_for(view.id).unwrap();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.daily_limit, CardLimit::DEFAULT_CAP);
        }
    }

    #[test]
    fn test_create_card_with_duplicate_number_fails() {
        let fx = fixture();
        fx.service
            .create_card(UserId::new(), &create_request("4111111111111111"))
            .unwrap();

        let result = fx
            .service
            .create_card(UserId::new(), &create_request("4111111111111111"));
        assert_eq!(result.unwrap_err(), LedgerError::DuplicateCard);
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn test_create_card_rejects_negative_opening_balance() {
        let fx = fixture();
        let mut request = create_request("4111111111111111");
        request.balance = dec(-1);

        let result = fx.service.create_card(UserId::new(), &request);
        assert!(matches!(result.unwrap_err(), LedgerError::InvalidAmount { .. }));
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn test_block_and_activate_round_trip() {
        let fx = fixture();
        let view = fx
            .service
            .create_card(UserId::new(), &create_request("4111111111111111"))
            .unwrap();

        fx.service.block_card(view.id).unwrap();
        assert_eq!(
            fx.registry.snapshot(view.id).unwrap().status,
            CardStatus::Blocked
        );

        fx.service.activate_card(view.id).unwrap();
        assert_eq!(
            fx.registry.snapshot(view.id).unwrap().status,
            CardStatus::Active
        );
    }

    #[test]
    fn test_get_limits_requires_ownership_or_admin() {
        let fx = fixture();
        let owner = UserId::new();
        let view = fx
            .service
            .create_card(owner, &create_request("4111111111111111"))
            .unwrap();

        assert!(fx.service.get_card_limits(view.id, &Operator::user(owner)).is_ok());
        assert!(fx
            .service
            .get_card_limits(view.id, &Operator::admin(UserId::new()))
            .is_ok());

        let stranger = Operator::user(UserId::new());
        assert!(matches!(
            fx.service.get_card_limits(view.id, &stranger).unwrap_err(),
            LedgerError::CardOwnership { .. }
        ));
    }

    #[test]
    fn test_limits_of_blocked_card_are_unreadable() {
        let fx = fixture();
        let owner = UserId::new();
        let view = fx
            .service
            .create_card(owner, &create_request("4111111111111111"))
            .unwrap();
        fx.service.block_card(view.id).unwrap();

        let result = fx.service.get_card_limits(view.id, &Operator::user(owner));
        assert!(matches!(result.unwrap_err(), LedgerError::CardNotActive { .. }));
    }

    #[test]
    fn test_set_limit_on_blocked_card_fails() {
        let fx = fixture();
        let view = fx
            .service
            .create_card(UserId::new(), &create_request("4111111111111111"))
            .unwrap();
        fx.service.block_card(view.id).unwrap();

        let result =
            fx.service
                .set_card_limit(view.id, OperationType::Deposit, dec(100), dec(200));
        assert!(matches!(result.unwrap_err(), LedgerError::CardNotActive { .. }));
    }

    #[test]
    fn test_set_limit_upserts() {
        let fx = fixture();
        let view = fx
            .service
            .create_card(UserId::new(), &create_request("4111111111111111"))
            .unwrap();

        fx.service
            .set_card_limit(view.id, OperationType::Withdrawal, dec(100), dec(200))
            .unwrap();
        let row = fx
            .limits
            .limit_for(view.id, OperationType::Withdrawal)
            .unwrap();
        assert_eq!(row.daily_limit, dec(100));
        assert_eq!(row.monthly_limit, dec(200));
    }

    #[test]
    fn test_user_cards_hides_deleted_and_masks() {
        let fx = fixture();
        let owner = UserId::new();
        let kept = fx
            .service
            .create_card(owner, &create_request("4111111111111111"))
            .unwrap();
        let gone = fx
            .service
            .create_card(owner, &create_request("4222222222222222"))
            .unwrap();
        fx.service.delete_card(gone.id).unwrap();

        let cards = fx.service.user_cards(owner).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, kept.id);
        assert_eq!(cards[0].masked_number, "**** **** **** 1111");
    }

    #[test]
    fn test_find_cards_filters_by_block_requested() {
        let fx = fixture();
        let owner = UserId::new();
        let flagged = fx
            .service
            .create_card(owner, &create_request("4111111111111111"))
            .unwrap();
        fx.service
            .create_card(owner, &create_request("4222222222222222"))
            .unwrap();
        fx.service.request_card_blocking(flagged.id, owner).unwrap();

        let filter = CardFilter {
            block_requested: Some(true),
            ..Default::default()
        };
        let page = fx.service.find_cards(&filter, PageRequest::default()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, flagged.id);
    }

    #[test]
    fn test_owner_cascade_through_service() {
        let fx = fixture();
        let owner = UserId::new();
        let view = fx
            .service
            .create_card(owner, &create_request("4111111111111111"))
            .unwrap();

        fx.service.delete_owner(owner).unwrap();
        let card = fx.registry.snapshot(view.id).unwrap();
        assert!(card.deleted);
        assert_eq!(card.status, CardStatus::Blocked);

        fx.service.restore_owner(owner).unwrap();
        let card = fx.registry.snapshot(view.id).unwrap();
        assert!(!card.deleted);
        assert_eq!(card.status, CardStatus::Active);
    }
}
