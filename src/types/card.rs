//! Card entity and related types
//!
//! This module defines the Card structure, its lifecycle status, and the
//! filter used for administrative card queries. Cards are exclusively owned
//! by the [`crate::core::card_registry::CardRegistry`]; everything outside
//! the registry works with snapshots.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique card identifier
///
/// Card ids are totally ordered; the transfer path relies on this ordering
/// to acquire locks on card pairs deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CardId(Uuid);

impl CardId {
    /// Generate a fresh random card id
    pub fn new() -> Self {
        CardId(Uuid::new_v4())
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique owner (user) identifier
///
/// The core refers to owners by id only; user accounts themselves live
/// outside this crate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random user id
    pub fn new() -> Self {
        UserId(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Card lifecycle status
///
/// Transitions are driven by admin block/activate, the soft-delete cascade,
/// and the expiration sweeper (Active → Expired). There is no guard against
/// an admin reactivating an Expired card; the registry is deliberately
/// permissive here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    /// Card accepts monetary operations
    Active,
    /// Card is administratively blocked; no operations accepted
    Blocked,
    /// Card passed its expiration date; no operations accepted
    Expired,
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardStatus::Active => write!(f, "ACTIVE"),
            CardStatus::Blocked => write!(f, "BLOCKED"),
            CardStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A bank card and its mutable ledger state
///
/// The balance and status fields are the only long-lived shared mutable
/// state in the core. All mutation happens under the registry's per-card
/// lock; code outside the registry sees clones.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Unique card identifier
    pub id: CardId,

    /// Owning user, by id
    pub owner: UserId,

    /// Opaque encrypted card-number handle
    ///
    /// Produced by the external crypto collaborator. The core never
    /// interprets, stores, or logs the plaintext number.
    pub number_encrypted: String,

    /// Current balance; invariant: never negative
    pub balance: Decimal,

    /// Lifecycle status
    pub status: CardStatus,

    /// Date after which the sweeper expires the card
    pub expiration_date: NaiveDate,

    /// Soft-delete flag; a deleted card is always Blocked as well
    pub deleted: bool,

    /// Owner has asked an admin to block this card
    pub block_requested: bool,

    /// Creation timestamp
    pub created_at: NaiveDateTime,
}

impl Card {
    /// Build a new Active card with the requested opening balance
    pub fn new(
        owner: UserId,
        number_encrypted: String,
        balance: Decimal,
        expiration_date: NaiveDate,
        created_at: NaiveDateTime,
    ) -> Self {
        Card {
            id: CardId::new(),
            owner,
            number_encrypted,
            balance,
            status: CardStatus::Active,
            expiration_date,
            deleted: false,
            block_requested: false,
            created_at,
        }
    }

    /// Whether the card currently accepts monetary operations
    pub fn is_operational(&self) -> bool {
        self.status == CardStatus::Active && !self.deleted
    }
}

/// Parameters for creating a card
#[derive(Debug, Clone)]
pub struct CardCreateRequest {
    /// Plaintext card number; encrypted before it reaches the registry
    pub number: String,
    /// Opening balance
    pub balance: Decimal,
    /// Expiration date
    pub expiration_date: NaiveDate,
}

/// Card snapshot enriched with the masked card number, for display
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub owner: UserId,
    pub masked_number: String,
    pub balance: Decimal,
    pub status: CardStatus,
    pub expiration_date: NaiveDate,
    pub deleted: bool,
    pub block_requested: bool,
    pub created_at: NaiveDateTime,
}

impl CardView {
    /// Pair a card snapshot with its masked number
    pub fn from_card(card: Card, masked_number: String) -> Self {
        CardView {
            id: card.id,
            owner: card.owner,
            masked_number,
            balance: card.balance,
            status: card.status,
            expiration_date: card.expiration_date,
            deleted: card.deleted,
            block_requested: card.block_requested,
            created_at: card.created_at,
        }
    }
}

/// Optional predicates for administrative card queries
///
/// Each field contributes a predicate only when set; unset fields match
/// everything. This is the explicit value-object replacement for dynamic
/// query construction.
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub owner: Option<UserId>,
    pub status: Option<CardStatus>,
    pub min_balance: Option<Decimal>,
    pub max_balance: Option<Decimal>,
    pub deleted: Option<bool>,
    pub block_requested: Option<bool>,
}

impl CardFilter {
    /// Whether a card satisfies every set predicate
    pub fn matches(&self, card: &Card) -> bool {
        self.owner.is_none_or(|owner| card.owner == owner)
            && self.status.is_none_or(|status| card.status == status)
            && self.min_balance.is_none_or(|min| card.balance >= min)
            && self.max_balance.is_none_or(|max| card.balance <= max)
            && self.deleted.is_none_or(|deleted| card.deleted == deleted)
            && self
                .block_requested
                .is_none_or(|requested| card.block_requested == requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_card() -> Card {
        Card::new(
            UserId::new(),
            "opaque-handle".to_string(),
            Decimal::new(10000, 2), // 100.00
            NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_new_card_is_active_and_not_deleted() {
        let card = sample_card();
        assert_eq!(card.status, CardStatus::Active);
        assert!(!card.deleted);
        assert!(!card.block_requested);
        assert!(card.is_operational());
    }

    #[test]
    fn test_blocked_card_is_not_operational() {
        let mut card = sample_card();
        card.status = CardStatus::Blocked;
        assert!(!card.is_operational());
    }

    #[test]
    fn test_deleted_card_is_not_operational_even_if_active() {
        let mut card = sample_card();
        card.deleted = true;
        assert!(!card.is_operational());
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let card = sample_card();
        assert!(CardFilter::default().matches(&card));
    }

    #[rstest]
    #[case::status_match(CardFilter { status: Some(CardStatus::Active), ..Default::default() }, true)]
    #[case::status_mismatch(CardFilter { status: Some(CardStatus::Blocked), ..Default::default() }, false)]
    #[case::min_balance_match(CardFilter { min_balance: Some(Decimal::new(5000, 2)), ..Default::default() }, true)]
    #[case::min_balance_mismatch(CardFilter { min_balance: Some(Decimal::new(20000, 2)), ..Default::default() }, false)]
    #[case::max_balance_match(CardFilter { max_balance: Some(Decimal::new(20000, 2)), ..Default::default() }, true)]
    #[case::deleted_mismatch(CardFilter { deleted: Some(true), ..Default::default() }, false)]
    fn test_filter_predicates(#[case] filter: CardFilter, #[case] expected: bool) {
        let card = sample_card();
        assert_eq!(filter.matches(&card), expected);
    }

    #[test]
    fn test_filter_owner_predicate() {
        let card = sample_card();
        let matching = CardFilter {
            owner: Some(card.owner),
            ..Default::default()
        };
        let other = CardFilter {
            owner: Some(UserId::new()),
            ..Default::default()
        };
        assert!(matching.matches(&card));
        assert!(!other.matches(&card));
    }

    #[test]
    fn test_card_ids_are_ordered() {
        // Ordering is what the transfer lock discipline relies on.
        let a = CardId::new();
        let b = CardId::new();
        assert_eq!(a < b, !(b < a || a == b));
    }
}
