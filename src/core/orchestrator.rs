//! Transaction orchestrator
//!
//! The validation-and-mutation pipeline for withdraw, deposit, and
//! transfer, plus the operator-scoped ledger query. Every operation runs
//! its whole check-then-act sequence - ownership, status, funds, limits,
//! balance mutation, ledger append - while holding the affected card
//! lock(s), so concurrent operations on the same card serialize and can
//! never double-spend against the balance or a limit window.
//!
//! Nothing fallible runs after the first balance mutation: descriptions
//! (which may call the crypto collaborator) are built before the debit or
//! credit, which is what makes "commit together or not at all" hold
//! without a rollback mechanism.

use crate::core::card_registry::CardRegistry;
use crate::core::limit_ledger::LimitLedger;
use crate::core::spend_aggregator::SpendAggregator;
use crate::core::transaction_ledger::TransactionLedger;
use crate::crypto::CardCrypto;
use crate::time::Clock;
use crate::types::{
    Card, CardId, CardStatus, LedgerError, Operator, OperationType, Page, PageRequest,
    Transaction, TransactionFilter, TransactionId, TransactionRequest, UserId,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Placeholder description treated the same as no description at all
const DESCRIPTION_PLACEHOLDER: &str = "transaction";

/// Orchestrates balance mutations against the registry, limits, and ledger
pub struct TransactionOrchestrator {
    registry: Arc<CardRegistry>,
    limits: Arc<LimitLedger>,
    ledger: Arc<TransactionLedger>,
    spend: SpendAggregator,
    crypto: Arc<dyn CardCrypto>,
    clock: Arc<dyn Clock>,
}

impl TransactionOrchestrator {
    /// Wire an orchestrator to its collaborators
    pub fn new(
        registry: Arc<CardRegistry>,
        limits: Arc<LimitLedger>,
        ledger: Arc<TransactionLedger>,
        crypto: Arc<dyn CardCrypto>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let spend = SpendAggregator::new(Arc::clone(&ledger));
        TransactionOrchestrator {
            registry,
            limits,
            ledger,
            spend,
            crypto,
            clock,
        }
    }

    /// Withdraw funds from a card owned by the operator
    ///
    /// # Errors
    ///
    /// `CardNotFound`, `CardOwnership`, `CardNotActive`, `InvalidAmount`,
    /// `InsufficientFunds`, `CardLimitNotFound`,
    /// `DailyLimitExceeded` / `MonthlyLimitExceeded`, or `Crypto`.
    pub fn withdraw(
        &self,
        card_id: CardId,
        operator: &Operator,
        request: &TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        info!(card = %card_id, user = %operator.id, amount = %request.amount, "withdrawal attempt");

        let handle = self.registry.handle(card_id)?;
        let mut card = handle.lock();
        validate_access(&card, operator.id)?;
        validate_amount(request.amount)?;

        if card.balance < request.amount {
            warn!(card = %card_id, available = %card.balance, requested = %request.amount,
                "insufficient funds");
            return Err(LedgerError::insufficient_funds(
                card_id,
                card.balance,
                request.amount,
            ));
        }

        let now = self.clock.now();
        self.validate_limit(&card, request.amount, OperationType::Withdrawal, now)?;

        let tx = self.build_transaction(&card, OperationType::Withdrawal, request, now)?;
        card.balance = card
            .balance
            .checked_sub(request.amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("withdrawal", card_id))?;
        self.ledger.append(tx.clone())?;

        info!(card = %card_id, amount = %request.amount, "withdrawal successful");
        Ok(tx)
    }

    /// Deposit funds onto a card owned by the operator
    ///
    /// # Errors
    ///
    /// `CardNotFound`, `CardOwnership`, `CardNotActive`, `InvalidAmount`
    /// for a non-positive amount, limit errors, or `Crypto`.
    pub fn deposit(
        &self,
        card_id: CardId,
        operator: &Operator,
        request: &TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        info!(card = %card_id, user = %operator.id, amount = %request.amount, "deposit attempt");

        let handle = self.registry.handle(card_id)?;
        let mut card = handle.lock();
        validate_access(&card, operator.id)?;
        validate_amount(request.amount)?;

        let now = self.clock.now();
        self.validate_limit(&card, request.amount, OperationType::Deposit, now)?;

        let tx = self.build_transaction(&card, OperationType::Deposit, request, now)?;
        card.balance = card
            .balance
            .checked_add(request.amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("deposit", card_id))?;
        self.ledger.append(tx.clone())?;

        info!(card = %card_id, amount = %request.amount, "deposit successful");
        Ok(tx)
    }

    /// Transfer funds between two cards owned by the same operator
    ///
    /// Produces exactly two ledger records - a Transfer on the source and a
    /// Deposit on the destination - and two balance mutations, applied
    /// together or not at all. The Transfer limit is checked against the
    /// source card only.
    ///
    /// # Errors
    ///
    /// `SameCardTransfer`, plus everything the single-card operations can
    /// return, evaluated for the source card first.
    pub fn transfer(
        &self,
        from_id: CardId,
        to_id: CardId,
        operator: &Operator,
        request: &TransactionRequest,
    ) -> Result<(Transaction, Transaction), LedgerError> {
        info!(from = %from_id, to = %to_id, user = %operator.id, amount = %request.amount,
            "transfer attempt");

        if from_id == to_id {
            warn!(card = %from_id, "transfer to the same card");
            return Err(LedgerError::SameCardTransfer { card: from_id });
        }

        let from_handle = self.registry.handle(from_id)?;
        let to_handle = self.registry.handle(to_id)?;

        // Lock both cards in ascending id order so two opposing transfers
        // on the same pair can never deadlock.
        let (low_handle, high_handle) = if from_id < to_id {
            (&from_handle, &to_handle)
        } else {
            (&to_handle, &from_handle)
        };
        let mut low = low_handle.lock();
        let mut high = high_handle.lock();
        let (from_card, to_card) = if from_id < to_id {
            (&mut *low, &mut *high)
        } else {
            (&mut *high, &mut *low)
        };

        validate_access(from_card, operator.id)?;
        validate_access(to_card, operator.id)?;
        validate_amount(request.amount)?;

        if from_card.balance < request.amount {
            warn!(card = %from_id, available = %from_card.balance, requested = %request.amount,
                "insufficient funds on source card");
            return Err(LedgerError::insufficient_funds(
                from_id,
                from_card.balance,
                request.amount,
            ));
        }

        let now = self.clock.now();
        self.validate_limit(from_card, request.amount, OperationType::Transfer, now)?;

        let tx_out = self.build_transaction(from_card, OperationType::Transfer, request, now)?;
        let tx_in = self.build_transaction(to_card, OperationType::Deposit, request, now)?;

        from_card.balance = from_card
            .balance
            .checked_sub(request.amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", from_id))?;
        to_card.balance = to_card
            .balance
            .checked_add(request.amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", to_id))?;
        self.ledger.append_all(vec![tx_out.clone(), tx_in.clone()])?;

        info!(from = %from_id, to = %to_id, amount = %request.amount, "transfer successful");
        Ok((tx_out, tx_in))
    }

    /// Operator-scoped, filtered, paged ledger query
    ///
    /// Non-admin operators are confined to their own cards: a card filter
    /// is validated for ownership and active status, and the owner filter
    /// is forced to the operator regardless of what the caller supplied.
    /// Admins query unrestricted.
    pub fn transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
        operator: &Operator,
    ) -> Result<Page<Transaction>, LedgerError> {
        let mut filter = filter.clone();

        if !operator.is_admin() {
            if let Some(card_id) = filter.card {
                let card = self.registry.snapshot(card_id)?;
                validate_access(&card, operator.id)?;
            }
            info!(user = %operator.id, "restricting transaction query to own cards");
            filter.owner = Some(operator.id);
        } else {
            info!(user = %operator.id, "admin transaction query");
        }

        let owner_cards: Option<HashSet<CardId>> = filter
            .owner
            .map(|owner| self.registry.card_ids_for_owner(owner).into_iter().collect());

        Ok(self.ledger.find(&filter, owner_cards.as_ref(), page))
    }

    /// Check the daily and monthly caps for one operation on a card
    ///
    /// Spends are summed from the ledger for the current day and month.
    /// The comparison is skipped when the card's status is Expired; the
    /// active-status guard upstream already rejects expired cards, so the
    /// branch is unreachable in practice, but the behavior is part of the
    /// contract and is kept as observed.
    fn validate_limit(
        &self,
        card: &Card,
        amount: Decimal,
        operation: OperationType,
        now: NaiveDateTime,
    ) -> Result<(), LedgerError> {
        let limit = self.limits.limit_for(card.id, operation)?;

        let daily_spent = self.spend.spent_today(card.id, operation, now);
        let monthly_spent = self.spend.spent_this_month(card.id, operation, now);

        if card.status != CardStatus::Expired {
            if daily_spent + amount > limit.daily_limit {
                warn!(card = %card.id, %operation, spent = %daily_spent, requested = %amount,
                    limit = %limit.daily_limit, "daily limit exceeded");
                return Err(LedgerError::DailyLimitExceeded {
                    card: card.id,
                    spent: daily_spent,
                    requested: amount,
                    limit: limit.daily_limit,
                });
            }
            if monthly_spent + amount > limit.monthly_limit {
                warn!(card = %card.id, %operation, spent = %monthly_spent, requested = %amount,
                    limit = %limit.monthly_limit, "monthly limit exceeded");
                return Err(LedgerError::MonthlyLimitExceeded {
                    card: card.id,
                    spent: monthly_spent,
                    requested: amount,
                    limit: limit.monthly_limit,
                });
            }
        }
        Ok(())
    }

    /// Build the ledger record for an operation, synthesizing a description
    /// when the caller supplied none (or the placeholder)
    ///
    /// The synthesized text embeds only the masked card number obtained
    /// from the crypto collaborator; neither the raw nor the encrypted
    /// number ever appears.
    fn build_transaction(
        &self,
        card: &Card,
        kind: OperationType,
        request: &TransactionRequest,
        now: NaiveDateTime,
    ) -> Result<Transaction, LedgerError> {
        let description = match request.description.as_deref() {
            Some(text) if !text.trim().is_empty() && text != DESCRIPTION_PLACEHOLDER => {
                text.to_string()
            }
            _ => {
                let masked = self.crypto.mask_decrypted(&card.number_encrypted)?;
                match kind {
                    OperationType::Deposit => {
                        format!("Card replenishment {} for the amount {}", masked, request.amount)
                    }
                    OperationType::Withdrawal => format!(
                        "Withdrawal of funds from the card {} for the amount {}",
                        masked, request.amount
                    ),
                    OperationType::Transfer => format!(
                        "Transfer of funds from the card {} for the amount {}",
                        masked, request.amount
                    ),
                }
            }
        };

        Ok(Transaction {
            id: TransactionId::new(),
            card: card.id,
            kind,
            amount: request.amount,
            description,
            timestamp: now,
        })
    }
}

/// Reject access unless the operator owns an operational card
fn validate_access(card: &Card, operator: UserId) -> Result<(), LedgerError> {
    if card.owner != operator {
        warn!(card = %card.id, user = %operator, "access to card owned by another user");
        return Err(LedgerError::card_ownership(card.id, operator));
    }
    if !card.is_operational() {
        warn!(card = %card.id, status = %card.status, "card is not active");
        return Err(LedgerError::card_not_active(card.id, card.status));
    }
    Ok(())
}

/// Reject non-positive amounts before anything is mutated
fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount { amount });
    }
    Ok(())
}
