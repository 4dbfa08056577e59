//! Scenario replay
//!
//! Drives an [`Engine`] from a parsed scenario: aliases are mapped to real
//! card and owner ids on first sight, the replay clock follows the `at`
//! column, and business-rule rejections are logged and skipped so a
//! scenario can assert the state *after* a failed operation. Strict mode
//! turns the first rejection into a fatal error instead.

use crate::crypto::PassthroughCrypto;
use crate::engine::Engine;
use crate::io::csv_format::{CardStateRow, ScenarioOp, ScenarioStep};
use crate::time::{Clock, SteppingClock};
use crate::types::{
    CardCreateRequest, CardId, LedgerError, Operator, TransactionRequest, UserId,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Clock position a replay starts at when the first row has no `at`
fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
}

/// Replays scenario steps against a freshly assembled engine
pub struct ScenarioRunner {
    engine: Engine,
    clock: Arc<SteppingClock>,
    owners: HashMap<String, UserId>,
    cards: HashMap<String, CardId>,
    /// (card alias, owner alias) in creation order, for output
    card_owners: Vec<(String, String)>,
}

impl ScenarioRunner {
    /// A runner with a development crypto stand-in and a steppable clock
    pub fn new() -> Self {
        let clock = Arc::new(SteppingClock::starting_at(default_start()));
        let engine = Engine::new(
            Arc::new(PassthroughCrypto),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        ScenarioRunner {
            engine,
            clock,
            owners: HashMap::new(),
            cards: HashMap::new(),
            card_owners: Vec::new(),
        }
    }

    /// The engine being driven
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Replay all steps
    ///
    /// In strict mode the first failing operation aborts the replay; in
    /// lenient mode (the default for fixtures) failures are logged and the
    /// remaining steps still run.
    pub fn run(&mut self, steps: Vec<ScenarioStep>, strict: bool) -> Result<(), LedgerError> {
        for step in steps {
            if let Err(error) = self.apply(step) {
                if strict {
                    return Err(error);
                }
                warn!(%error, "operation rejected, continuing replay");
            }
        }
        Ok(())
    }

    /// Apply a single step, moving the clock first if the step carries `at`
    pub fn apply(&mut self, step: ScenarioStep) -> Result<(), LedgerError> {
        if let Some(at) = step.at {
            self.clock.set(at);
        }

        match step.op {
            ScenarioOp::Create {
                owner,
                card,
                number,
                balance,
                expires,
            } => {
                if self.cards.contains_key(&card) {
                    return Err(scenario_error(format!("card alias '{}' already used", card)));
                }
                let owner_id = self.owner_id(&owner);
                let view = self.engine.cards.create_card(
                    owner_id,
                    &CardCreateRequest {
                        number,
                        balance,
                        expiration_date: expires,
                    },
                )?;
                self.cards.insert(card.clone(), view.id);
                self.card_owners.push((card, owner));
                Ok(())
            }
            ScenarioOp::Deposit {
                owner,
                card,
                amount,
                description,
            } => {
                let operator = Operator::user(self.owner_id(&owner));
                let card = self.card_id(&card)?;
                self.engine
                    .transactions
                    .deposit(card, &operator, &TransactionRequest { amount, description })?;
                Ok(())
            }
            ScenarioOp::Withdraw {
                owner,
                card,
                amount,
                description,
            } => {
                let operator = Operator::user(self.owner_id(&owner));
                let card = self.card_id(&card)?;
                self.engine
                    .transactions
                    .withdraw(card, &operator, &TransactionRequest { amount, description })?;
                Ok(())
            }
            ScenarioOp::Transfer {
                owner,
                card,
                to_card,
                amount,
                description,
            } => {
                let operator = Operator::user(self.owner_id(&owner));
                let from = self.card_id(&card)?;
                let to = self.card_id(&to_card)?;
                self.engine.transactions.transfer(
                    from,
                    to,
                    &operator,
                    &TransactionRequest { amount, description },
                )?;
                Ok(())
            }
            ScenarioOp::Block { card } => {
                let card = self.card_id(&card)?;
                self.engine.cards.block_card(card)
            }
            ScenarioOp::Activate { card } => {
                let card = self.card_id(&card)?;
                self.engine.cards.activate_card(card)
            }
            ScenarioOp::RequestBlock { owner, card } => {
                let requester = self.owner_id(&owner);
                let card = self.card_id(&card)?;
                self.engine.cards.request_card_blocking(card, requester)
            }
            ScenarioOp::RejectBlock { card } => {
                let card = self.card_id(&card)?;
                self.engine.cards.reject_card_block_request(card)
            }
            ScenarioOp::Delete { card } => {
                let card = self.card_id(&card)?;
                self.engine.cards.delete_card(card)
            }
            ScenarioOp::Restore { card } => {
                let card = self.card_id(&card)?;
                self.engine.cards.restore_card(card)
            }
            ScenarioOp::DeleteOwner { owner } => {
                let owner = self.owner_id(&owner);
                self.engine.cards.delete_owner(owner)
            }
            ScenarioOp::RestoreOwner { owner } => {
                let owner = self.owner_id(&owner);
                self.engine.cards.restore_owner(owner)
            }
            ScenarioOp::SetLimit {
                card,
                op_type,
                daily,
                monthly,
            } => {
                let card = self.card_id(&card)?;
                self.engine
                    .cards
                    .set_card_limit(card, op_type, daily, monthly)?;
                Ok(())
            }
            ScenarioOp::Sweep => {
                self.engine.sweeper.run();
                Ok(())
            }
        }
    }

    /// Final card states, ordered by card alias
    pub fn card_states(&self) -> Vec<CardStateRow> {
        let mut rows: Vec<CardStateRow> = self
            .card_owners
            .iter()
            .filter_map(|(card_alias, owner_alias)| {
                let id = self.cards.get(card_alias)?;
                let card = self.engine.registry.snapshot(*id).ok()?;
                Some(CardStateRow {
                    card: card_alias.clone(),
                    owner: owner_alias.clone(),
                    status: card.status,
                    balance: card.balance,
                    deleted: card.deleted,
                    block_requested: card.block_requested,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.card.cmp(&b.card));
        rows
    }

    fn owner_id(&mut self, alias: &str) -> UserId {
        *self
            .owners
            .entry(alias.to_string())
            .or_insert_with(UserId::new)
    }

    fn card_id(&self, alias: &str) -> Result<CardId, LedgerError> {
        self.cards
            .get(alias)
            .copied()
            .ok_or_else(|| scenario_error(format!("unknown card alias '{}'", alias)))
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn scenario_error(message: String) -> LedgerError {
    LedgerError::Parse {
        line: None,
        message,
    }
}
