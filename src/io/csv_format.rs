//! CSV format handling for scenario files and card-state output
//!
//! A scenario file is a CSV with one operation per row:
//!
//! ```csv
//! op,owner,card,to_card,amount,number,expires,op_type,daily,monthly,description,at
//! create,alice,c1,,500.00,4111111111111111,2030-12-31,,,,,
//! withdraw,alice,c1,,60.00,,,,,,,2024-06-15T10:00:00
//! sweep,,,,,,,,,,,
//! ```
//!
//! Cards and owners are referred to by scenario-local aliases; the runner
//! maps them to real ids. The optional `at` column moves the replay clock
//! before the operation runs, which makes limit windows and expiration
//! deterministic.
//!
//! All functions here are pure (no I/O) for easy testing.

use crate::types::{CardStatus, LedgerError, OperationType};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// One raw scenario row as deserialized from CSV
///
/// Every column except `op` is optional; which ones are required depends
/// on the operation and is enforced by [`convert_record`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OperationRecord {
    pub op: String,
    pub owner: Option<String>,
    pub card: Option<String>,
    pub to_card: Option<String>,
    pub amount: Option<String>,
    pub number: Option<String>,
    pub expires: Option<String>,
    pub op_type: Option<String>,
    pub daily: Option<String>,
    pub monthly: Option<String>,
    pub description: Option<String>,
    pub at: Option<String>,
}

/// One operation against the engine, with aliases still unresolved
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOp {
    Create {
        owner: String,
        card: String,
        number: String,
        balance: Decimal,
        expires: NaiveDate,
    },
    Deposit {
        owner: String,
        card: String,
        amount: Decimal,
        description: Option<String>,
    },
    Withdraw {
        owner: String,
        card: String,
        amount: Decimal,
        description: Option<String>,
    },
    Transfer {
        owner: String,
        card: String,
        to_card: String,
        amount: Decimal,
        description: Option<String>,
    },
    Block {
        card: String,
    },
    Activate {
        card: String,
    },
    RequestBlock {
        owner: String,
        card: String,
    },
    RejectBlock {
        card: String,
    },
    Delete {
        card: String,
    },
    Restore {
        card: String,
    },
    DeleteOwner {
        owner: String,
    },
    RestoreOwner {
        owner: String,
    },
    SetLimit {
        card: String,
        op_type: OperationType,
        daily: Decimal,
        monthly: Decimal,
    },
    Sweep,
}

/// A scenario operation plus the optional clock position it runs at
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioStep {
    pub at: Option<NaiveDateTime>,
    pub op: ScenarioOp,
}

/// Convert a raw record into a scenario step
///
/// Validates that the columns required by the operation are present and
/// parse; unknown operations and malformed values are reported with the
/// offending content.
pub fn convert_record(record: OperationRecord) -> Result<ScenarioStep, String> {
    let at = match record.at.as_deref() {
        Some(text) => Some(parse_datetime(text)?),
        None => None,
    };

    let op = match record.op.to_lowercase().as_str() {
        "create" => ScenarioOp::Create {
            owner: require(record.owner, "owner", "create")?,
            card: require(record.card, "card", "create")?,
            number: require(record.number, "number", "create")?,
            balance: parse_amount(&require(record.amount, "amount", "create")?)?,
            expires: parse_date(&require(record.expires, "expires", "create")?)?,
        },
        "deposit" => ScenarioOp::Deposit {
            owner: require(record.owner, "owner", "deposit")?,
            card: require(record.card, "card", "deposit")?,
            amount: parse_amount(&require(record.amount, "amount", "deposit")?)?,
            description: record.description,
        },
        "withdraw" => ScenarioOp::Withdraw {
            owner: require(record.owner, "owner", "withdraw")?,
            card: require(record.card, "card", "withdraw")?,
            amount: parse_amount(&require(record.amount, "amount", "withdraw")?)?,
            description: record.description,
        },
        "transfer" => ScenarioOp::Transfer {
            owner: require(record.owner, "owner", "transfer")?,
            card: require(record.card, "card", "transfer")?,
            to_card: require(record.to_card, "to_card", "transfer")?,
            amount: parse_amount(&require(record.amount, "amount", "transfer")?)?,
            description: record.description,
        },
        "block" => ScenarioOp::Block {
            card: require(record.card, "card", "block")?,
        },
        "activate" => ScenarioOp::Activate {
            card: require(record.card, "card", "activate")?,
        },
        "request_block" => ScenarioOp::RequestBlock {
            owner: require(record.owner, "owner", "request_block")?,
            card: require(record.card, "card", "request_block")?,
        },
        "reject_block" => ScenarioOp::RejectBlock {
            card: require(record.card, "card", "reject_block")?,
        },
        "delete" => ScenarioOp::Delete {
            card: require(record.card, "card", "delete")?,
        },
        "restore" => ScenarioOp::Restore {
            card: require(record.card, "card", "restore")?,
        },
        "delete_owner" => ScenarioOp::DeleteOwner {
            owner: require(record.owner, "owner", "delete_owner")?,
        },
        "restore_owner" => ScenarioOp::RestoreOwner {
            owner: require(record.owner, "owner", "restore_owner")?,
        },
        "set_limit" => ScenarioOp::SetLimit {
            card: require(record.card, "card", "set_limit")?,
            op_type: parse_operation_type(&require(record.op_type, "op_type", "set_limit")?)?,
            daily: parse_amount(&require(record.daily, "daily", "set_limit")?)?,
            monthly: parse_amount(&require(record.monthly, "monthly", "set_limit")?)?,
        },
        "sweep" => ScenarioOp::Sweep,
        other => return Err(format!("Unknown operation '{}'", other)),
    };

    Ok(ScenarioStep { at, op })
}

fn require(value: Option<String>, column: &str, op: &str) -> Result<String, String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(format!("'{}' requires the '{}' column", op, column)),
    }
}

fn parse_amount(text: &str) -> Result<Decimal, String> {
    Decimal::from_str(text.trim()).map_err(|_| format!("Invalid amount '{}'", text))
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", text))
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| format!("Invalid timestamp '{}', expected YYYY-MM-DDTHH:MM:SS", text))
}

fn parse_operation_type(text: &str) -> Result<OperationType, String> {
    match text.trim().to_uppercase().as_str() {
        "WITHDRAWAL" => Ok(OperationType::Withdrawal),
        "DEPOSIT" => Ok(OperationType::Deposit),
        "TRANSFER" => Ok(OperationType::Transfer),
        other => Err(format!("Invalid operation type '{}'", other)),
    }
}

/// Final state of one scenario card, keyed by its alias
#[derive(Debug, Clone, PartialEq)]
pub struct CardStateRow {
    pub card: String,
    pub owner: String,
    pub status: CardStatus,
    pub balance: Decimal,
    pub deleted: bool,
    pub block_requested: bool,
}

/// Write final card states as CSV
///
/// Balances are printed with two decimal places so output is stable
/// regardless of the scales that arithmetic produced along the way.
pub fn write_card_states<W: Write>(
    writer: W,
    rows: &[CardStateRow],
) -> Result<(), LedgerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["card", "owner", "status", "balance", "deleted", "block_requested"])?;
    for row in rows {
        csv_writer.write_record(&[
            row.card.clone(),
            row.owner.clone(),
            row.status.to_string(),
            format!("{:.2}", row.balance),
            row.deleted.to_string(),
            row.block_requested.to_string(),
        ])?;
    }
    csv_writer.flush().map_err(LedgerError::from)?;
    Ok(())
}
