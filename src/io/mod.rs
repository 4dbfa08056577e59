//! Scenario I/O
//!
//! CSV handling for the replay binary:
//!
//! - [`csv_format`] - Record layout, record-to-operation conversion, and
//!   card-state output (pure, no I/O)
//! - [`reader`] - File reading and deserialization

pub mod csv_format;
pub mod reader;

pub use csv_format::{write_card_states, CardStateRow, ScenarioOp, ScenarioStep};
pub use reader::read_operations;
