//! Card Ledger CLI
//!
//! Replays a scenario of card operations through the ledger engine and
//! prints the final card states as CSV on stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- scenario.csv > states.csv
//! cargo run -- --strict scenario.csv > states.csv
//! ```
//!
//! By default, operations rejected by a business rule (insufficient funds,
//! limit exceeded, inactive card, ...) are logged and skipped so the
//! scenario can show the state after the rejection; `--strict` turns the
//! first rejection into a fatal error. Malformed scenario files are always
//! fatal.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (e.g. `RUST_LOG=card_ledger=info`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, malformed scenario, strict-mode rejection)

use card_ledger::cli;
use card_ledger::io::{read_operations, write_card_states};
use card_ledger::replay::ScenarioRunner;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let steps = match read_operations(&args.input_file) {
        Ok(steps) => steps,
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    };

    let mut runner = ScenarioRunner::new();
    if let Err(error) = runner.run(steps, args.strict) {
        eprintln!("Error: {}", error);
        process::exit(1);
    }

    let mut stdout = std::io::stdout();
    if let Err(error) = write_card_states(&mut stdout, &runner.card_states()) {
        eprintln!("Error: {}", error);
        process::exit(1);
    }
}
