//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// Replay a card-operation scenario and print final card states
#[derive(Parser, Debug)]
#[command(name = "card-ledger")]
#[command(about = "Replay card operations and print final card states", long_about = None)]
pub struct CliArgs {
    /// Scenario CSV file with one operation per row
    #[arg(value_name = "INPUT", help = "Path to the scenario CSV file")]
    pub input_file: PathBuf,

    /// Abort on the first rejected operation instead of skipping it
    #[arg(long, help = "Stop at the first rejected operation")]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::lenient_default(&["card-ledger", "ops.csv"], false)]
    #[case::strict(&["card-ledger", "--strict", "ops.csv"], true)]
    fn test_strict_flag(#[case] args: &[&str], #[case] expected: bool) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strict, expected);
        assert_eq!(parsed.input_file, PathBuf::from("ops.csv"));
    }

    #[test]
    fn test_input_file_is_required() {
        assert!(CliArgs::try_parse_from(["card-ledger"]).is_err());
    }
}
