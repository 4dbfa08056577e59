//! Command-line argument handling

pub mod args;

pub use args::CliArgs;

/// Parse process arguments into [`CliArgs`], exiting with usage on error
pub fn parse_args() -> CliArgs {
    use clap::Parser;
    CliArgs::parse()
}
