//! Command-line tools for ESD discrepancy catalogs

pub mod cli;

pub use cli::{run, CliError, Commands, DiscrepancyCli, ExitCode, OutputFormat};
