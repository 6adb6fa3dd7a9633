//! CLI for ESD discrepancy catalogs
//!
//! Validate candidate record files, query the built-in catalog, classify
//! new findings and print what the chat model is given (tool schemas and
//! the system prompt).

pub mod commands;
pub mod output;

pub use commands::{Commands, DiscrepancyCli};
pub use output::OutputFormat;

use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use esd_discrepancy_core::RegistryError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Candidate records failed validation, or input could not be classified
    ValidationError = 1,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Errors that abort a command
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::File { .. } => ExitCode::FileError,
            CliError::InvalidInput(_) => ExitCode::InvalidInput,
            CliError::Registry(RegistryError::CatalogParse(_)) => ExitCode::InvalidInput,
            CliError::Registry(_) | CliError::Serialization(_) | CliError::Output(_) => {
                ExitCode::InternalError
            }
        }
    }
}

/// Run a parsed command, writing results to `out`
pub fn run(cli: DiscrepancyCli, out: &mut dyn Write) -> Result<ExitCode, CliError> {
    let format = cli.format;
    match cli.command {
        Commands::Validate { file } => commands::execute_validate(&file, format, out),
        Commands::List { field_examples } => commands::execute_list(field_examples, format, out),
        Commands::Query {
            cause,
            effect,
            discrepancy_type,
            field_examples,
        } => commands::execute_query(
            cause.as_deref(),
            effect.as_deref(),
            discrepancy_type.as_deref(),
            field_examples,
            format,
            out,
        ),
        Commands::Classify(args) => commands::execute_classify(args, format, out),
        Commands::Tools => commands::execute_tools(format, out),
        Commands::Prompt => commands::execute_prompt(out),
    }
}
