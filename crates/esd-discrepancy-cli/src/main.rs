//! ESD discrepancy CLI
//!
//! ```bash
//! esd-discrepancy validate --file findings.yaml
//! esd-discrepancy query --cause DS_HS0001 --field-examples
//! esd-discrepancy classify --cause DS_HS0001 --implemented DS_HS0001,DS_HS0002 --format json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Validation failed, or the finding could not be classified
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 10: Internal error

use clap::Parser;
use colored::Colorize;
use esd_discrepancy_cli::{run, DiscrepancyCli};
use tracing::Level;

fn main() {
    let cli = DiscrepancyCli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = match run(cli, &mut out) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code.into());
}
