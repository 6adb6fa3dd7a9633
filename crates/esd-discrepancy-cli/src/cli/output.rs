//! Output formatting: colored tables for people, JSON and YAML for tools

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use esd_discrepancy_core::{DiscrepancyRecord, DiscrepancyType, ToolDefinition};

use super::commands::FileReport;
use super::CliError;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    Json,
    Yaml,
}

/// Write `value` as JSON or YAML, or through `table` for the table format
pub fn render<T, F>(
    value: &T,
    format: OutputFormat,
    out: &mut dyn Write,
    table: F,
) -> Result<(), CliError>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T, &mut dyn Write) -> io::Result<()>,
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| CliError::Serialization(e.to_string()))?;
            writeln!(out, "{}", json)?;
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value)
                .map_err(|e| CliError::Serialization(e.to_string()))?;
            write!(out, "{}", yaml)?;
        }
        OutputFormat::Table => table(value, out)?,
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn type_colored(t: DiscrepancyType) -> colored::ColoredString {
    match t {
        DiscrepancyType::DirectTriggerMissing | DiscrepancyType::UndocumentedBypassLogic => {
            t.as_str().red()
        }
        DiscrepancyType::LogicPolarityMismatch => t.as_str().magenta(),
        _ => t.as_str().yellow(),
    }
}

pub fn records_table(records: &[&DiscrepancyRecord], out: &mut dyn Write) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "{}", "No matching records".dimmed());
    }

    writeln!(
        out,
        "{:<14} {:<22} {:<30} {}",
        "CAUSE".bold(),
        "EFFECTS".bold(),
        "TYPE".bold(),
        "DESCRIPTION".bold()
    )?;
    for record in records {
        writeln!(
            out,
            "{:<14} {:<22} {:<30} {}",
            record.design_cause_tag(),
            truncate(&record.effect_tags().join(","), 22),
            type_colored(record.discrepancy_type()),
            truncate(record.description(), 60)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{} record(s)", records.len())
}

pub fn tools_table(tools: &[&ToolDefinition], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{:<14} {}", "TOOL".bold(), "DESCRIPTION".bold())?;
    for tool in tools {
        writeln!(out, "{:<14} {}", tool.name.cyan(), truncate(&tool.description, 80))?;
    }
    Ok(())
}

pub fn file_report_table(report: &FileReport, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{} {}", "File:".bold(), report.file)?;
    for entry in &report.entries {
        if entry.valid {
            writeln!(
                out,
                "  {} [{}] {} ({})",
                "OK".green(),
                entry.index,
                entry.design_cause_tag.as_deref().unwrap_or_default(),
                entry
                    .discrepancy_type
                    .map(|t| t.as_str())
                    .unwrap_or_default()
            )?;
        } else {
            writeln!(
                out,
                "  {} [{}] {}: {}",
                "ERROR".red().bold(),
                entry.index,
                entry.code.as_deref().unwrap_or_default(),
                entry.message.as_deref().unwrap_or_default()
            )?;
        }
        for lint in &entry.lints {
            writeln!(
                out,
                "    {} {} '{}': {}",
                "WARN".yellow(),
                lint.field,
                lint.tag,
                lint.message
            )?;
        }
    }

    let failed = report.entries.iter().filter(|e| !e.valid).count();
    writeln!(out)?;
    if failed == 0 {
        writeln!(
            out,
            "{}",
            format!("All {} record(s) valid", report.entries.len()).green()
        )
    } else {
        writeln!(
            out,
            "{}",
            format!("{} of {} record(s) invalid", failed, report.entries.len()).red()
        )
    }
}

pub fn classification_line(
    discrepancy_type: DiscrepancyType,
    label: &str,
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(out, "{} ({})", type_colored(discrepancy_type), label)
}

pub fn warning_line(message: &str, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{} {}", "WARN".yellow().bold(), message)
}
