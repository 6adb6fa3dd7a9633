//! Command definitions and execution

use clap::{ArgGroup, Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use esd_discrepancy_core::{
    lint_tags, parse_document, system_prompt, validate, ClassificationInput, Classifier,
    ClassifierConfig, DiscrepancyRecord, DiscrepancyRegistry, DiscrepancyType, RegistryError,
    TagLint, ToolSet,
};

use super::output::{self, OutputFormat};
use super::{CliError, ExitCode};

/// ESD discrepancy catalog tools
#[derive(Parser, Debug)]
#[command(name = "esd-discrepancy")]
#[command(about = "Validate, query and classify ESD cause-and-effect discrepancies", long_about = None)]
#[command(version)]
pub struct DiscrepancyCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a JSON or YAML file of candidate records
    ///
    /// Every entry is checked; duplicates within the file are reported.
    Validate {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the built-in catalog
    List {
        /// Include the field example records
        #[arg(long)]
        field_examples: bool,
    },

    /// Look up records by cause tag, effect tag or type
    #[command(group(ArgGroup::new("filter").required(true).args(["cause", "effect", "discrepancy_type"])))]
    Query {
        #[arg(long)]
        cause: Option<String>,

        #[arg(long)]
        effect: Option<String>,

        #[arg(long = "type")]
        discrepancy_type: Option<String>,

        #[arg(long)]
        field_examples: bool,
    },

    /// Suggest a discrepancy type for a new finding
    Classify(ClassifyArgs),

    /// Print the tool schemas derived from the tool cases
    Tools,

    /// Print the system prompt given to the chat model
    Prompt,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Design cause tag
    #[arg(long)]
    pub cause: String,

    /// Cause tags the implementation actually requires (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub implemented: Vec<String>,

    /// The design reaches the effect through intermediate logic
    #[arg(long)]
    pub design_indirect: bool,

    /// The implementation reaches the effect through an intermediate gate
    #[arg(long)]
    pub mediated: bool,

    #[arg(long, default_value_t = 1)]
    pub design_depth: u32,

    #[arg(long, default_value_t = 1)]
    pub implemented_depth: u32,

    /// The implementation has a bypass path absent from the design
    #[arg(long)]
    pub bypass: bool,

    /// Trip condition polarity is inverted
    #[arg(long)]
    pub polarity_inverted: bool,

    /// Extra logic layers that count as more complex
    #[arg(long, default_value_t = 1)]
    pub threshold: u32,
}

impl ClassifyArgs {
    fn input(&self) -> ClassificationInput {
        ClassificationInput::new(self.cause.clone(), self.implemented.iter().cloned())
            .with_direct_effects(!self.design_indirect, !self.mediated)
            .with_logic_depths(self.design_depth, self.implemented_depth)
            .with_bypass(self.bypass)
            .with_polarity_inverted(self.polarity_inverted)
    }
}

/// Result for one entry of a validated file
#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub index: usize,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_cause_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discrepancy_type: Option<DiscrepancyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lints: Vec<TagLint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub valid: bool,
    pub entries: Vec<EntryReport>,
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate every entry of a candidate file
pub fn execute_validate(
    file: &Path,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode, CliError> {
    let text = read_file(file)?;
    let entries = parse_document(&text)?;
    tracing::debug!(file = %file.display(), entries = entries.len(), "Validating candidates");

    let mut seen = DiscrepancyRegistry::new();
    let reports: Vec<EntryReport> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let checked = validate(entry)
                .map_err(RegistryError::from)
                .and_then(|record| {
                    let lints = lint_tags(&record);
                    let tag = record.design_cause_tag().to_string();
                    let discrepancy_type = record.discrepancy_type();
                    seen.register(record).map(|()| (tag, discrepancy_type, lints))
                });

            match checked {
                Ok((tag, discrepancy_type, lints)) => EntryReport {
                    index,
                    valid: true,
                    design_cause_tag: Some(tag),
                    discrepancy_type: Some(discrepancy_type),
                    code: None,
                    message: None,
                    lints,
                },
                Err(e) => EntryReport {
                    index,
                    valid: false,
                    design_cause_tag: None,
                    discrepancy_type: None,
                    code: Some(e.code().to_string()),
                    message: Some(e.to_string()),
                    lints: Vec::new(),
                },
            }
        })
        .collect();

    let report = FileReport {
        file: file.display().to_string(),
        valid: reports.iter().all(|r| r.valid),
        entries: reports,
    };
    output::render(&report, format, out, output::file_report_table)?;

    Ok(if report.valid {
        ExitCode::Success
    } else {
        ExitCode::ValidationError
    })
}

pub fn execute_list(
    field_examples: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode, CliError> {
    let registry = DiscrepancyRegistry::builtin(field_examples)?;
    let records: Vec<&DiscrepancyRecord> = registry.records().iter().collect();
    output::render(records.as_slice(), format, out, output::records_table)?;
    Ok(ExitCode::Success)
}

pub fn execute_query(
    cause: Option<&str>,
    effect: Option<&str>,
    discrepancy_type: Option<&str>,
    field_examples: bool,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode, CliError> {
    let registry = DiscrepancyRegistry::builtin(field_examples)?;

    let records = match (cause, effect, discrepancy_type) {
        (Some(tag), _, _) => registry.find_by_cause_tag(tag),
        (_, Some(tag), _) => registry.find_by_effect_tag(tag),
        (_, _, Some(name)) => {
            let t: DiscrepancyType = name
                .parse()
                .map_err(|e: esd_discrepancy_core::ValidationError| {
                    CliError::InvalidInput(e.to_string())
                })?;
            registry.find_by_type(t)
        }
        (None, None, None) => {
            return Err(CliError::InvalidInput(
                "one of --cause, --effect or --type is required".to_string(),
            ))
        }
    };

    output::render(records.as_slice(), format, out, output::records_table)?;
    Ok(ExitCode::Success)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Classification {
    discrepancy_type: DiscrepancyType,
    label: &'static str,
}

pub fn execute_classify(
    args: ClassifyArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<ExitCode, CliError> {
    let classifier = Classifier::new(ClassifierConfig {
        extra_layers_threshold: args.threshold,
    });

    match classifier.classify(&args.input()) {
        Ok(discrepancy_type) => {
            let result = Classification {
                discrepancy_type,
                label: discrepancy_type.label(),
            };
            output::render(&result, format, out, |r, out| {
                output::classification_line(r.discrepancy_type, r.label, out)
            })?;
            Ok(ExitCode::Success)
        }
        Err(e @ RegistryError::UnclassifiedDiscrepancy { .. }) => {
            output::warning_line(&e.to_string(), out)?;
            Ok(ExitCode::ValidationError)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn execute_tools(format: OutputFormat, out: &mut dyn Write) -> Result<ExitCode, CliError> {
    let tools = ToolSet::builtin()?;
    let definitions: Vec<_> = tools.definitions().collect();
    output::render(definitions.as_slice(), format, out, output::tools_table)?;
    Ok(ExitCode::Success)
}

pub fn execute_prompt(out: &mut dyn Write) -> Result<ExitCode, CliError> {
    let tools = ToolSet::builtin()?;
    write!(out, "{}", system_prompt(tools.records()))?;
    Ok(ExitCode::Success)
}
