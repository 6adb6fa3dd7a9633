//! Built-in discrepancy catalogs and catalog text parsing
//!
//! Two catalogs ship with the crate:
//! - the tool cases: five findings against the Manual ESD Button
//!   (`DS_HS0001`) that are exposed to the model as tools
//! - the field examples: further records from field reviews that are
//!   reference data only
//!
//! Both are embedded as text and go through [`crate::validation::validate`]
//! like any other candidate.

use serde_json::Value;

use crate::error::{RegistryError, Result};
use crate::record::DiscrepancyRecord;
use crate::validation::validate;

const TOOL_CASES: &str = include_str!("tool_cases.json");
const FIELD_EXAMPLES: &str = include_str!("field_examples.yaml");

/// Which embedded catalog to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCatalog {
    ToolCases,
    FieldExamples,
}

impl BuiltinCatalog {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinCatalog::ToolCases => "tool-cases",
            BuiltinCatalog::FieldExamples => "field-examples",
        }
    }

    /// Raw embedded text
    pub fn source(&self) -> &'static str {
        match self {
            BuiltinCatalog::ToolCases => TOOL_CASES,
            BuiltinCatalog::FieldExamples => FIELD_EXAMPLES,
        }
    }

    /// Parse and validate the embedded records
    pub fn records(&self) -> Result<Vec<DiscrepancyRecord>> {
        parse_catalog(self.source())
    }
}

/// Split catalog text into untyped candidate entries
///
/// Text starting with `[` or `{` is read as JSON, anything else as YAML. A
/// list yields its elements, an empty document yields nothing and any other
/// value is a single entry.
pub fn parse_document(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim_start();
    let document: Value = if trimmed.starts_with('[') || trimmed.starts_with('{') {
        serde_json::from_str(trimmed)
            .map_err(|e| RegistryError::CatalogParse(format!("JSON error: {}", e)))?
    } else {
        serde_yaml::from_str(text)
            .map_err(|e| RegistryError::CatalogParse(format!("YAML error: {}", e)))?
    };

    Ok(match document {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        single => vec![single],
    })
}

/// Parse catalog text holding one candidate record or a list of them
///
/// Every entry is validated; the first invalid entry aborts the parse.
pub fn parse_catalog(text: &str) -> Result<Vec<DiscrepancyRecord>> {
    parse_document(text)?
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            validate(entry).map_err(|e| {
                tracing::debug!(index, error = %e, "Rejected catalog entry");
                RegistryError::from(e)
            })
        })
        .collect()
}
