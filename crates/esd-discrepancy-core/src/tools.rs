//! Structured-output tool schemas derived from cataloged records
//!
//! Each tool case becomes one tool the model may invoke. The record's fixed
//! values are pinned with JSON Schema `const`; the list fields carry the
//! cataloged values in their descriptions. Invoking a tool reports the
//! cataloged discrepancy through the registry's sinks.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::catalog::BuiltinCatalog;
use crate::error::Result;
use crate::record::DiscrepancyRecord;
use crate::registry::DiscrepancyRegistry;
use crate::sink::DiscrepancyReport;

/// A tool as advertised to the completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool arguments
    pub parameters: Value,
}

/// Tool invocation failures, returned to the model as a result payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::UnknownTool(_) => "UNKNOWN_TOOL",
            ToolError::InvalidArguments { .. } => "INVALID_ARGUMENTS",
        }
    }
}

/// Tool name for a record: its effect tags without the `c` control prefix
///
/// `cSDV0140` becomes `SDV0140`; `[cSOVX1, cSOVY1]` becomes `SOVX1_SOVY1`.
pub fn tool_name(record: &DiscrepancyRecord) -> String {
    record
        .effect_tags()
        .iter()
        .map(|tag| strip_control_prefix(tag))
        .collect::<Vec<_>>()
        .join("_")
}

fn strip_control_prefix(tag: &str) -> &str {
    match tag.strip_prefix('c') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest,
        _ => tag,
    }
}

fn bracketed(values: &[String]) -> String {
    format!("[{}]", values.join(", "))
}

/// Build the tool definition for one record
pub fn tool_definition(record: &DiscrepancyRecord) -> ToolDefinition {
    let mut properties = Map::new();
    properties.insert(
        "designCauseTag".to_string(),
        json!({ "type": "string", "const": record.design_cause_tag() }),
    );
    properties.insert(
        "designCauseDescription".to_string(),
        json!({ "type": "string", "const": record.design_cause_description() }),
    );
    properties.insert(
        "implementedCauseTags".to_string(),
        json!({
            "type": "array",
            "items": { "type": "string" },
            "description": format!(
                "Tags of causes actually required in implementation: {}",
                bracketed(record.implemented_cause_tags())
            ),
        }),
    );
    properties.insert(
        "implementedCauseDescriptions".to_string(),
        json!({
            "type": "array",
            "items": { "type": "string" },
            "description": format!(
                "Descriptions of causes actually required: {}",
                bracketed(record.implemented_cause_descriptions())
            ),
        }),
    );
    if let Some(logic) = record.implemented_logic_description() {
        properties.insert(
            "implementedLogicDescription".to_string(),
            json!({ "type": "string", "description": logic }),
        );
    }
    properties.insert(
        "effectTags".to_string(),
        json!({ "type": "array", "items": { "type": "string" }, "const": record.effect_tags() }),
    );
    properties.insert(
        "effectDescriptions".to_string(),
        json!({ "type": "array", "items": { "type": "string" }, "const": record.effect_descriptions() }),
    );
    properties.insert(
        "discrepancyType".to_string(),
        json!({ "type": "string", "const": record.discrepancy_type().as_str() }),
    );
    properties.insert(
        "notes".to_string(),
        json!({ "type": "string", "description": record.notes() }),
    );

    let required: Vec<Value> = properties.keys().cloned().map(Value::String).collect();

    ToolDefinition {
        name: tool_name(record),
        description: record.description().to_string(),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        }),
    }
}

/// The set of tools exposed to the model, keyed by tool name
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<(ToolDefinition, DiscrepancyRecord)>,
}

impl ToolSet {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = DiscrepancyRecord>,
    {
        let tools = records
            .into_iter()
            .map(|record| (tool_definition(&record), record))
            .collect();
        Self { tools }
    }

    /// Tools for the built-in tool cases
    pub fn builtin() -> Result<Self> {
        Ok(Self::from_records(BuiltinCatalog::ToolCases.records()?))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter().map(|(definition, _)| definition)
    }

    pub fn records(&self) -> impl Iterator<Item = &DiscrepancyRecord> {
        self.tools.iter().map(|(_, record)| record)
    }

    pub fn get(&self, name: &str) -> Option<&DiscrepancyRecord> {
        self.tools
            .iter()
            .find(|(definition, _)| definition.name == name)
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call: report the cataloged discrepancy
    ///
    /// `notes` supplied by the model become the report details; otherwise the
    /// cataloged notes are used. A `designCauseTag` argument that contradicts
    /// the pinned value is rejected.
    pub fn invoke(
        &self,
        registry: &DiscrepancyRegistry,
        name: &str,
        arguments: &Value,
    ) -> std::result::Result<DiscrepancyReport, ToolError> {
        let record = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => return Ok(registry.report(record, record.notes())),
            _ => {
                return Err(ToolError::InvalidArguments {
                    tool: name.to_string(),
                    message: "arguments must be an object".to_string(),
                })
            }
        };

        if let Some(tag) = args.get("designCauseTag").and_then(Value::as_str) {
            if tag != record.design_cause_tag() {
                return Err(ToolError::InvalidArguments {
                    tool: name.to_string(),
                    message: format!(
                        "designCauseTag must be {}, got {}",
                        record.design_cause_tag(),
                        tag
                    ),
                });
            }
        }

        let details = args
            .get("notes")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(record.notes());

        Ok(registry.report(record, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DiscrepancyType;
    use crate::sink::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_tool_names_match_effects() {
        let tools = ToolSet::builtin().unwrap();
        let names: Vec<_> = tools.definitions().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["SDV0140", "CHA0118", "UMSV0122", "SOVX1_SOVY1", "ESDV2047"]
        );
    }

    #[test]
    fn test_prefix_only_stripped_before_uppercase() {
        assert_eq!(strip_control_prefix("cSDV0140"), "SDV0140");
        assert_eq!(strip_control_prefix("coolant"), "coolant");
        assert_eq!(strip_control_prefix("MOS21"), "MOS21");
    }

    #[test]
    fn test_schema_pins_literals() {
        let tools = ToolSet::builtin().unwrap();
        let definition = tools.definitions().next().unwrap();
        let props = &definition.parameters["properties"];

        assert_eq!(props["designCauseTag"]["const"], "DS_HS0001");
        assert_eq!(props["effectTags"]["const"], json!(["cSDV0140"]));
        assert_eq!(props["discrepancyType"]["const"], "AdditionalConditionsRequired");
        assert_eq!(
            props["implementedCauseTags"]["description"],
            "Tags of causes actually required in implementation: [DS_HS0002, M_SS0]"
        );
        assert!(props.get("implementedLogicDescription").is_none());
        assert_eq!(definition.parameters["additionalProperties"], false);
    }

    #[test]
    fn test_mediation_schema_describes_logic() {
        let tools = ToolSet::builtin().unwrap();
        let record = tools.get("SOVX1_SOVY1").unwrap();
        let definition = tool_definition(record);
        assert!(definition.parameters["properties"]["implementedLogicDescription"]["description"]
            .as_str()
            .unwrap()
            .contains("OR"));
    }

    #[test]
    fn test_invoke_reports_through_sinks() {
        let sink = Arc::new(MemorySink::new());
        let registry = DiscrepancyRegistry::builtin(false).unwrap().with_sink(sink.clone());
        let tools = ToolSet::builtin().unwrap();

        let report = tools
            .invoke(
                &registry,
                "CHA0118",
                &json!({ "designCauseTag": "DS_HS0001", "notes": "four ANDed inputs" }),
            )
            .unwrap();

        assert_eq!(report.discrepancy, DiscrepancyType::MoreComplexLogic);
        assert_eq!(report.details, "four ANDed inputs");
        assert_eq!(sink.findings()[0].1, "four ANDed inputs");
    }

    #[test]
    fn test_invoke_defaults_to_cataloged_notes() {
        let registry = DiscrepancyRegistry::new();
        let tools = ToolSet::builtin().unwrap();
        let report = tools.invoke(&registry, "ESDV2047", &json!({})).unwrap();
        assert!(report.details.starts_with("Design implies a direct trigger"));
    }

    #[test]
    fn test_invoke_errors() {
        let registry = DiscrepancyRegistry::new();
        let tools = ToolSet::builtin().unwrap();

        assert_eq!(
            tools.invoke(&registry, "getWeather", &json!({})).unwrap_err().code(),
            "UNKNOWN_TOOL"
        );
        assert_eq!(
            tools
                .invoke(&registry, "SDV0140", &json!({ "designCauseTag": "DS_HS0002" }))
                .unwrap_err()
                .code(),
            "INVALID_ARGUMENTS"
        );
        assert!(tools.invoke(&registry, "SDV0140", &json!([1])).is_err());
    }
}
