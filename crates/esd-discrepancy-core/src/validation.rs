//! Candidate record validation
//!
//! [`validate`] turns an untyped structured value (parsed JSON or YAML) into
//! an immutable [`DiscrepancyRecord`]. Checks run in a fixed order and stop
//! at the first violation:
//!
//! 1. `discrepancyType` is present and a member of [`DiscrepancyType`]
//! 2. `designCauseTag`, `designCauseDescription`, `effectTag(s)`,
//!    `effectDescription(s)` and `description` are non-empty strings
//! 3. `implementedCauseTags` and `implementedCauseDescriptions` have equal length
//! 4. `effectTags` and `effectDescriptions` have equal length
//!
//! Invalid input always fails closed; nothing is coerced.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::error::ValidationError;
use crate::record::{DiscrepancyRecord, DiscrepancyType};

const DISCREPANCY_TYPE: &str = "discrepancyType";
/// Misspelling found in legacy catalog files; accepted on input only
const DISCREPANCY_TYPE_LEGACY: &str = "discrpancyType";

type Result<T> = std::result::Result<T, ValidationError>;

/// Validate a candidate record
///
/// Accepts the nested `{description, parameters: {...}}` shape or a flat
/// object carrying the parameter fields beside `description`. Pure: the
/// same input always yields the same result.
pub fn validate(candidate: &Value) -> Result<DiscrepancyRecord> {
    let root = candidate.as_object();
    let params = match root.and_then(|o| o.get("parameters")) {
        Some(Value::Object(p)) => Some(p),
        Some(_) => None,
        None => root,
    };

    let discrepancy_type = read_discrepancy_type(params)?;

    let params = params.ok_or_else(|| ValidationError::missing_field("parameters"))?;
    let design_cause_tag = required_string(params, "designCauseTag")?;
    let design_cause_description = required_string(params, "designCauseDescription")?;
    let (effect_tags, effect_descriptions) = read_effects(params)?;
    let description = required_string(root.unwrap_or(params), "description")?;

    let implemented_cause_tags = optional_string_list(params, "implementedCauseTags")?;
    let implemented_cause_descriptions =
        optional_string_list(params, "implementedCauseDescriptions")?;
    check_arity(
        "implementedCauseTags",
        &implemented_cause_tags,
        "implementedCauseDescriptions",
        &implemented_cause_descriptions,
    )?;

    check_arity(
        "effectTags",
        &effect_tags,
        "effectDescriptions",
        &effect_descriptions,
    )?;

    let notes = optional_string(params, "notes")?.unwrap_or_default();
    let implemented_logic_description = optional_string(params, "implementedLogicDescription")?;

    Ok(DiscrepancyRecord {
        description,
        design_cause_tag,
        design_cause_description,
        implemented_cause_tags,
        implemented_cause_descriptions,
        implemented_logic_description,
        effect_tags,
        effect_descriptions,
        discrepancy_type,
        notes,
    })
}

fn read_discrepancy_type(params: Option<&Map<String, Value>>) -> Result<DiscrepancyType> {
    let raw = params.and_then(|p| {
        p.get(DISCREPANCY_TYPE)
            .or_else(|| p.get(DISCREPANCY_TYPE_LEGACY))
    });

    match raw {
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(ValidationError::UnknownDiscrepancyType {
            value: Some(other.to_string()),
        }),
        None => Err(ValidationError::UnknownDiscrepancyType { value: None }),
    }
}

/// Singular `effectTag`/`effectDescription` are normalized to one-element lists
fn read_effects(params: &Map<String, Value>) -> Result<(Vec<String>, Vec<String>)> {
    if params.contains_key("effectTags") {
        let tags = required_string_list(params, "effectTags")?;
        let descriptions = required_string_list(params, "effectDescriptions")?;
        Ok((tags, descriptions))
    } else {
        let tag = required_string(params, "effectTag")?;
        let description = required_string(params, "effectDescription")?;
        Ok((vec![tag], vec![description]))
    }
}

fn required_string(map: &Map<String, Value>, field: &str) -> Result<String> {
    match map.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(ValidationError::missing_field(field)),
    }
}

fn optional_string(map: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::wrong_type(field, "string")),
    }
}

/// Non-empty list of non-empty strings
fn required_string_list(map: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
    let items = match map.get(field) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) | None | Some(Value::Null) => {
            return Err(ValidationError::missing_field(field))
        }
        Some(_) => return Err(ValidationError::wrong_type(field, "array of strings")),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
            Value::String(_) => Err(ValidationError::missing_field(format!("{}[{}]", field, i))),
            _ => Err(ValidationError::wrong_type(format!("{}[{}]", field, i), "string")),
        })
        .collect()
}

/// Absent or null reads as empty
fn optional_string_list(map: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::wrong_type(format!("{}[{}]", field, i), "string"))
            })
            .collect(),
        Some(_) => Err(ValidationError::wrong_type(field, "array of strings")),
    }
}

fn check_arity(
    tags_field: &str,
    tags: &[String],
    descriptions_field: &str,
    descriptions: &[String],
) -> Result<()> {
    if tags.len() == descriptions.len() {
        Ok(())
    } else {
        Err(ValidationError::ArityMismatch {
            tags_field: tags_field.to_string(),
            tags_len: tags.len(),
            descriptions_field: descriptions_field.to_string(),
            descriptions_len: descriptions.len(),
        })
    }
}

/// Advisory note about a tag that breaks the naming convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagLint {
    /// Field holding the tag (e.g. `implementedCauseTags[1]`)
    pub field: String,
    pub tag: String,
    pub message: String,
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("static tag pattern"))
}

/// Flag tags that are not alphanumeric-with-underscores
///
/// The convention is not enforced by [`validate`]; this only reports.
pub fn lint_tags(record: &DiscrepancyRecord) -> Vec<TagLint> {
    let mut lints = Vec::new();
    let mut check = |field: String, tag: &str| {
        if !tag_pattern().is_match(tag) {
            lints.push(TagLint {
                field,
                tag: tag.to_string(),
                message: "tag should contain only letters, digits and underscores".to_string(),
            });
        }
    };

    check("designCauseTag".to_string(), record.design_cause_tag());
    for (i, tag) in record.implemented_cause_tags().iter().enumerate() {
        check(format!("implementedCauseTags[{}]", i), tag);
    }
    for (i, tag) in record.effect_tags().iter().enumerate() {
        check(format!("effectTags[{}]", i), tag);
    }

    lints
}
