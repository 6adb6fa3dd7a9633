//! Discrepancy record data model
//!
//! A [`DiscrepancyRecord`] describes one documented mismatch between the
//! cause-and-effect logic an ESD design specifies and the logic the control
//! system actually implements. Records are immutable once validated; the
//! only way to obtain one is through [`crate::validation::validate`] (which
//! `Deserialize` delegates to).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Closed classification of discrepancy kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiscrepancyType {
    /// Implementation ANDs extra conditions onto the designed trigger
    AdditionalConditionsRequired,
    /// Implementation logic is deeper than the design
    MoreComplexLogic,
    /// Designed direct trigger reaches the effect only through an intermediate gate
    TriggerMediation,
    /// Designed trigger is absent from the implementation
    DirectTriggerMissing,
    /// Implementation contains a bypass or override the design never mentions
    UndocumentedBypassLogic,
    /// Implemented condition polarity is the inverse of the design
    LogicPolarityMismatch,
}

impl DiscrepancyType {
    /// Every member, in declaration order
    pub const ALL: [DiscrepancyType; 6] = [
        DiscrepancyType::AdditionalConditionsRequired,
        DiscrepancyType::MoreComplexLogic,
        DiscrepancyType::TriggerMediation,
        DiscrepancyType::DirectTriggerMissing,
        DiscrepancyType::UndocumentedBypassLogic,
        DiscrepancyType::LogicPolarityMismatch,
    ];

    /// Wire name (matches the serialized form)
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::AdditionalConditionsRequired => "AdditionalConditionsRequired",
            DiscrepancyType::MoreComplexLogic => "MoreComplexLogic",
            DiscrepancyType::TriggerMediation => "TriggerMediation",
            DiscrepancyType::DirectTriggerMissing => "DirectTriggerMissing",
            DiscrepancyType::UndocumentedBypassLogic => "UndocumentedBypassLogic",
            DiscrepancyType::LogicPolarityMismatch => "LogicPolarityMismatch",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            DiscrepancyType::AdditionalConditionsRequired => "Additional conditions required for a trigger",
            DiscrepancyType::MoreComplexLogic => "More complex logic in implementation",
            DiscrepancyType::TriggerMediation => "Trigger mediation in implementation",
            DiscrepancyType::DirectTriggerMissing => "Direct trigger missing in implementation",
            DiscrepancyType::UndocumentedBypassLogic => "Undocumented bypass logic",
            DiscrepancyType::LogicPolarityMismatch => "Logic polarity mismatch",
        }
    }
}

impl fmt::Display for DiscrepancyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscrepancyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscrepancyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownDiscrepancyType {
                value: Some(s.to_string()),
            })
    }
}

/// A validated design-vs-implementation discrepancy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscrepancyRecord {
    pub(crate) description: String,
    pub(crate) design_cause_tag: String,
    pub(crate) design_cause_description: String,
    pub(crate) implemented_cause_tags: Vec<String>,
    pub(crate) implemented_cause_descriptions: Vec<String>,
    pub(crate) implemented_logic_description: Option<String>,
    pub(crate) effect_tags: Vec<String>,
    pub(crate) effect_descriptions: Vec<String>,
    pub(crate) discrepancy_type: DiscrepancyType,
    pub(crate) notes: String,
}

impl DiscrepancyRecord {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn design_cause_tag(&self) -> &str {
        &self.design_cause_tag
    }

    pub fn design_cause_description(&self) -> &str {
        &self.design_cause_description
    }

    /// Conditions actually required at runtime; empty signals a missing trigger
    pub fn implemented_cause_tags(&self) -> &[String] {
        &self.implemented_cause_tags
    }

    pub fn implemented_cause_descriptions(&self) -> &[String] {
        &self.implemented_cause_descriptions
    }

    pub fn implemented_logic_description(&self) -> Option<&str> {
        self.implemented_logic_description.as_deref()
    }

    pub fn effect_tags(&self) -> &[String] {
        &self.effect_tags
    }

    pub fn effect_descriptions(&self) -> &[String] {
        &self.effect_descriptions
    }

    pub fn discrepancy_type(&self) -> DiscrepancyType {
        self.discrepancy_type
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Implemented causes paired with their descriptions
    pub fn implemented_causes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.implemented_cause_tags
            .iter()
            .zip(&self.implemented_cause_descriptions)
            .map(|(t, d)| (t.as_str(), d.as_str()))
    }

    /// Effects paired with their descriptions
    pub fn effects(&self) -> impl Iterator<Item = (&str, &str)> {
        self.effect_tags
            .iter()
            .zip(&self.effect_descriptions)
            .map(|(t, d)| (t.as_str(), d.as_str()))
    }

    /// Whether `tag` is one of this record's effect tags
    pub fn has_effect_tag(&self, tag: &str) -> bool {
        self.effect_tags.iter().any(|t| t == tag)
    }

    /// Identity used for duplicate detection
    ///
    /// Effect tags are compared as a set, matching `has_effect_tag`.
    pub fn key(&self) -> RecordKey {
        let mut effect_tags = self.effect_tags.clone();
        effect_tags.sort();
        effect_tags.dedup();
        RecordKey {
            design_cause_tag: self.design_cause_tag.clone(),
            effect_tags,
            discrepancy_type: self.discrepancy_type,
        }
    }
}

/// Identity of a cataloged record: design cause, sorted effect tags and type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub design_cause_tag: String,
    pub effect_tags: Vec<String>,
    pub discrepancy_type: DiscrepancyType,
}

#[derive(Serialize)]
struct RecordWire<'a> {
    description: &'a str,
    parameters: ParametersWire<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParametersWire<'a> {
    design_cause_tag: &'a str,
    design_cause_description: &'a str,
    implemented_cause_tags: &'a [String],
    implemented_cause_descriptions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    implemented_logic_description: Option<&'a str>,
    effect_tags: &'a [String],
    effect_descriptions: &'a [String],
    discrepancy_type: DiscrepancyType,
    notes: &'a str,
}

impl Serialize for DiscrepancyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordWire {
            description: &self.description,
            parameters: ParametersWire {
                design_cause_tag: &self.design_cause_tag,
                design_cause_description: &self.design_cause_description,
                implemented_cause_tags: &self.implemented_cause_tags,
                implemented_cause_descriptions: &self.implemented_cause_descriptions,
                implemented_logic_description: self.implemented_logic_description.as_deref(),
                effect_tags: &self.effect_tags,
                effect_descriptions: &self.effect_descriptions,
                discrepancy_type: self.discrepancy_type,
                notes: &self.notes,
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DiscrepancyRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::validation::validate(&value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&serde_json::Value> for DiscrepancyRecord {
    type Error = ValidationError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        crate::validation::validate(value)
    }
}
