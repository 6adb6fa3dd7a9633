//! Advisory discrepancy classification
//!
//! The catalog records are hand-labeled. [`Classifier`] encodes the policy
//! those labels follow so that authoring tools can suggest a type for a new
//! finding. It never guesses: input that matches no rule is rejected with
//! [`RegistryError::UnclassifiedDiscrepancy`] for a human to decide.
//!
//! Rules are tried in order; the first match wins.
//!
//! | # | Shape | Type |
//! |---|-------|------|
//! | 1 | no implemented causes | `DirectTriggerMissing` |
//! | 2 | design cause plus extra causes, driving the effect directly | `AdditionalConditionsRequired` |
//! | 3 | design cause present but reaching the effect through a gate | `TriggerMediation` |
//! | 4 | implementation deeper than design by at least the threshold | `MoreComplexLogic` |
//! | 5 | undocumented bypass path | `UndocumentedBypassLogic` |
//! | 6 | inverted polarity | `LogicPolarityMismatch` |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{RegistryError, Result};
use crate::record::DiscrepancyType;

/// Facts about one design cause and its implemented counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationInput {
    pub design_cause_tag: String,
    #[serde(default)]
    pub implemented_cause_tags: Vec<String>,
    /// Design drives the effect straight from the cause
    #[serde(default = "default_true")]
    pub design_has_direct_effect: bool,
    /// Implementation drives the effect without an intermediate gate
    #[serde(default = "default_true")]
    pub implementation_has_direct_effect: bool,
    #[serde(default = "default_depth")]
    pub design_logic_depth: u32,
    #[serde(default = "default_depth")]
    pub implemented_logic_depth: u32,
    #[serde(default)]
    pub has_undocumented_bypass: bool,
    #[serde(default)]
    pub polarity_inverted: bool,
}

fn default_true() -> bool {
    true
}

fn default_depth() -> u32 {
    1
}

impl ClassificationInput {
    /// Input with direct effects on both sides and equal depth
    pub fn new<I, S>(design_cause_tag: impl Into<String>, implemented_cause_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            design_cause_tag: design_cause_tag.into(),
            implemented_cause_tags: implemented_cause_tags.into_iter().map(Into::into).collect(),
            design_has_direct_effect: true,
            implementation_has_direct_effect: true,
            design_logic_depth: 1,
            implemented_logic_depth: 1,
            has_undocumented_bypass: false,
            polarity_inverted: false,
        }
    }

    pub fn with_direct_effects(mut self, design: bool, implementation: bool) -> Self {
        self.design_has_direct_effect = design;
        self.implementation_has_direct_effect = implementation;
        self
    }

    pub fn with_logic_depths(mut self, design: u32, implemented: u32) -> Self {
        self.design_logic_depth = design;
        self.implemented_logic_depth = implemented;
        self
    }

    pub fn with_bypass(mut self, has_undocumented_bypass: bool) -> Self {
        self.has_undocumented_bypass = has_undocumented_bypass;
        self
    }

    pub fn with_polarity_inverted(mut self, polarity_inverted: bool) -> Self {
        self.polarity_inverted = polarity_inverted;
        self
    }
}

/// Classifier tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Extra logic layers at which an implementation counts as more complex
    #[serde(default = "default_depth")]
    pub extra_layers_threshold: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            extra_layers_threshold: 1,
        }
    }
}

/// Rule-based discrepancy classifier
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Suggest a discrepancy type for `input`
    pub fn classify(&self, input: &ClassificationInput) -> Result<DiscrepancyType> {
        let design = input.design_cause_tag.trim();
        if design.is_empty() {
            return Err(unclassified(input));
        }

        if input.implemented_cause_tags.is_empty() {
            return Ok(DiscrepancyType::DirectTriggerMissing);
        }

        let implemented: HashSet<&str> = input
            .implemented_cause_tags
            .iter()
            .map(|t| t.trim())
            .collect();
        let requires_design = implemented.contains(design);
        let has_extra = implemented.iter().any(|t| *t != design);

        if requires_design && has_extra && input.implementation_has_direct_effect {
            return Ok(DiscrepancyType::AdditionalConditionsRequired);
        }

        if requires_design
            && input.design_has_direct_effect
            && !input.implementation_has_direct_effect
        {
            return Ok(DiscrepancyType::TriggerMediation);
        }

        let extra_layers = input
            .implemented_logic_depth
            .saturating_sub(input.design_logic_depth);
        if extra_layers > 0 && extra_layers >= self.config.extra_layers_threshold {
            return Ok(DiscrepancyType::MoreComplexLogic);
        }

        if input.has_undocumented_bypass {
            return Ok(DiscrepancyType::UndocumentedBypassLogic);
        }

        if input.polarity_inverted {
            return Ok(DiscrepancyType::LogicPolarityMismatch);
        }

        Err(unclassified(input))
    }
}

fn unclassified(input: &ClassificationInput) -> RegistryError {
    RegistryError::UnclassifiedDiscrepancy {
        design_cause_tag: input.design_cause_tag.clone(),
    }
}

/// Classify with the default threshold
pub fn classify(input: &ClassificationInput) -> Result<DiscrepancyType> {
    Classifier::default().classify(input)
}
