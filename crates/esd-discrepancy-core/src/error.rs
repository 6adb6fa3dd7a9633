//! Error types for the discrepancy registry
//!
//! Every failure is deterministic and input-driven. Nothing here is retried
//! and nothing is logged-and-swallowed: callers receive the typed error and
//! decide how to surface it.

use thiserror::Error;

use crate::record::DiscrepancyType;

/// Structural problems with a candidate discrepancy record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent, empty, or not a string
    #[error("Missing field: {field}")]
    MissingField { field: String },

    /// `discrepancyType` is absent or not a member of the closed enumeration
    #[error("Unknown discrepancy type: {}", value.as_deref().unwrap_or("<absent>"))]
    UnknownDiscrepancyType { value: Option<String> },

    /// A tag list and its parallel description list differ in length
    #[error(
        "Arity mismatch: {tags_field} has {tags_len} entries but {descriptions_field} has {descriptions_len}"
    )]
    ArityMismatch {
        tags_field: String,
        tags_len: usize,
        descriptions_field: String,
        descriptions_len: usize,
    },

    /// A list field is present but holds something other than strings
    #[error("Wrong type for {field}: expected {expected}")]
    WrongType { field: String, expected: String },
}

impl ValidationError {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        ValidationError::MissingField {
            field: field.into(),
        }
    }

    /// Create a wrong type error
    pub fn wrong_type(field: impl Into<String>, expected: impl Into<String>) -> Self {
        ValidationError::WrongType {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Stable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "MISSING_FIELD",
            ValidationError::UnknownDiscrepancyType { .. } => "UNKNOWN_DISCREPANCY_TYPE",
            ValidationError::ArityMismatch { .. } => "ARITY_MISMATCH",
            ValidationError::WrongType { .. } => "WRONG_TYPE",
        }
    }
}

/// Main error type for registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Candidate record failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A record with the same identity is already cataloged
    #[error(
        "Duplicate record: {design_cause_tag} -> {} ({discrepancy_type})",
        effect_tags.join(", ")
    )]
    DuplicateRecord {
        design_cause_tag: String,
        effect_tags: Vec<String>,
        discrepancy_type: DiscrepancyType,
    },

    /// The classifier could not place the input into any known type
    #[error("Unclassified discrepancy for design cause '{design_cause_tag}'; manual review required")]
    UnclassifiedDiscrepancy { design_cause_tag: String },

    /// Catalog text could not be parsed as JSON or YAML
    #[error("Catalog parse error: {0}")]
    CatalogParse(String),
}

impl RegistryError {
    /// Stable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::Validation(e) => e.code(),
            RegistryError::DuplicateRecord { .. } => "DUPLICATE_RECORD",
            RegistryError::UnclassifiedDiscrepancy { .. } => "UNCLASSIFIED_DISCREPANCY",
            RegistryError::CatalogParse(_) => "CATALOG_PARSE_ERROR",
        }
    }

    /// Check if this error was caused by caller-supplied input
    pub fn is_user_error(&self) -> bool {
        !matches!(self, RegistryError::CatalogParse(_))
    }
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
