//! ESD Discrepancy Core
//!
//! Schema, validation, registry and classification for discrepancies between
//! an Emergency Shutdown system's designed cause-and-effect logic and the
//! logic its control system actually implements.
//!
//! ## Architecture
//!
//! 1. **Record** (`record`): the immutable [`DiscrepancyRecord`] and the closed
//!    [`DiscrepancyType`] enumeration.
//! 2. **Validation** (`validation`): fail-fast checks turning untyped JSON/YAML
//!    into records.
//! 3. **Registry** (`registry`): the in-memory catalog with duplicate
//!    rejection and lookups by cause tag, effect tag and type.
//! 4. **Classifier** (`classify`): advisory rules suggesting a type for a new
//!    finding.
//! 5. **Catalog** (`catalog`): the embedded tool cases and field examples.
//! 6. **Tools** (`tools`) and **prompt** (`prompt`): what the completion
//!    service sees.
//! 7. **Sinks** (`sink`): where found discrepancies are reported.
//!
//! ## Example
//!
//! ```rust
//! use esd_discrepancy_core::{DiscrepancyRegistry, DiscrepancyType};
//!
//! let registry = DiscrepancyRegistry::builtin(true).unwrap();
//! let mediated = registry.find_by_type(DiscrepancyType::TriggerMediation);
//! assert_eq!(mediated.len(), 2);
//! ```

pub mod catalog;
pub mod classify;
pub mod error;
pub mod prompt;
pub mod record;
pub mod registry;
pub mod sink;
pub mod tools;
pub mod validation;

pub use catalog::{parse_catalog, parse_document, BuiltinCatalog};
pub use classify::{classify, ClassificationInput, Classifier, ClassifierConfig};
pub use error::{RegistryError, Result, ValidationError};
pub use prompt::system_prompt;
pub use record::{DiscrepancyRecord, DiscrepancyType, RecordKey};
pub use registry::DiscrepancyRegistry;
pub use sink::{DiscrepancyReport, DiscrepancySink, MemorySink, TracingSink};
pub use tools::{tool_definition, tool_name, ToolDefinition, ToolError, ToolSet};
pub use validation::{lint_tags, validate, TagLint};
