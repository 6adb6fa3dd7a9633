//! Discrepancy registry
//!
//! Owns the catalog of [`DiscrepancyRecord`]s and answers lookups by cause
//! tag, effect tag and discrepancy type. Lookups are pure and return records
//! in insertion order. The registry itself is single-owner; callers that
//! register at runtime from several tasks wrap it in one lock so duplicate
//! rejection stays consistent.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::{parse_catalog, BuiltinCatalog};
use crate::error::{RegistryError, Result};
use crate::record::{DiscrepancyRecord, DiscrepancyType, RecordKey};
use crate::sink::{DiscrepancyReport, DiscrepancySink};
use crate::validation::validate;

/// In-memory catalog of discrepancy records
#[derive(Default)]
pub struct DiscrepancyRegistry {
    records: Vec<DiscrepancyRecord>,
    keys: HashSet<RecordKey>,
    sinks: Vec<Arc<dyn DiscrepancySink>>,
}

impl DiscrepancyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry loaded with the built-in tool cases and, optionally,
    /// the field examples
    pub fn builtin(include_field_examples: bool) -> Result<Self> {
        let mut registry = Self::new();
        registry.load_builtin(BuiltinCatalog::ToolCases)?;
        if include_field_examples {
            registry.load_builtin(BuiltinCatalog::FieldExamples)?;
        }
        Ok(registry)
    }

    /// Attach a sink notified by [`DiscrepancyRegistry::report`]
    pub fn with_sink(mut self, sink: Arc<dyn DiscrepancySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Arc<dyn DiscrepancySink>) {
        self.sinks.push(sink);
    }

    /// Append a validated record
    ///
    /// Fails with [`RegistryError::DuplicateRecord`] if a record with the
    /// same design cause, effect tags and type is already cataloged.
    pub fn register(&mut self, record: DiscrepancyRecord) -> Result<()> {
        let key = record.key();
        if self.keys.contains(&key) {
            return Err(RegistryError::DuplicateRecord {
                design_cause_tag: key.design_cause_tag,
                effect_tags: key.effect_tags,
                discrepancy_type: key.discrepancy_type,
            });
        }

        tracing::debug!(
            design_cause_tag = %record.design_cause_tag(),
            discrepancy_type = %record.discrepancy_type(),
            "Registered discrepancy record"
        );
        self.keys.insert(key);
        self.records.push(record);
        Ok(())
    }

    /// Validate an untyped candidate and register it
    pub fn register_candidate(&mut self, candidate: &Value) -> Result<&DiscrepancyRecord> {
        let record = validate(candidate)?;
        self.register(record)?;
        Ok(&self.records[self.records.len() - 1])
    }

    /// Register every record in catalog text; returns how many were added
    ///
    /// Stops at the first invalid or duplicate entry. Entries before it stay
    /// registered.
    pub fn load_catalog_str(&mut self, text: &str) -> Result<usize> {
        let records = parse_catalog(text)?;
        let count = records.len();
        for record in records {
            self.register(record)?;
        }
        Ok(count)
    }

    pub fn load_builtin(&mut self, catalog: BuiltinCatalog) -> Result<usize> {
        let count = self.load_catalog_str(catalog.source())?;
        tracing::info!(catalog = catalog.name(), count, "Loaded built-in catalog");
        Ok(count)
    }

    /// Records whose design cause tag equals `tag`
    pub fn find_by_cause_tag(&self, tag: &str) -> Vec<&DiscrepancyRecord> {
        self.records
            .iter()
            .filter(|r| r.design_cause_tag() == tag)
            .collect()
    }

    /// Records that list `tag` among their effect tags
    pub fn find_by_effect_tag(&self, tag: &str) -> Vec<&DiscrepancyRecord> {
        self.records.iter().filter(|r| r.has_effect_tag(tag)).collect()
    }

    pub fn find_by_type(&self, discrepancy_type: DiscrepancyType) -> Vec<&DiscrepancyRecord> {
        self.records
            .iter()
            .filter(|r| r.discrepancy_type() == discrepancy_type)
            .collect()
    }

    /// All records in insertion order
    pub fn records(&self) -> &[DiscrepancyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Notify every sink that `record` was found and build the report
    pub fn report(&self, record: &DiscrepancyRecord, details: &str) -> DiscrepancyReport {
        for sink in &self.sinks {
            sink.on_discrepancy_found(record, details);
        }
        DiscrepancyReport::reported(record.discrepancy_type(), details)
    }
}
