//! Discrepancy reporting
//!
//! When a discrepancy is found (for example the model invokes one of the
//! catalog tools) the registry notifies every attached [`DiscrepancySink`].
//! How the finding was classified is irrelevant to the sinks; they receive
//! the cataloged record plus the caller's free-text details.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::record::{DiscrepancyRecord, DiscrepancyType};

/// Receiver for found discrepancies (alerting, review workflows, audit)
pub trait DiscrepancySink: Send + Sync {
    fn on_discrepancy_found(&self, record: &DiscrepancyRecord, details: &str);
}

/// Outcome handed back to whoever reported the discrepancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    pub status: String,
    pub discrepancy: DiscrepancyType,
    pub details: String,
}

impl DiscrepancyReport {
    pub fn reported(discrepancy: DiscrepancyType, details: impl Into<String>) -> Self {
        Self {
            status: "reported".to_string(),
            discrepancy,
            details: details.into(),
        }
    }
}

/// Logs every finding at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiscrepancySink for TracingSink {
    fn on_discrepancy_found(&self, record: &DiscrepancyRecord, details: &str) {
        tracing::warn!(
            design_cause_tag = %record.design_cause_tag(),
            effect_tags = %record.effect_tags().join(", "),
            discrepancy_type = %record.discrepancy_type(),
            implemented_triggers = %record.implemented_cause_tags().join(", "),
            details = %details,
            "Discrepancy found"
        );
    }
}

/// Keeps every finding in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    found: Mutex<Vec<(DiscrepancyRecord, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the findings received so far
    pub fn findings(&self) -> Vec<(DiscrepancyRecord, String)> {
        self.found
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.found.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiscrepancySink for MemorySink {
    fn on_discrepancy_found(&self, record: &DiscrepancyRecord, details: &str) {
        if let Ok(mut guard) = self.found.lock() {
            guard.push((record.clone(), details.to_string()));
        }
    }
}
