//! Prometheus metrics for the discrepancy service
//!
//! - `esd_chat_requests_total` (counter) - chat turns by result
//! - `esd_discrepancies_reported_total` (counter) - reports by discrepancy type
//! - `esd_validation_failures_total` (counter) - rejected candidates by error code
//! - `esd_registered_records` (gauge) - records in the registry
//!
//! [`ApiMetrics`] is also a [`DiscrepancySink`], so attaching it to the
//! registry counts every report regardless of who triggered it.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use esd_discrepancy_core::{DiscrepancyRecord, DiscrepancySink};

pub struct ApiMetrics {
    registry: Registry,
    chat_requests_total: IntCounterVec,
    discrepancies_reported_total: IntCounterVec,
    validation_failures_total: IntCounterVec,
    registered_records: IntGauge,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let chat_requests_total = IntCounterVec::new(
            Opts::new("esd_chat_requests_total", "Chat requests by result"),
            &["result"],
        )?;
        let discrepancies_reported_total = IntCounterVec::new(
            Opts::new(
                "esd_discrepancies_reported_total",
                "Discrepancies reported by type",
            ),
            &["discrepancy_type"],
        )?;
        let validation_failures_total = IntCounterVec::new(
            Opts::new(
                "esd_validation_failures_total",
                "Rejected candidate records by error code",
            ),
            &["code"],
        )?;
        let registered_records =
            IntGauge::new("esd_registered_records", "Records in the discrepancy registry")?;

        registry.register(Box::new(chat_requests_total.clone()))?;
        registry.register(Box::new(discrepancies_reported_total.clone()))?;
        registry.register(Box::new(validation_failures_total.clone()))?;
        registry.register(Box::new(registered_records.clone()))?;

        Ok(Self {
            registry,
            chat_requests_total,
            discrepancies_reported_total,
            validation_failures_total,
            registered_records,
        })
    }

    pub fn record_chat(&self, result: &str) {
        self.chat_requests_total.with_label_values(&[result]).inc();
    }

    pub fn record_validation_failure(&self, code: &str) {
        self.validation_failures_total
            .with_label_values(&[code])
            .inc();
    }

    pub fn set_record_count(&self, count: usize) {
        self.registered_records.set(count as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl DiscrepancySink for ApiMetrics {
    fn on_discrepancy_found(&self, record: &DiscrepancyRecord, _details: &str) {
        self.discrepancies_reported_total
            .with_label_values(&[record.discrepancy_type().as_str()])
            .inc();
    }
}
