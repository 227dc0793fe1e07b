//! Translation counters exposed on the metrics endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one running service. Shared through `Arc`, updated lock-free.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Translation requests that reached the oracle stage
    documents: AtomicUsize,

    /// Oracle calls made (one per target locale)
    oracle_calls: AtomicUsize,

    /// Oracle calls that failed after retries
    oracle_failures: AtomicUsize,

    /// Locale versions written to the store
    locales_translated: AtomicUsize,

    /// Field values sent for translation, summed over locales
    fields_translated: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_document(&self) {
        self.documents.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oracle_call(&self) {
        self.oracle_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oracle_failure(&self) {
        self.oracle_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one locale version persisted with `fields` translated values.
    pub fn record_locale(&self, fields: usize) {
        self.locales_translated.fetch_add(1, Ordering::Relaxed);
        self.fields_translated.fetch_add(fields, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let calls = self.oracle_calls.load(Ordering::Relaxed);
        let failures = self.oracle_failures.load(Ordering::Relaxed);
        let oracle_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            documents: self.documents.load(Ordering::Relaxed),
            oracle_calls: calls,
            oracle_failures: failures,
            oracle_success_rate,
            locales_translated: self.locales_translated.load(Ordering::Relaxed),
            fields_translated: self.fields_translated.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of [`TranslationMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub documents: usize,
    pub oracle_calls: usize,
    pub oracle_failures: usize,
    /// Percentage (0-100)
    pub oracle_success_rate: f64,
    pub locales_translated: usize,
    pub fields_translated: usize,
}
