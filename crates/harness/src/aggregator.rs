//! Cross-run sample collection.

use std::collections::HashMap;

use common::IdentifierKind;
use serde::Serialize;
use strategy::Strategy;

use crate::run::RunReport;

/// Throughput figures for one run of one benchmark cell.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkSample {
    pub strategy: Strategy,
    pub identifier: IdentifierKind,
    pub avg_latency_nanos: u64,
    pub throughput_per_sec: u64,
}

impl BenchmarkSample {
    pub fn from_report(
        strategy: Strategy,
        identifier: IdentifierKind,
        report: &RunReport,
    ) -> Self {
        Self {
            strategy,
            identifier,
            avg_latency_nanos: report.avg_latency_nanos,
            throughput_per_sec: report.throughput_per_sec,
        }
    }
}

/// Collects samples keyed by benchmark cell.
///
/// An explicit instance owned by the caller. Append-only; readers get the
/// raw samples and compute their own statistics.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    samples: HashMap<(Strategy, IdentifierKind), Vec<BenchmarkSample>>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: BenchmarkSample) {
        self.samples
            .entry((sample.strategy, sample.identifier))
            .or_default()
            .push(sample);
    }

    /// Samples recorded for one cell, in insertion order.
    pub fn samples_for(&self, strategy: Strategy, identifier: IdentifierKind) -> &[BenchmarkSample] {
        self.samples
            .get(&(strategy, identifier))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of recorded samples across all cells.
    pub fn len(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
