//! Observability and Metrics
//!
//! Atomic counters for codec activity. A `CodecMetrics` instance is shared
//! through an `Arc` by any number of readers and writers; nothing here is
//! process-wide.

use crate::error::{CodecError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Counters for read and write operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Read operations started
    pub reads_total: AtomicU64,
    /// Write operations started
    pub writes_total: AtomicU64,
    /// Operations that returned an error
    pub failures_total: AtomicU64,
    /// Operations abandoned because of cancellation
    pub cancellations: AtomicU64,
    /// Operations that hit a finished source or sink
    pub end_of_input: AtomicU64,
    /// Bytes handed to sinks
    pub bytes_written: AtomicU64,
    /// Flushes issued to sinks
    pub flushes: AtomicU64,
    /// Sink completions observed
    pub sink_completions: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            reads_total: AtomicU64::new(0),
            writes_total: AtomicU64::new(0),
            failures_total: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            end_of_input: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            sink_completions: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a read attempt and its outcome
    pub fn record_read<T>(&self, result: &Result<T>) {
        self.reads_total.fetch_add(1, Ordering::Relaxed);
        self.record_outcome(result);
    }

    /// Record a write attempt and its outcome
    pub fn record_write<T>(&self, result: &Result<T>) {
        self.writes_total.fetch_add(1, Ordering::Relaxed);
        self.record_outcome(result);
    }

    /// Record bytes committed to a sink
    pub fn bytes_written(&self, byte_count: u64) {
        self.bytes_written.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record one flush
    pub fn flushed(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sink reporting completion
    pub fn sink_completed(&self) {
        self.sink_completions.fetch_add(1, Ordering::Relaxed);
    }

    fn record_outcome<T>(&self, result: &Result<T>) {
        let Err(error) = result else {
            return;
        };
        self.failures_total.fetch_add(1, Ordering::Relaxed);
        match error {
            CodecError::Canceled => {
                self.cancellations.fetch_add(1, Ordering::Relaxed);
            }
            CodecError::EndOfInput => {
                self.end_of_input.fetch_add(1, Ordering::Relaxed);
            }
            other => debug!(error = %other, "Codec operation failed"),
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads_total: self.reads_total.load(Ordering::Relaxed),
            writes_total: self.writes_total.load(Ordering::Relaxed),
            failures_total: self.failures_total.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            end_of_input: self.end_of_input.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            sink_completions: self.sink_completions.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            reads_total = snapshot.reads_total,
            writes_total = snapshot.writes_total,
            failures_total = snapshot.failures_total,
            cancellations = snapshot.cancellations,
            end_of_input = snapshot.end_of_input,
            bytes_written = snapshot.bytes_written,
            flushes = snapshot.flushes,
            sink_completions = snapshot.sink_completions,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub reads_total: u64,
    pub writes_total: u64,
    pub failures_total: u64,
    pub cancellations: u64,
    pub end_of_input: u64,
    pub bytes_written: u64,
    pub flushes: u64,
    pub sink_completions: u64,
    pub uptime_seconds: u64,
}
