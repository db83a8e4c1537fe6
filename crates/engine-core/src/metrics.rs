use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_sent: AtomicU64,
    batches_sent: AtomicU64,
    failed_batches: AtomicU64,
    failed_rows: AtomicU64,
}

/// Delivery counters of one writer worker.
#[derive(Debug, Clone)]
pub struct WriterMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rows_sent: u64,
    pub batches_sent: u64,
    pub failed_batches: u64,
    pub failed_rows: u64,
}

impl WriterMetrics {
    pub fn new() -> Self {
        WriterMetrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    /// Records one delivered batch of `rows` rows.
    pub fn record_batch(&self, rows: u64) {
        self.inner.rows_sent.fetch_add(rows, Ordering::Relaxed);
        self.inner.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, rows: u64) {
        self.inner.failed_batches.fetch_add(1, Ordering::Relaxed);
        self.inner.failed_rows.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn rows_sent(&self) -> u64 {
        self.inner.rows_sent.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_sent: self.inner.rows_sent.load(Ordering::Relaxed),
            batches_sent: self.inner.batches_sent.load(Ordering::Relaxed),
            failed_batches: self.inner.failed_batches.load(Ordering::Relaxed),
            failed_rows: self.inner.failed_rows.load(Ordering::Relaxed),
        }
    }
}

impl Default for WriterMetrics {
    fn default() -> Self {
        Self::new()
    }
}
