// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound statistics.
//!
//! The writer reports to a [`StatisticsSink`] owned by the connection:
//! - one `increment_out_msgs_and_bytes` per accepted append
//! - one `register_write` per drain that reached the transport
//!
//! [`WriterMetrics`] is the default atomic-counter sink.
//!
//! # Example
//!
//! ```
//! use hdds_outbound::{StatisticsSink, WriterMetrics};
//!
//! let metrics = WriterMetrics::new();
//! metrics.increment_out_msgs_and_bytes(128);
//! metrics.register_write(128);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.out_msgs, 1);
//! assert_eq!(snapshot.bytes_written, 128);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Statistics collector consumed by the writer.
///
/// Called with the handoff lock held, so implementations must be cheap and
/// must not call back into the writer.
pub trait StatisticsSink: Send + Sync {
    /// A drain of `bytes` bytes was written to the transport.
    fn register_write(&self, bytes: usize);

    /// One message of `bytes` serialized bytes was staged for sending.
    fn increment_out_msgs_and_bytes(&self, bytes: usize);
}

// ============================================================================
// Atomic metrics
// ============================================================================

/// Atomic counters for one writer.
#[derive(Debug)]
pub struct WriterMetrics {
    /// Messages accepted into an accumulator
    out_msgs: AtomicU64,

    /// Serialized bytes accepted into an accumulator
    out_bytes: AtomicU64,

    /// Transport writes (one per non-empty drain)
    writes: AtomicU64,

    /// Bytes handed to the transport
    bytes_written: AtomicU64,

    /// When metrics collection started
    start_time: Instant,
}

impl WriterMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self {
            out_msgs: AtomicU64::new(0),
            out_bytes: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Get total messages accepted.
    pub fn out_msgs(&self) -> u64 {
        self.out_msgs.load(Ordering::Relaxed)
    }

    /// Get total bytes accepted.
    pub fn out_bytes(&self) -> u64 {
        self.out_bytes.load(Ordering::Relaxed)
    }

    /// Get total transport writes.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Get total bytes written to the transport.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> WriterMetricsSnapshot {
        WriterMetricsSnapshot {
            out_msgs: self.out_msgs.load(Ordering::Relaxed),
            out_bytes: self.out_bytes.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.out_msgs.store(0, Ordering::Relaxed);
        self.out_bytes.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
    }
}

impl Default for WriterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsSink for WriterMetrics {
    fn register_write(&self, bytes: usize) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn increment_out_msgs_and_bytes(&self, bytes: usize) {
        self.out_msgs.fetch_add(1, Ordering::Relaxed);
        self.out_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }
}

/// Snapshot of writer metrics.
#[derive(Clone, Debug, Default)]
pub struct WriterMetricsSnapshot {
    /// Messages accepted
    pub out_msgs: u64,

    /// Bytes accepted
    pub out_bytes: u64,

    /// Transport writes
    pub writes: u64,

    /// Bytes written
    pub bytes_written: u64,

    /// Uptime in seconds
    pub uptime_secs: f64,
}

impl WriterMetricsSnapshot {
    /// Average number of bytes per transport write.
    pub fn avg_write_size(&self) -> f64 {
        if self.writes > 0 {
            self.bytes_written as f64 / self.writes as f64
        } else {
            0.0
        }
    }

    /// Bytes accepted but not yet written.
    pub fn unwritten_bytes(&self) -> u64 {
        self.out_bytes.saturating_sub(self.bytes_written)
    }
}
