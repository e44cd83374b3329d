// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backpressure gate for the normal accumulator.

use crate::config::WriterConfig;

/// Accept/drop policy consulted before a normal-lane append.
///
/// The gate holds no state: it compares the lane's current pending count
/// against an immutable threshold. The staging lane is never gated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackpressureGate {
    threshold: Option<u64>,
}

impl BackpressureGate {
    /// Gate that drops once `threshold` messages are pending.
    pub fn bounded(threshold: u64) -> Self {
        Self {
            threshold: Some(threshold),
        }
    }

    /// Gate that never drops.
    pub fn unbounded() -> Self {
        Self { threshold: None }
    }

    /// Build the gate described by `config`.
    pub fn from_config(config: &WriterConfig) -> Self {
        Self {
            threshold: config.discard_threshold(),
        }
    }

    /// Configured threshold (`None` = unbounded).
    pub fn threshold(&self) -> Option<u64> {
        self.threshold
    }

    /// Whether a new message may be appended given `pending` messages
    /// already waiting. The message arriving at `pending == threshold` is
    /// the first one dropped.
    #[inline]
    pub fn admits(&self, pending: u64) -> bool {
        self.threshold.map_or(true, |limit| pending < limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_threshold() {
        let gate = BackpressureGate::bounded(2);
        assert!(gate.admits(0));
        assert!(gate.admits(1));
        assert!(!gate.admits(2));
        assert!(!gate.admits(3));
    }

    #[test]
    fn test_unbounded_never_drops() {
        let gate = BackpressureGate::unbounded();
        assert!(gate.admits(0));
        assert!(gate.admits(u64::MAX));
    }

    #[test]
    fn test_from_config() {
        let config = WriterConfig::default();
        assert_eq!(BackpressureGate::from_config(&config).threshold(), None);

        let config = WriterConfig {
            max_messages_in_outgoing_queue: 10,
            discard_messages_when_outgoing_queue_full: true,
            ..Default::default()
        };
        let gate = BackpressureGate::from_config(&config);
        assert_eq!(gate.threshold(), Some(10));
        assert!(gate.admits(9));
        assert!(!gate.admits(10));
    }
}
