// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffer store: the normal and staging accumulators.
//!
//! Each [`Lane`] owns an append-only [`Accumulator`] and a pending-message
//! count. A drain hands the full contents of one lane to a writer callback
//! and, only if the callback succeeds, clears the bytes and the count
//! together.
//!
//! The store itself is not synchronized; it lives inside the handoff lock.

use crate::message::OutgoingMessage;

/// Which accumulator an append or drain targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Regular outbound traffic.
    Normal,
    /// Traffic buffered while the connection is reconnecting.
    Staging,
}

impl Lane {
    /// Lane selected by the connection's reconnect-mode flag.
    #[inline]
    pub fn for_mode(reconnecting: bool) -> Self {
        if reconnecting {
            Lane::Staging
        } else {
            Lane::Normal
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lane::Normal => write!(f, "normal"),
            Lane::Staging => write!(f, "staging"),
        }
    }
}

// ============================================================================
// Accumulator
// ============================================================================

/// Append-only byte buffer. Cleared, never reallocated, after a drain.
#[derive(Debug, Default)]
pub struct Accumulator {
    buf: Vec<u8>,
}

impl Accumulator {
    /// Create an accumulator with an initial capacity hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes, growing as needed.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when no bytes are held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current contents.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Allocated capacity.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Drop the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

// ============================================================================
// Buffer store
// ============================================================================

#[derive(Debug)]
struct LaneBuffer {
    bytes: Accumulator,
    pending: u64,
}

impl LaneBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            bytes: Accumulator::with_capacity(capacity),
            pending: 0,
        }
    }
}

/// Normal and staging accumulators with their pending counts.
#[derive(Debug)]
pub struct BufferStore {
    normal: LaneBuffer,
    staging: LaneBuffer,
}

impl BufferStore {
    /// Create a store; both accumulators get `capacity` bytes up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            normal: LaneBuffer::new(capacity),
            staging: LaneBuffer::new(capacity),
        }
    }

    fn lane(&self, lane: Lane) -> &LaneBuffer {
        match lane {
            Lane::Normal => &self.normal,
            Lane::Staging => &self.staging,
        }
    }

    fn lane_mut(&mut self, lane: Lane) -> &mut LaneBuffer {
        match lane {
            Lane::Normal => &mut self.normal,
            Lane::Staging => &mut self.staging,
        }
    }

    /// Serialize `msg` into `lane`, count it, and return the bytes added.
    pub fn append<M: OutgoingMessage + ?Sized>(&mut self, lane: Lane, msg: &M) -> usize {
        let target = self.lane_mut(lane);
        let start = target.bytes.len();
        msg.append_serialized(&mut target.bytes);
        target.pending += 1;
        target.bytes.len() - start
    }

    /// Hand the full contents of `lane` to `write`.
    ///
    /// On success the accumulator and its pending count are cleared and the
    /// drained length is returned. On failure both are left untouched.
    pub fn drain_with<E, F>(&mut self, lane: Lane, write: F) -> Result<usize, E>
    where
        F: FnOnce(&[u8]) -> Result<(), E>,
    {
        let target = self.lane_mut(lane);
        let len = target.bytes.len();
        write(target.bytes.as_slice())?;
        target.bytes.clear();
        target.pending = 0;
        Ok(len)
    }

    /// Messages appended to `lane` since its last drain.
    #[inline]
    pub fn pending(&self, lane: Lane) -> u64 {
        self.lane(lane).pending
    }

    /// Bytes held by `lane`.
    #[inline]
    pub fn len(&self, lane: Lane) -> usize {
        self.lane(lane).bytes.len()
    }

    /// True if either lane holds undrained messages.
    pub fn has_pending(&self) -> bool {
        self.normal.pending > 0 || self.staging.pending > 0
    }
}
