// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-slot producer/writer rendezvous.
//!
//! One mutex guards both accumulators, their pending counts and a single
//! presence bit (`slot_full`). Two condition variables carry the hand-off:
//!
//! ```text
//!   producer                               writer loop
//!   --------                               -----------
//!   lock                                   lock
//!   gate? else drop                        while !slot_full: wait(producer_done)
//!   while slot_full: wait(consumer_done)
//!   append, count++                        lane = mode (sampled once)
//!   slot_full = true                       if pending(lane) > 0: write + clear
//!   notify_one(producer_done) ----------->  slot_full = false
//!   unlock                  <-------------  notify_one(consumer_done)
//!                                          unlock
//! ```
//!
//! The slot is a bit, not a count: once set, every further producer blocks
//! until the writer has been through one drain cycle. Under contention this
//! forces strict alternation between appends and drains. Several messages
//! only share a drain when the writer cleared the slot without draining
//! their lane (reconnect mode, or a forced wake).
//!
//! The gate is consulted before the slot wait, so a full normal lane drops
//! at once even while the writer is stalled. Producers already waiting on
//! the slot were admitted earlier and may take the count past the threshold.
//!
//! The transport write runs with the lock held, so no append can interleave
//! with an in-flight write and accumulators cannot grow during a slow write.

use crate::buffer::{BufferStore, Lane};
use crate::error::TransportError;
use crate::gate::BackpressureGate;
use crate::message::OutgoingMessage;
use crate::metrics::StatisticsSink;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Where a producer's message goes.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Route<'a> {
    /// Normal lane, subject to the gate.
    Gated(&'a BackpressureGate),
    /// Lane picked from the reconnect-mode flag once the slot is free.
    ByMode(&'a AtomicBool),
}

/// Result of a producer pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Produced {
    /// Appended this many bytes to the given lane.
    Appended { lane: Lane, bytes: usize },
    /// Dropped by the backpressure gate.
    Rejected,
    /// Wait was interrupted; nothing appended.
    Interrupted,
}

/// Result of a writer pass that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Consumed {
    /// Wrote this many bytes from the given lane.
    Drained { lane: Lane, bytes: usize },
    /// Slot was set but the sampled lane had nothing pending.
    Idle,
    /// Wait was interrupted before the slot was set.
    Interrupted,
}

#[derive(Debug)]
struct HandoffState {
    store: BufferStore,
    slot_full: bool,
    interrupt_epoch: u64,
}

/// Lock, presence bit and the two hand-off signals.
#[derive(Debug)]
pub(crate) struct HandoffSlot {
    state: Mutex<HandoffState>,
    /// Signalled when a producer (or a forced wake) sets the slot.
    producer_finished: Condvar,
    /// Signalled when the writer clears the slot.
    consumer_finished: Condvar,
    /// Mirror of the normal lane length for lock-free diagnostics.
    queued_bytes: AtomicU64,
}

impl HandoffSlot {
    pub(crate) fn new(buffer_size: usize) -> Self {
        Self {
            state: Mutex::new(HandoffState {
                store: BufferStore::new(buffer_size),
                slot_full: false,
                interrupt_epoch: 0,
            }),
            producer_finished: Condvar::new(),
            consumer_finished: Condvar::new(),
            queued_bytes: AtomicU64::new(0),
        }
    }

    /// Producer path: wait for a free slot, append, hand the slot to the
    /// writer.
    pub(crate) fn produce<M: OutgoingMessage + ?Sized>(
        &self,
        route: Route<'_>,
        msg: &M,
        stats: &dyn StatisticsSink,
    ) -> Produced {
        let mut state = self.state.lock();

        // Drop before queueing behind the slot.
        if let Route::Gated(gate) = route {
            if !gate.admits(state.store.pending(Lane::Normal)) {
                return Produced::Rejected;
            }
        }

        let epoch = state.interrupt_epoch;
        while state.slot_full {
            self.consumer_finished.wait(&mut state);
            if state.interrupt_epoch != epoch {
                return Produced::Interrupted;
            }
        }

        let lane = match route {
            Route::Gated(_) => Lane::Normal,
            Route::ByMode(reconnecting) => Lane::for_mode(reconnecting.load(Ordering::Acquire)),
        };

        let bytes = state.store.append(lane, msg);
        if lane == Lane::Normal {
            self.publish_queued_bytes(&state);
        }
        stats.increment_out_msgs_and_bytes(bytes);

        state.slot_full = true;
        self.producer_finished.notify_one();

        Produced::Appended { lane, bytes }
    }

    /// Writer path: wait for the slot, drain the lane selected by
    /// `reconnecting` through `write`, release the slot.
    ///
    /// `on_ready` runs only when the sampled lane has something to drain.
    ///
    /// On a transport error the lane keeps its contents and the slot stays
    /// set; the caller is expected to stop.
    pub(crate) fn consume<F>(
        &self,
        reconnecting: &AtomicBool,
        stats: &dyn StatisticsSink,
        on_ready: impl FnOnce(),
        write: F,
    ) -> Result<Consumed, TransportError>
    where
        F: FnOnce(&[u8]) -> Result<(), TransportError>,
    {
        let mut state = self.state.lock();
        let epoch = state.interrupt_epoch;

        while !state.slot_full {
            self.producer_finished.wait(&mut state);
            if state.interrupt_epoch != epoch {
                return Ok(Consumed::Interrupted);
            }
        }

        let lane = Lane::for_mode(reconnecting.load(Ordering::Acquire));
        let mut outcome = Consumed::Idle;
        if state.store.pending(lane) > 0 {
            on_ready();
            let bytes = state.store.drain_with(lane, write)?;
            stats.register_write(bytes);
            if lane == Lane::Normal {
                self.publish_queued_bytes(&state);
            }
            outcome = Consumed::Drained { lane, bytes };
        }

        state.slot_full = false;
        self.consumer_finished.notify_one();

        Ok(outcome)
    }

    /// Set the slot without appending and wake the writer.
    ///
    /// Used for the stop wake and for explicit flushes. The writer runs one
    /// ordinary drain cycle for it.
    pub(crate) fn force_wake(&self) {
        let mut state = self.state.lock();
        state.slot_full = true;
        self.producer_finished.notify_one();
    }

    /// Re-arm the slot for a new writer run.
    ///
    /// The slot is set when either lane still holds messages, so leftovers
    /// are drained on the first cycle. Every blocked producer re-checks.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        state.slot_full = state.store.has_pending();
        if state.slot_full {
            self.producer_finished.notify_one();
        }
        self.consumer_finished.notify_all();
    }

    /// Abort every wait currently in progress, on both sides.
    pub(crate) fn interrupt(&self) {
        let mut state = self.state.lock();
        state.interrupt_epoch = state.interrupt_epoch.wrapping_add(1);
        self.consumer_finished.notify_all();
        self.producer_finished.notify_all();
    }

    /// Normal lane length; a snapshot, not synchronized with the lock.
    pub(crate) fn queued_bytes(&self) -> u64 {
        self.queued_bytes.load(Ordering::Relaxed)
    }

    /// Pending count of `lane`.
    pub(crate) fn pending(&self, lane: Lane) -> u64 {
        self.state.lock().store.pending(lane)
    }

    /// Whether the slot is currently set.
    pub(crate) fn is_slot_full(&self) -> bool {
        self.state.lock().slot_full
    }

    fn publish_queued_bytes(&self, state: &HandoffState) {
        self.queued_bytes
            .store(state.store.len(Lane::Normal) as u64, Ordering::Relaxed);
    }
}
