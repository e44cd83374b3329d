// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection writer contract and its implementations.
//!
//! A connection owns exactly one writer. Application threads call
//! [`ConnectionWriter::append`] / [`ConnectionWriter::append_internal`];
//! a dedicated thread started by [`ConnectionWriter::start`] drains the
//! staged bytes into the transport.
//!
//! # Lifecycle
//!
//! ```text
//!   start(future) --> AwaitingTransport --+--> WaitingForData <--> Draining
//!                           |             |          |                |
//!                           | fail/cancel |          | stop           | write fault
//!                           v             |          v                v
//!                        Stopped <--------+------ Stopped <------- Stopped
//! ```
//!
//! `start` must only be called once the completion returned by the
//! previous `start`/`stop` has resolved. Overlapping runs are not guarded
//! against; the owning connection sequences them.

mod completion;
mod lockstep;

pub use completion::{WriterCompletion, WriterExit};
pub use lockstep::LockstepWriter;

use crate::error::WriterError;
use crate::message::OutgoingMessage;
use crate::metrics::StatisticsSink;
use crate::transport::TransportFuture;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Outbound writer contract shared by every implementation.
pub trait ConnectionWriter: Send + Sync {
    /// Spawn the writer loop gated on `transport`.
    fn start(&self, transport: TransportFuture) -> Result<WriterCompletion, WriterError>;

    /// Ask the loop to exit at its next wait point.
    ///
    /// Safe to call repeatedly; always returns the completion of the last
    /// `start` (or an already-resolved one if never started).
    fn stop(&self) -> WriterCompletion;

    /// Stage an application message on the normal lane.
    ///
    /// Returns `false` when the message was not staged: dropped by the
    /// backpressure gate, or its wait was interrupted.
    fn append(&self, msg: &dyn OutgoingMessage) -> bool;

    /// Stage a protocol message; never gated. Goes to the staging lane
    /// while reconnecting, the normal lane otherwise.
    fn append_internal(&self, msg: &dyn OutgoingMessage);

    /// Wake the loop for a drain cycle without staging anything.
    fn flush_buffer(&self);

    /// Bytes currently held by the normal lane (diagnostic snapshot).
    fn queued_bytes(&self) -> u64;

    /// Whether the loop is (or is about to be) running.
    fn is_running(&self) -> bool;

    /// Current loop state.
    fn state(&self) -> WriterState;
}

// ============================================================================
// Writer state
// ============================================================================

/// State of the writer loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum WriterState {
    /// Blocked on the transport future
    AwaitingTransport = 0,
    /// Blocked until a producer (or a forced wake) sets the slot
    WaitingForData = 1,
    /// Slot taken, draining the active lane
    Draining = 2,
    /// Not running (never started, stopped or failed)
    #[default]
    Stopped = 3,
}

impl WriterState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WriterState::AwaitingTransport,
            1 => WriterState::WaitingForData,
            2 => WriterState::Draining,
            _ => WriterState::Stopped,
        }
    }

    /// Check if the loop thread is alive in this state.
    pub fn is_active(&self) -> bool {
        !matches!(self, WriterState::Stopped)
    }
}

impl std::fmt::Display for WriterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WriterState::AwaitingTransport => "AwaitingTransport",
            WriterState::WaitingForData => "WaitingForData",
            WriterState::Draining => "Draining",
            WriterState::Stopped => "Stopped",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Connection context
// ============================================================================

/// Upward hooks into the owning connection.
pub trait ConnectionHooks: Send + Sync {
    /// Called exactly once per fatal writer fault, from the writer thread,
    /// with no writer lock held.
    fn handle_communication_issue(&self, err: &WriterError);
}

impl<F> ConnectionHooks for F
where
    F: Fn(&WriterError) + Send + Sync,
{
    fn handle_communication_issue(&self, err: &WriterError) {
        self(err)
    }
}

/// Shared state a connection hands to its writer.
#[derive(Clone)]
pub struct WriterContext {
    /// Reconnect-mode flag, owned and flipped by the connection.
    pub reconnect_mode: Arc<AtomicBool>,
    /// Statistics collector.
    pub statistics: Arc<dyn StatisticsSink>,
    /// Upward error reporting.
    pub hooks: Arc<dyn ConnectionHooks>,
}

impl WriterContext {
    /// Context with a fresh reconnect flag (normal mode).
    pub fn new(statistics: Arc<dyn StatisticsSink>, hooks: Arc<dyn ConnectionHooks>) -> Self {
        Self {
            reconnect_mode: Arc::new(AtomicBool::new(false)),
            statistics,
            hooks,
        }
    }

    /// Share an existing reconnect flag with the connection.
    pub fn with_reconnect_mode(mut self, flag: Arc<AtomicBool>) -> Self {
        self.reconnect_mode = flag;
        self
    }
}

impl std::fmt::Debug for WriterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterContext")
            .field("reconnect_mode", &self.reconnect_mode)
            .finish_non_exhaustive()
    }
}
