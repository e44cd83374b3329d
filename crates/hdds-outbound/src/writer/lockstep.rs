// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lock-step connection writer.
//!
//! Producers and the writer thread meet on a single-slot handoff: each
//! append sets the slot, each drain clears it.
//!
//! # Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                        LockstepWriter                         |
//! |   append() ---------+                                         |
//! |   append_internal() +--> HandoffSlot (lock + 2 condvars)      |
//! |   flush_buffer() ---+      |  normal lane | staging lane |    |
//! |                            +------------------------------+   |
//! |                                        |                      |
//! |   start(future) --> writer thread -----+                      |
//! |                     1. wait transport (or stop)               |
//! |                     2. loop { consume -> DataPort::write }    |
//! |   stop() ---------> running=false, drop stop_tx, force wake   |
//! +---------------------------------------------------------------+
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use super::completion::{WriterCompletion, WriterExit};
use super::{ConnectionWriter, WriterContext, WriterState};
use crate::config::WriterConfig;
use crate::error::WriterError;
use crate::gate::BackpressureGate;
use crate::handoff::{Consumed, HandoffSlot, Produced, Route};
use crate::message::OutgoingMessage;
use crate::transport::{self, BoxedDataPort, DataPort, TransportFuture};

/// State shared between the handle and the writer thread.
struct Shared {
    handoff: HandoffSlot,
    gate: BackpressureGate,
    running: AtomicBool,
    state: AtomicU8,
    ctx: WriterContext,
}

impl Shared {
    fn set_state(&self, state: WriterState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Bookkeeping for the current (or last) run.
struct RunSlot {
    completion: WriterCompletion,
    /// Dropping this releases a loop still waiting for its transport.
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

/// Single-slot rendezvous writer.
pub struct LockstepWriter {
    shared: Arc<Shared>,
    run: Mutex<RunSlot>,
    thread_name: String,
}

impl LockstepWriter {
    /// Create a stopped writer.
    pub fn new(config: &WriterConfig, ctx: WriterContext) -> Self {
        Self {
            shared: Arc::new(Shared {
                handoff: HandoffSlot::new(config.buffer_size),
                gate: BackpressureGate::from_config(config),
                running: AtomicBool::new(false),
                state: AtomicU8::new(WriterState::Stopped as u8),
                ctx,
            }),
            run: Mutex::new(RunSlot {
                completion: WriterCompletion::resolved(WriterExit::Stopped),
                stop_tx: None,
                thread: None,
            }),
            thread_name: config.thread_name.clone(),
        }
    }

    /// Backpressure gate in use.
    pub fn gate(&self) -> BackpressureGate {
        self.shared.gate
    }

    /// Abort every wait in progress.
    ///
    /// Producers blocked on the slot return without staging their message
    /// (`append` yields `false`). A writer loop waiting for data logs the
    /// interruption and keeps running.
    pub fn interrupt(&self) {
        self.shared.handoff.interrupt();
    }

    fn produce(&self, route: Route<'_>, msg: &dyn OutgoingMessage) -> bool {
        match self
            .shared
            .handoff
            .produce(route, msg, &*self.shared.ctx.statistics)
        {
            Produced::Appended { .. } => true,
            Produced::Rejected => false,
            Produced::Interrupted => {
                log::warn!("[writer] producer wait interrupted, message not queued");
                false
            }
        }
    }
}

impl ConnectionWriter for LockstepWriter {
    fn start(&self, transport: TransportFuture) -> Result<WriterCompletion, WriterError> {
        let mut run = self.run.lock();

        if !run.completion.is_complete() {
            log::warn!("[writer] start called before the previous run completed");
        }
        if let Some(handle) = run.thread.take() {
            if !handle.is_finished() {
                log::warn!("[writer] previous writer thread still running, detaching it");
            } else if handle.join().is_err() {
                log::warn!("[writer] previous writer thread panicked");
            }
        }

        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let completion = WriterCompletion::pending();

        self.shared.running.store(true, Ordering::Release);
        self.shared.set_state(WriterState::AwaitingTransport);
        self.shared.handoff.reset();

        let shared = Arc::clone(&self.shared);
        let done = completion.clone();
        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_loop(&shared, transport, &stop_rx)
                }));
                let exit = result.unwrap_or_else(|payload| {
                    log::error!("[writer] writer loop panicked: {}", panic_message(&*payload));
                    WriterExit::Panicked
                });
                shared.running.store(false, Ordering::Release);
                shared.set_state(WriterState::Stopped);
                log::debug!("[writer] exited: {:?}", exit);
                done.complete(exit);
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                self.shared.set_state(WriterState::Stopped);
                completion.complete(WriterExit::Stopped);
                run.completion = completion;
                return Err(WriterError::Spawn(e));
            }
        };

        log::info!("[writer] started on thread '{}'", self.thread_name);
        run.completion = completion.clone();
        run.stop_tx = Some(stop_tx);
        run.thread = Some(handle);
        Ok(completion)
    }

    fn stop(&self) -> WriterCompletion {
        self.shared.running.store(false, Ordering::Release);

        let mut run = self.run.lock();
        drop(run.stop_tx.take());
        self.shared.handoff.force_wake();
        run.completion.clone()
    }

    fn append(&self, msg: &dyn OutgoingMessage) -> bool {
        self.produce(Route::Gated(&self.shared.gate), msg)
    }

    fn append_internal(&self, msg: &dyn OutgoingMessage) {
        self.produce(Route::ByMode(&self.shared.ctx.reconnect_mode), msg);
    }

    fn flush_buffer(&self) {
        self.shared.handoff.force_wake();
    }

    fn queued_bytes(&self) -> u64 {
        self.shared.handoff.queued_bytes()
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    fn state(&self) -> WriterState {
        WriterState::from_u8(self.shared.state.load(Ordering::Acquire))
    }
}

impl Drop for LockstepWriter {
    fn drop(&mut self) {
        let _ = self.stop();

        let handle = self.run.get_mut().thread.take();
        if let Some(handle) = handle {
            // No self-join when dropped from a hook on the writer thread.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                log::warn!("[writer] writer thread panicked");
            }
        }
    }
}

// ============================================================================
// Writer loop
// ============================================================================

fn run_loop(shared: &Shared, transport: TransportFuture, stop_rx: &Receiver<()>) -> WriterExit {
    let mut port = match await_transport(transport, stop_rx) {
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            log::error!("[writer] transport unavailable: {}", e);
            shared.ctx.hooks.handle_communication_issue(&e);
            return WriterExit::AcquisitionFailed;
        }
        None => return WriterExit::Stopped,
    };
    log::debug!("[writer] transport acquired");

    let ctx = &shared.ctx;
    while shared.running.load(Ordering::Acquire) {
        shared.set_state(WriterState::WaitingForData);

        let result = shared.handoff.consume(
            &ctx.reconnect_mode,
            &*ctx.statistics,
            || shared.set_state(WriterState::Draining),
            |bytes| port.write(bytes),
        );

        match result {
            Ok(Consumed::Drained { lane, bytes }) => {
                log::trace!("[writer] drained {} bytes from {} lane", bytes, lane);
            }
            Ok(Consumed::Idle) => {}
            Ok(Consumed::Interrupted) => {
                log::warn!("[writer] wait for data interrupted, continuing");
            }
            Err(e) => {
                let err = WriterError::Transport(e);
                log::error!("[writer] {}", err);
                ctx.hooks.handle_communication_issue(&err);
                return WriterExit::TransportFailed;
            }
        }
    }

    WriterExit::Stopped
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Block on the transport future; `None` if stop was requested first.
fn await_transport(
    transport: TransportFuture,
    stop_rx: &Receiver<()>,
) -> Option<Result<BoxedDataPort, WriterError>> {
    crossbeam::channel::select! {
        recv(transport.receiver()) -> received => Some(transport::outcome(received)),
        recv(stop_rx) -> _ => None,
    }
}

#[cfg(test)]
#[path = "lockstep_tests.rs"]
mod tests;
