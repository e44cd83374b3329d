// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Completion signal for one writer run.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// Why a writer run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterExit {
    /// Stop requested (or never started).
    Stopped,
    /// A transport write failed; reported to the connection.
    TransportFailed,
    /// The transport future failed or was cancelled; reported to the
    /// connection.
    AcquisitionFailed,
    /// The loop panicked inside a port, sink or hook callback. Not reported
    /// through the hooks.
    Panicked,
}

#[derive(Debug)]
struct CompletionInner {
    exit: Mutex<Option<WriterExit>>,
    done: Condvar,
}

/// Clonable handle resolved once the writer thread has exited.
#[derive(Clone, Debug)]
pub struct WriterCompletion {
    inner: Arc<CompletionInner>,
}

impl WriterCompletion {
    pub(crate) fn pending() -> Self {
        Self {
            inner: Arc::new(CompletionInner {
                exit: Mutex::new(None),
                done: Condvar::new(),
            }),
        }
    }

    /// A completion that has already resolved with `exit`.
    pub fn resolved(exit: WriterExit) -> Self {
        let completion = Self::pending();
        completion.complete(exit);
        completion
    }

    pub(crate) fn complete(&self, exit: WriterExit) {
        let mut slot = self.inner.exit.lock();
        if slot.is_none() {
            *slot = Some(exit);
        }
        self.inner.done.notify_all();
    }

    /// Whether the run has finished.
    pub fn is_complete(&self) -> bool {
        self.inner.exit.lock().is_some()
    }

    /// Exit reason, if finished.
    pub fn exit(&self) -> Option<WriterExit> {
        *self.inner.exit.lock()
    }

    /// Block until the run finishes.
    pub fn wait(&self) -> WriterExit {
        let mut slot = self.inner.exit.lock();
        loop {
            if let Some(exit) = *slot {
                return exit;
            }
            self.inner.done.wait(&mut slot);
        }
    }

    /// Block up to `timeout`; `None` if still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<WriterExit> {
        let mut slot = self.inner.exit.lock();
        if slot.is_none() {
            let _ = self
                .inner
                .done
                .wait_while_for(&mut slot, |exit| exit.is_none(), timeout);
        }
        *slot
    }

    /// Whether two handles observe the same run.
    pub fn same_run(&self, other: &WriterCompletion) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_resolved() {
        let completion = WriterCompletion::resolved(WriterExit::Stopped);
        assert!(completion.is_complete());
        assert_eq!(completion.wait(), WriterExit::Stopped);
    }

    #[test]
    fn test_pending_times_out() {
        let completion = WriterCompletion::pending();
        assert_eq!(completion.wait_timeout(Duration::from_millis(10)), None);
        assert_eq!(completion.exit(), None);
    }

    #[test]
    fn test_first_exit_wins() {
        let completion = WriterCompletion::pending();
        completion.complete(WriterExit::TransportFailed);
        completion.complete(WriterExit::Stopped);
        assert_eq!(completion.exit(), Some(WriterExit::TransportFailed));
    }

    #[test]
    fn test_clones_observe_completion() {
        let completion = WriterCompletion::pending();
        let observer = completion.clone();
        assert!(observer.same_run(&completion));

        let handle = thread::spawn(move || observer.wait());
        thread::sleep(Duration::from_millis(10));
        completion.complete(WriterExit::AcquisitionFailed);

        assert_eq!(handle.join().unwrap(), WriterExit::AcquisitionFailed);
        assert!(!completion.same_run(&WriterCompletion::resolved(WriterExit::Stopped)));
    }
}
