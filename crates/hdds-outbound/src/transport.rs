// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport side of the writer.
//!
//! - [`DataPort`] - a ready transport the writer drains into
//! - [`StreamDataPort`] - `DataPort` over any `Write` stream (TCP, TLS, mock)
//! - [`TransportFuture`] / [`TransportPromise`] - one-shot hand-off of a
//!   `DataPort` from the connection's connect/reconnect logic to the writer
//!
//! # Example
//!
//! ```
//! use hdds_outbound::{transport_channel, StreamDataPort};
//!
//! let (promise, future) = transport_channel();
//!
//! // Connect logic resolves the promise once the stream is usable.
//! std::thread::spawn(move || {
//!     promise.complete(StreamDataPort::new(Vec::<u8>::new()));
//! });
//!
//! let port = future.wait();
//! assert!(port.is_ok());
//! ```

use crate::error::TransportError;
use crossbeam::channel::{self, Receiver, Sender};
use std::io::{self, Write};

/// A connected transport accepting drained bytes.
pub trait DataPort: Send {
    /// Write `bytes` in full or fail.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Type alias for a boxed DataPort.
pub type BoxedDataPort = Box<dyn DataPort>;

impl DataPort for BoxedDataPort {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }
}

// ============================================================================
// Stream adapter
// ============================================================================

/// [`DataPort`] over a blocking byte stream.
///
/// Each drain becomes one `write_all` followed by a `flush`. An optional
/// write limit rejects oversized drains with
/// [`TransportError::BufferOverflow`] before touching the stream.
#[derive(Debug)]
pub struct StreamDataPort<W> {
    stream: W,
    write_limit: Option<usize>,
}

impl<W: Write + Send> StreamDataPort<W> {
    /// Wrap a connected stream.
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            write_limit: None,
        }
    }

    /// Reject single writes larger than `limit` bytes.
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> W {
        self.stream
    }
}

impl<W: Write + Send> DataPort for StreamDataPort<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if let Some(capacity) = self.write_limit {
            if bytes.len() > capacity {
                return Err(TransportError::BufferOverflow {
                    len: bytes.len(),
                    capacity,
                });
            }
        }
        self.stream.write_all(bytes)?;
        self.stream.flush()?;
        Ok(())
    }
}

// ============================================================================
// Transport future
// ============================================================================

type TransportResult = io::Result<BoxedDataPort>;

/// Create a pending transport hand-off.
pub fn transport_channel() -> (TransportPromise, TransportFuture) {
    let (tx, rx) = channel::bounded(1);
    (TransportPromise { tx }, TransportFuture { rx })
}

/// Producer half: resolved exactly once by the connection.
///
/// Dropping the promise without resolving it cancels the future.
#[derive(Debug)]
pub struct TransportPromise {
    tx: Sender<TransportResult>,
}

impl TransportPromise {
    /// Resolve with a ready transport.
    pub fn complete<P: DataPort + 'static>(self, port: P) {
        // The receiver may be gone if the writer was stopped first.
        let _ = self.tx.send(Ok(Box::new(port)));
    }

    /// Resolve with an acquisition failure.
    pub fn fail(self, err: io::Error) {
        let _ = self.tx.send(Err(err));
    }
}

/// Consumer half: awaited by the writer thread before its first drain.
#[derive(Debug)]
pub struct TransportFuture {
    rx: Receiver<TransportResult>,
}

impl TransportFuture {
    /// An already-resolved future holding `port`.
    pub fn ready<P: DataPort + 'static>(port: P) -> Self {
        let (promise, future) = transport_channel();
        promise.complete(port);
        future
    }

    /// An already-failed future.
    pub fn failed(err: io::Error) -> Self {
        let (promise, future) = transport_channel();
        promise.fail(err);
        future
    }

    /// Block until the promise resolves.
    pub fn wait(self) -> Result<BoxedDataPort, crate::WriterError> {
        outcome(self.rx.recv())
    }

    pub(crate) fn receiver(&self) -> &Receiver<TransportResult> {
        &self.rx
    }
}

/// Map a receive on the hand-off channel to the writer's view of it.
pub(crate) fn outcome(
    received: Result<TransportResult, channel::RecvError>,
) -> Result<BoxedDataPort, crate::WriterError> {
    match received {
        Ok(Ok(port)) => Ok(port),
        Ok(Err(err)) => Err(crate::WriterError::AcquisitionFailed(err)),
        Err(channel::RecvError) => Err(crate::WriterError::AcquisitionCancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WriterError;

    /// Stream that fails every write.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stream_port_writes_all() {
        let mut port = StreamDataPort::new(Vec::new());
        port.write(b"PING\r\n").unwrap();
        port.write(b"PONG\r\n").unwrap();
        assert_eq!(port.get_ref().as_slice(), b"PING\r\nPONG\r\n");
    }

    #[test]
    fn test_stream_port_write_limit() {
        let mut port = StreamDataPort::new(Vec::new()).with_write_limit(4);
        port.write(b"1234").unwrap();

        let err = port.write(b"12345").unwrap_err();
        assert!(matches!(
            err,
            TransportError::BufferOverflow {
                len: 5,
                capacity: 4
            }
        ));
        assert_eq!(port.into_inner(), b"1234");
    }

    #[test]
    fn test_stream_port_io_error() {
        let mut port = StreamDataPort::new(BrokenPipe);
        let err = port.write(b"x").unwrap_err();
        assert!(matches!(err, TransportError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_ready_future() {
        let mut port = TransportFuture::ready(StreamDataPort::new(Vec::new()))
            .wait()
            .unwrap();
        assert!(port.write(b"ok").is_ok());
    }

    #[test]
    fn test_failed_future() {
        let result = TransportFuture::failed(io::Error::other("refused")).wait();
        assert!(matches!(result, Err(WriterError::AcquisitionFailed(_))));
    }

    #[test]
    fn test_dropped_promise_cancels() {
        let (promise, future) = transport_channel();
        drop(promise);
        assert!(matches!(
            future.wait(),
            Err(WriterError::AcquisitionCancelled)
        ));
    }

    #[test]
    fn test_promise_resolved_from_other_thread() {
        let (promise, future) = transport_channel();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            promise.complete(StreamDataPort::new(Vec::new()));
        });

        assert!(future.wait().is_ok());
        handle.join().unwrap();
    }
}
