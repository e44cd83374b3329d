// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the outbound writer.
//!
//! Backpressure drops are not errors: `append` reports them through its
//! return value. Everything here is either a transport fault (fatal to the
//! writer loop) or a lifecycle failure.

use std::io;
use thiserror::Error;

/// Errors raised by a [`DataPort`](crate::DataPort) write.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A single write exceeded the port's buffer capacity.
    #[error("buffer overflow: {len} bytes exceeds capacity {capacity}")]
    BufferOverflow { len: usize, capacity: usize },
}

/// Fatal writer failures, reported once to
/// [`ConnectionHooks::handle_communication_issue`](crate::ConnectionHooks::handle_communication_issue).
#[derive(Debug, Error)]
pub enum WriterError {
    /// Writing a drained accumulator to the transport failed.
    #[error("transport write failed: {0}")]
    Transport(#[from] TransportError),

    /// The transport future resolved with an error.
    #[error("transport acquisition failed: {0}")]
    AcquisitionFailed(#[source] io::Error),

    /// The transport promise was dropped before resolving.
    #[error("transport acquisition cancelled")]
    AcquisitionCancelled,

    /// The dedicated writer thread could not be spawned.
    #[error("failed to spawn writer thread: {0}")]
    Spawn(#[source] io::Error),
}

impl WriterError {
    /// True for faults that happened after the transport was acquired.
    pub fn is_transport_fault(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::BufferOverflow {
            len: 2048,
            capacity: 1024,
        };
        assert_eq!(
            err.to_string(),
            "buffer overflow: 2048 bytes exceeds capacity 1024"
        );

        let err = TransportError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(err.to_string().contains("pipe"));
    }

    #[test]
    fn test_writer_error_source_chain() {
        use std::error::Error as _;

        let err = WriterError::from(TransportError::Io(io::Error::other("reset")));
        assert!(err.is_transport_fault());
        assert!(err.source().is_some());

        let err = WriterError::AcquisitionCancelled;
        assert!(!err.is_transport_fault());
        assert!(err.source().is_none());
    }
}
