// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS Outbound Writer
//!
//! Stages outgoing protocol bytes from many application threads and drains
//! them into a connection's transport from one dedicated writer thread.
//!
//! # Features
//!
//! - **Two lanes**: a normal accumulator for live traffic and a staging
//!   accumulator filled while the connection is reconnecting
//! - **Backpressure**: optional discard threshold on application messages
//! - **Lock-step hand-off**: one lock, two condition variables, a single
//!   presence slot between producers and the writer
//! - **Lifecycle**: restartable writer thread with a completion handle and
//!   fault reporting to the owning connection
//!
//! # Quick Start
//!
//! ```
//! use hdds_outbound::{
//!     ConnectionWriter, LockstepWriter, StreamDataPort, TransportFuture, WriterConfig,
//!     WriterContext, WriterError, WriterExit, WriterMetrics,
//! };
//! use std::sync::Arc;
//!
//! let ctx = WriterContext::new(
//!     Arc::new(WriterMetrics::new()),
//!     Arc::new(|err: &WriterError| eprintln!("connection fault: {}", err)),
//! );
//! let writer = LockstepWriter::new(&WriterConfig::default(), ctx);
//!
//! writer
//!     .start(TransportFuture::ready(StreamDataPort::new(std::io::sink())))
//!     .unwrap();
//! assert!(writer.append(&"PUB greet 5\r\nhello\r\n"));
//!
//! assert_eq!(writer.stop().wait(), WriterExit::Stopped);
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! buffer_size = 65536
//! max_messages_in_outgoing_queue = 5000
//! discard_messages_when_outgoing_queue_full = true
//! thread_name = "hdds-outbound-writer"
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod gate;
mod handoff;
pub mod message;
pub mod metrics;
pub mod transport;
pub mod writer;

pub use buffer::{Accumulator, BufferStore, Lane};
pub use config::WriterConfig;
pub use error::{ConfigError, TransportError, WriterError};
pub use gate::BackpressureGate;
pub use message::OutgoingMessage;
pub use metrics::{StatisticsSink, WriterMetrics, WriterMetricsSnapshot};
pub use transport::{
    transport_channel, BoxedDataPort, DataPort, StreamDataPort, TransportFuture, TransportPromise,
};
pub use writer::{
    ConnectionHooks, ConnectionWriter, LockstepWriter, WriterCompletion, WriterContext,
    WriterExit, WriterState,
};
