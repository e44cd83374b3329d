// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer configuration.
//!
//! Supports both programmatic and file-based configuration.
//!
//! # Example
//!
//! ```
//! use hdds_outbound::WriterConfig;
//!
//! let config = WriterConfig {
//!     max_messages_in_outgoing_queue: 1000,
//!     discard_messages_when_outgoing_queue_full: true,
//!     ..Default::default()
//! };
//! assert_eq!(config.discard_threshold(), Some(1000));
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default initial capacity of each accumulator (64 KB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default discard threshold, in messages.
pub const DEFAULT_MAX_MESSAGES_IN_OUTGOING_QUEUE: u64 = 5000;

/// Outbound writer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Initial capacity hint for the normal and staging accumulators.
    ///
    /// Accumulators grow past this as needed; it only avoids early
    /// reallocation.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Pending-message count at which normal-mode appends are dropped.
    ///
    /// Only consulted when `discard_messages_when_outgoing_queue_full` is set.
    #[serde(default = "default_max_messages")]
    pub max_messages_in_outgoing_queue: u64,

    /// Enable the backpressure gate.
    #[serde(default)]
    pub discard_messages_when_outgoing_queue_full: bool,

    /// Name given to the dedicated writer thread.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_max_messages() -> u64 {
    DEFAULT_MAX_MESSAGES_IN_OUTGOING_QUEUE
}

fn default_thread_name() -> String {
    "hdds-outbound-writer".to_string()
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            max_messages_in_outgoing_queue: default_max_messages(),
            discard_messages_when_outgoing_queue_full: false,
            thread_name: default_thread_name(),
        }
    }
}

impl WriterConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Discard threshold for the normal accumulator (`None` = unbounded).
    pub fn discard_threshold(&self) -> Option<u64> {
        self.discard_messages_when_outgoing_queue_full
            .then_some(self.max_messages_in_outgoing_queue)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be non-zero".into()));
        }

        if self.discard_messages_when_outgoing_queue_full && self.max_messages_in_outgoing_queue == 0
        {
            return Err(ConfigError::Invalid(
                "max_messages_in_outgoing_queue must be non-zero when discarding is enabled"
                    .into(),
            ));
        }

        if self.thread_name.is_empty() {
            return Err(ConfigError::Invalid("thread_name must not be empty".into()));
        }

        Ok(())
    }
}
