// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serialized messages handed to the writer.
//!
//! The writer never interprets message bytes. Producers either pass raw
//! serialized bytes or implement [`OutgoingMessage`] to serialize straight
//! into the accumulator without an intermediate allocation.

use crate::buffer::Accumulator;

/// A protocol message ready to be appended to an accumulator.
pub trait OutgoingMessage {
    /// Append the wire representation of this message.
    fn append_serialized(&self, out: &mut Accumulator);
}

impl OutgoingMessage for [u8] {
    fn append_serialized(&self, out: &mut Accumulator) {
        out.append(self);
    }
}

impl OutgoingMessage for Vec<u8> {
    fn append_serialized(&self, out: &mut Accumulator) {
        out.append(self);
    }
}

impl<const N: usize> OutgoingMessage for [u8; N] {
    fn append_serialized(&self, out: &mut Accumulator) {
        out.append(self);
    }
}

impl OutgoingMessage for str {
    fn append_serialized(&self, out: &mut Accumulator) {
        out.append(self.as_bytes());
    }
}

impl OutgoingMessage for String {
    fn append_serialized(&self, out: &mut Accumulator) {
        out.append(self.as_bytes());
    }
}

impl<T: OutgoingMessage + ?Sized> OutgoingMessage for &T {
    fn append_serialized(&self, out: &mut Accumulator) {
        (**self).append_serialized(out);
    }
}
