//! Sequential, bounds-checked reading over a byte buffer that is already in memory.
//!
//! The cursor has no knowledge of MIDI semantics, it only provides the read shapes the SMF
//! parser is built on.
//! Reads never panic: running out of input is reported as `None`.

use crate::prelude::*;

/// A read position over an immutable byte buffer.
///
/// The position only moves backwards when explicitly asked to through
/// [`move_by`](#method.move_by), which the parser uses to un-read a single byte when running
/// status is detected.
/// Moving past the end of the buffer is allowed, any read from there on reports end of input.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}
impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `data`.
    #[inline]
    pub fn new(data: &'a [u8]) -> Cursor<'a> {
        Cursor { data, pos: 0 }
    }

    /// The current offset into the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The total length of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer holds no bytes at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// How many bytes are left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether every byte has been consumed.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    /// Move the position by `delta` bytes and return the new position.
    ///
    /// Negative deltas are allowed, but callers should only move back over bytes they just read.
    /// The position never goes below zero.
    #[inline]
    pub fn move_by(&mut self, delta: isize) -> usize {
        self.pos = self.pos.saturating_add_signed(delta);
        self.pos
    }

    /// Read up to `len` bytes, returning fewer if the buffer ends first.
    pub fn read_slice(&mut self, len: usize) -> &'a [u8] {
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let taken = &rest[..len.min(rest.len())];
        self.pos += taken.len();
        taken
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Read `len` bytes as one big-endian unsigned integer.
    ///
    /// If fewer than `len` bytes remain, the integer is built from the available bytes only.
    /// Returns `None` if no bytes could be read at all.
    /// Integers wider than 4 bytes keep their low 32 bits.
    pub fn read_int(&mut self, len: usize) -> Option<u32> {
        let bytes = self.read_slice(len);
        if bytes.is_empty() {
            return None;
        }
        Some(
            bytes
                .iter()
                .fold(0, |acc: u32, &byte| acc << 8 | u32::from(byte)),
        )
    }

    /// Read `len` bytes as text, mapping each byte to the character with the same code point.
    ///
    /// No validation is done, bytes above `0x7F` come through as Latin-1 characters.
    pub fn read_str(&mut self, len: usize) -> String {
        self.read_slice(len).iter().copied().map(char::from).collect()
    }

    /// Read a MIDI variable-length quantity.
    ///
    /// Bytes are consumed while their top bit is set, each contributing its bottom 7 bits, most
    /// significant first.
    /// Returns `None` if the input ends before the terminating byte.
    pub fn read_varlen(&mut self) -> Option<u32> {
        let mut int: u32 = 0;
        loop {
            let byte = self.read_u8()?;
            int = int << 7 | u32::from(bit_range(byte, 0..7));
            if bit_range(byte, 7..8) == 0 {
                break Some(int);
            }
        }
    }
}
