//! # Overview
//!
//! `smfread` is a lenient, single-pass Standard Midi File (SMF) reader.
//! It turns the raw bytes of a `.mid` file into a [`Smf`] whose tracks keep their events
//! grouped by category (notes, program changes, tempo changes, text, ...).
//!
//! ```rust
//! use smfread::{Smf, Timing};
//!
//! let bytes = [
//!     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 1, 0x01, 0xE0,
//!     b'M', b'T', b'r', b'k', 0, 0, 0, 4, 0x00, 0xFF, 0x2F, 0x00,
//! ];
//! let smf = Smf::parse(&bytes).unwrap();
//!
//! assert_eq!(smf.header.timing, Timing::Metrical(480));
//! for (i, track) in smf.tracks.iter().enumerate() {
//!     println!("track {} has {} notes", i, track.notes.len());
//! }
//! ```
//!
//! # About delta times
//!
//! Every record stores the delta time it was encoded with, that is, the amount of ticks since
//! the previous event of *any* kind in the same track.
//! Accumulating deltas into absolute time is up to the consumer.
//! Since the categorized collections lose the interleaved order, use [`EventIter`] over a
//! [`Cursor`] when that order matters.
//!
//! # About errors
//!
//! Only three situations make parsing fail: a bad `MThd` magic, a bad `MTrk` magic and an
//! event with no usable status.
//! Unknown meta events and system exclusive blocks are skipped over by their length, and a file
//! that ends early simply yields fewer tracks or fewer events.
//! Every failure and every skipped event is reported through the `log` facade.
//!
//! # About features
//!
//! - The `std` feature (enabled by default) implements `std::error::Error` for [`Error`].
//!   Without it the crate is `no_std + alloc`.
//! - The `strict` feature rejects files that can be read but are clearly corrupted, raising
//!   errors of the kind `ErrorKind::Malformed`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
#[macro_use]
mod error;

mod prelude {
    pub(crate) use alloc::{string::String, vec::Vec};
    pub(crate) use core::{fmt, ops, result::Result as StdResult};

    pub(crate) fn bit_range<T>(val: T, range: ops::Range<u32>) -> T
    where
        T: From<u8>
            + ops::Shr<u32, Output = T>
            + ops::Shl<u32, Output = T>
            + ops::Not<Output = T>
            + ops::BitAnd<Output = T>,
    {
        let mask = !((!T::from(0)) << (range.end - range.start));
        (val >> range.start) & mask
    }
}

mod cursor;
mod event;
mod primitive;
mod smf;
mod track;

pub use crate::{
    cursor::Cursor,
    error::{Error, ErrorKind, Result},
    event::{EventKind, MetaMessage, MidiMessage, TrackEvent},
    primitive::{Format, Fps, Timing},
    smf::{parse, read_track_header, EventIter, Header, Smf, HEADER_MAGIC, TRACK_MAGIC},
    track::{
        ChannelEvent, KeySignature, MetaText, Note, NoteKind, ProgramChange, SmpteOffset, Tempo,
        TimeSignature, Track, NOTE_ON_FLAG,
    },
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u2, u4};
}

#[cfg(test)]
mod test;
