//! Small building-block values found in the SMF header and in channel events.

use crate::prelude::*;

/// Slightly restricted integers.
macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$inner> for $name {
            /// Lossy conversion, loses the top bits.
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::new(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {restricted.0}
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl PartialEq<$inner> for $name {
            fn eq(&self, rhs: &$inner) -> bool {
                self.0 == *rhs
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name(Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name(raw & Self::MASK)
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                } else {
                    None
                }
            }

            /// Get the inner integer out of the wrapper.
            #[inline]
            pub fn as_int(self) -> $inner {
                self.0
            }
        }
    };
}
restricted_int! {
    /// A 4-bit integer type, used for MIDI channels.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 2-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top 6 bits are always zero.
    u2: u8 => 2
}

/// The order in which tracks should be laid out when playing back this SMF file.
///
/// The format word is read as-is and never rejected, unknown values are kept in
/// `Format::Other`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// Format 0: a single multi-channel track.
    SingleTrack,
    /// Format 1: several tracks that should be played simultaneously.
    ///
    /// Usually the first track controls tempo and other song metadata.
    Parallel,
    /// Format 2: several tracks, each one a separate song.
    Sequential,
    /// Any other format word.
    Other(u16),
}
impl Format {
    /// Interpret a raw format word.
    pub fn from_int(raw: u16) -> Format {
        match raw {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => Format::Sequential,
            other => Format::Other(other),
        }
    }

    /// The raw format word.
    pub fn as_int(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
            Format::Other(raw) => raw,
        }
    }
}

/// The timing for an SMF file.
/// This can be in ticks/beat or ticks/frame.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Timing {
    /// Ticks per beat (quarter note), built from both division bytes.
    Metrical(u16),
    /// SMPTE-based timing, selected when the top bit of the first division byte is set.
    Timecode {
        /// The first division byte minus `128`.
        ///
        /// The full byte is the negated frame rate in two's complement, use
        /// [`fps`](#method.fps) to decode it.
        frames: u8,
        /// Ticks in each frame, the second division byte as-is.
        ticks_per_frame: u8,
    },
}
impl Timing {
    /// Interpret the two time division bytes.
    pub fn from_bytes(first: u8, second: u8) -> Timing {
        if bit_range(first, 7..8) != 0 {
            Timing::Timecode {
                frames: first - 128,
                ticks_per_frame: second,
            }
        } else {
            Timing::Metrical(u16::from_be_bytes([first, second]))
        }
    }

    /// Ticks per beat, if the timing is metrical.
    pub fn ticks_per_beat(&self) -> Option<u16> {
        match *self {
            Timing::Metrical(tpb) => Some(tpb),
            Timing::Timecode { .. } => None,
        }
    }

    /// Decode the frame rate of a timecode timing.
    ///
    /// Returns `None` for metrical timings and for non-standard frame rates.
    pub fn fps(&self) -> Option<Fps> {
        match *self {
            Timing::Metrical(_) => None,
            Timing::Timecode { frames, .. } => {
                let negated = (frames | 0x80) as i8;
                Fps::from_int(negated.unsigned_abs())
            }
        }
    }
}

/// One of the four FPS values available for SMPTE times, as defined by the MIDI standard.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Fps {
    /// 24 frames per second.
    Fps24,
    /// 25 frames per second.
    Fps25,
    /// Actually `29.97 = 30 / 1.001` frames per second.
    ///
    /// Quite an exotic value because of interesting historical reasons.
    Fps29,
    /// 30 frames per second.
    Fps30,
}
impl Fps {
    /// Does the conversion from a 2-bit fps code to an `Fps` value.
    pub(crate) fn from_code(code: u2) -> Fps {
        match code.as_int() {
            0 => Fps::Fps24,
            1 => Fps::Fps25,
            2 => Fps::Fps29,
            _ => Fps::Fps30,
        }
    }

    /// Converts an integer representing the semantic fps to an `Fps` value (ie. `24` -> `Fps24`).
    #[inline]
    pub fn from_int(raw: u8) -> Option<Fps> {
        Some(match raw {
            24 => Fps::Fps24,
            25 => Fps::Fps25,
            29 => Fps::Fps29,
            30 => Fps::Fps30,
            _ => return None,
        })
    }

    /// Get the integral approximate fps out.
    #[inline]
    pub fn as_int(self) -> u8 {
        match self {
            Fps::Fps24 => 24,
            Fps::Fps25 => 25,
            Fps::Fps29 => 29,
            Fps::Fps30 => 30,
        }
    }

    /// Get the actual `f32` fps out.
    #[inline]
    pub fn as_f32(self) -> f32 {
        match self {
            Fps::Fps24 => 24.0,
            Fps::Fps25 => 25.0,
            Fps::Fps29 => 30.0 / 1.001,
            Fps::Fps30 => 30.0,
        }
    }
}
impl From<Fps> for u8 {
    fn from(x: Fps) -> Self {
        x.as_int()
    }
}
