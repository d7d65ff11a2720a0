//! The categorized, per-track event model.
//!
//! A [`Track`] does not keep a single interleaved list of events. Every decoded event is routed
//! into one append-only collection depending on its kind, and every record keeps the delta time
//! it was encoded with.
//! Converting deltas into absolute time is left to the consumer; when the interleaved order is
//! needed, read the track through an [`EventIter`](crate::EventIter) instead.

use crate::{
    cursor::Cursor,
    error::Result,
    event::{EventKind, MetaMessage, MidiMessage, TrackEvent},
    prelude::*,
    primitive::{u2, u4, Fps},
    smf::EventIter,
};

/// The value stored in [`Note::on`] for note-on (`0x9`) events.
///
/// Note-off events always store `false`. Note-on events currently store `false` as well,
/// which is what existing consumers of this model were written against. The reliable way to
/// tell both apart is [`Note::kind`].
pub const NOTE_ON_FLAG: bool = false;

/// Whether a note record came from a note-on or a note-off status.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum NoteKind {
    /// Status nibble `0x9`.
    On,
    /// Status nibble `0x8`.
    Off,
}

/// A note-on or note-off event.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Note {
    pub delta: u32,
    pub channel: u4,
    pub key: u8,
    pub velocity: u8,
    /// Legacy on/off flag, see [`NOTE_ON_FLAG`].
    pub on: bool,
    pub kind: NoteKind,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct ProgramChange {
    pub delta: u32,
    pub channel: u4,
    pub program: u8,
}

/// A channel event kept in its raw form.
///
/// `kind` is the status nibble (`0xA`, `0xB`, `0xD` or `0xE`) and `data` holds the `N` data
/// bytes exactly as found in the file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct ChannelEvent<const N: usize> {
    pub delta: u32,
    pub channel: u4,
    pub kind: u8,
    pub data: [u8; N],
}

#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct MetaText {
    pub delta: u32,
    pub text: String,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Tempo {
    pub delta: u32,
    /// Microseconds per beat (quarter note).
    pub tempo: u32,
}
impl Tempo {
    /// The tempo expressed in beats per minute.
    ///
    /// Returns `None` for a zero tempo.
    pub fn beats_per_minute(&self) -> Option<f64> {
        if self.tempo == 0 {
            None
        } else {
            Some(60_000_000.0 / f64::from(self.tempo))
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct SmpteOffset {
    pub delta: u32,
    /// Raw hour byte. Bits 5 and 6 carry the frame rate, see [`fps`](#method.fps).
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
    /// Hundredths of a frame.
    pub subframe: u8,
}
impl SmpteOffset {
    /// The frame rate encoded in the hour byte.
    pub fn fps(&self) -> Fps {
        Fps::from_code(u2::from(bit_range(self.hour, 5..7)))
    }

    /// The hour with the frame rate bits masked off.
    pub fn hour_of_day(&self) -> u8 {
        bit_range(self.hour, 0..5)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TimeSignature {
    pub delta: u32,
    pub numerator: u8,
    /// The denominator as a power of two.
    pub denominator: u8,
    pub clocks_per_click: u8,
    pub notes_32nd_per_quarter: u8,
}
impl TimeSignature {
    /// The actual denominator, `2^denominator`.
    ///
    /// Returns `None` if it does not fit in a `u32`.
    pub fn beat_unit(&self) -> Option<u32> {
        1u32.checked_shl(u32::from(self.denominator))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct KeySignature {
    pub delta: u32,
    /// Negative for flats, positive for sharps.
    pub sharps: i8,
    pub minor: bool,
}

/// All events of a single `MTrk` chunk, grouped by category.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Track {
    pub notes: Vec<Note>,
    pub program_changes: Vec<ProgramChange>,
    /// Channel pressure events.
    pub one_byte_events: Vec<ChannelEvent<1>>,
    /// Polyphonic aftertouch, controller and pitch bend events.
    pub two_byte_events: Vec<ChannelEvent<2>>,
    pub text: Vec<MetaText>,
    pub copyright: Vec<MetaText>,
    pub track_name: Vec<MetaText>,
    pub instrument_name: Vec<MetaText>,
    pub lyric: Vec<MetaText>,
    pub marker: Vec<MetaText>,
    pub cue_point: Vec<MetaText>,
    pub program_name: Vec<MetaText>,
    pub tempo: Vec<Tempo>,
    pub smpte_offset: Vec<SmpteOffset>,
    pub time_signature: Vec<TimeSignature>,
    pub key_signature: Vec<KeySignature>,
}
impl Track {
    /// Read events until the end-of-track marker or the end of input.
    ///
    /// The cursor should be positioned right after the track chunk header.
    pub fn read(cursor: &mut Cursor) -> Result<Track> {
        let mut track = Track::default();
        for event in EventIter::new(cursor) {
            track.push(event?);
        }
        Ok(track)
    }

    /// Route an event into the collection for its category.
    ///
    /// Events without a collection (end of track, unknown meta events and system exclusive
    /// blocks) are dropped.
    pub fn push(&mut self, event: TrackEvent) {
        let delta = event.delta;
        match event.kind {
            EventKind::Midi { channel, message } => self.push_midi(delta, channel, message),
            EventKind::Meta(meta) => self.push_meta(delta, meta),
            EventKind::SysEx { .. } => {}
        }
    }

    fn push_midi(&mut self, delta: u32, channel: u4, message: MidiMessage) {
        let kind = message.status_nibble();
        match message {
            MidiMessage::NoteOff { key, vel } => self.notes.push(Note {
                delta,
                channel,
                key,
                velocity: vel,
                on: false,
                kind: NoteKind::Off,
            }),
            MidiMessage::NoteOn { key, vel } => self.notes.push(Note {
                delta,
                channel,
                key,
                velocity: vel,
                on: NOTE_ON_FLAG,
                kind: NoteKind::On,
            }),
            MidiMessage::ProgramChange { program } => self.program_changes.push(ProgramChange {
                delta,
                channel,
                program,
            }),
            MidiMessage::ChannelAftertouch { vel } => self.one_byte_events.push(ChannelEvent {
                delta,
                channel,
                kind,
                data: [vel],
            }),
            MidiMessage::Aftertouch { key: a, vel: b }
            | MidiMessage::Controller {
                controller: a,
                value: b,
            }
            | MidiMessage::PitchBend { data: [a, b] } => {
                self.two_byte_events.push(ChannelEvent {
                    delta,
                    channel,
                    kind,
                    data: [a, b],
                })
            }
        }
    }

    fn push_meta(&mut self, delta: u32, meta: MetaMessage) {
        let text = |text| MetaText { delta, text };
        match meta {
            MetaMessage::Text(t) => self.text.push(text(t)),
            MetaMessage::Copyright(t) => self.copyright.push(text(t)),
            MetaMessage::TrackName(t) => self.track_name.push(text(t)),
            MetaMessage::InstrumentName(t) => self.instrument_name.push(text(t)),
            MetaMessage::Lyric(t) => self.lyric.push(text(t)),
            MetaMessage::Marker(t) => self.marker.push(text(t)),
            MetaMessage::CuePoint(t) => self.cue_point.push(text(t)),
            MetaMessage::ProgramName(t) => self.program_name.push(text(t)),
            MetaMessage::Tempo(tempo) => self.tempo.push(Tempo { delta, tempo }),
            MetaMessage::SmpteOffset([hour, minute, second, frame, subframe]) => {
                self.smpte_offset.push(SmpteOffset {
                    delta,
                    hour,
                    minute,
                    second,
                    frame,
                    subframe,
                })
            }
            MetaMessage::TimeSignature(nn, dd, cc, bb) => {
                self.time_signature.push(TimeSignature {
                    delta,
                    numerator: nn,
                    denominator: dd,
                    clocks_per_click: cc,
                    notes_32nd_per_quarter: bb,
                })
            }
            MetaMessage::KeySignature(sharps, minor) => self.key_signature.push(KeySignature {
                delta,
                sharps,
                minor,
            }),
            MetaMessage::EndOfTrack | MetaMessage::Unknown { .. } => {}
        }
    }

    /// Total amount of stored records across every collection.
    pub fn event_count(&self) -> usize {
        self.notes.len()
            + self.program_changes.len()
            + self.one_byte_events.len()
            + self.two_byte_events.len()
            + self.text.len()
            + self.copyright.len()
            + self.track_name.len()
            + self.instrument_name.len()
            + self.lyric.len()
            + self.marker.len()
            + self.cue_point.len()
            + self.program_name.len()
            + self.tempo.len()
            + self.smpte_offset.len()
            + self.time_signature.len()
            + self.key_signature.len()
    }

    /// Whether every collection is empty.
    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }
}
