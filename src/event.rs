//! All sort of events and their parsers.

use crate::{
    cursor::Cursor,
    error::ErrorKind,
    prelude::*,
    primitive::u4,
};

/// Represents a parsed SMF track event.
///
/// Consists of a delta time (in MIDI ticks relative to the previous event) and the actual track
/// event.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TrackEvent {
    /// How many MIDI ticks after the previous event of any kind should this event fire.
    pub delta: u32,
    /// The type of event along with event-specific data.
    pub kind: EventKind,
}
impl TrackEvent {
    /// Reads the next event and updates `running_status`.
    ///
    /// Returns `Ok(None)` once the input runs out, which includes running out in the middle of
    /// an event.
    pub(crate) fn read(
        cursor: &mut Cursor,
        running_status: &mut Option<u8>,
    ) -> StdResult<Option<TrackEvent>, ErrorKind> {
        let delta = match cursor.read_varlen() {
            Some(delta) => delta,
            None => return Ok(None),
        };
        Ok(EventKind::read(cursor, running_status)?.map(|kind| TrackEvent { delta, kind }))
    }

    /// Whether this is the end-of-track marker.
    #[inline]
    pub fn is_end_of_track(&self) -> bool {
        self.kind == EventKind::Meta(MetaMessage::EndOfTrack)
    }
}

/// Represents the different kinds of SMF events and their associated data.
///
/// It notably does *not* include the timing of the event; the `TrackEvent` struct is responsible
/// for this.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventKind {
    /// A message associated to a MIDI channel carrying musical data.
    Midi {
        /// The MIDI channel that this event is associated with.
        channel: u4,
        /// The MIDI message type and associated data.
        message: MidiMessage,
    },
    /// A meta-message, giving extra information for correct playback, like tempo, song name,
    /// lyrics, etc...
    Meta(MetaMessage),
    /// A system exclusive or escape block.
    ///
    /// These are not decoded, only their length is consumed so that the following events stay
    /// aligned.
    SysEx {
        /// The raw status byte, in `0xF0..=0xFE`.
        status: u8,
        /// The declared length of the skipped block.
        len: u32,
    },
}
impl EventKind {
    fn read(
        cursor: &mut Cursor,
        running_status: &mut Option<u8>,
    ) -> StdResult<Option<EventKind>, ErrorKind> {
        //Read status
        let status = match cursor.read_u8() {
            None => return Ok(None),
            Some(byte) if byte >= 0x80 => {
                *running_status = Some(byte);
                Some(byte)
            }
            Some(_) => {
                //Running status, the byte belongs to the event data
                cursor.move_by(-1);
                *running_status
            }
        };
        let kind = match status {
            Some(0xFF) => MetaMessage::read(cursor)?.map(EventKind::Meta),
            Some(status @ 0x80..=0xEF) => MidiMessage::read(status, cursor)?.map(|message| {
                EventKind::Midi {
                    channel: u4::from(status),
                    message,
                }
            }),
            Some(status @ 0xF0..=0xFE) => {
                let len = match cursor.read_varlen() {
                    Some(len) => len,
                    None => return truncated(),
                };
                cursor.read_slice(len as usize);
                log::warn!("unimplemented {:#x} exclusive event, skipped {} bytes", status, len);
                Some(EventKind::SysEx { status, len })
            }
            status => bail!(ErrorKind::UnknownEvent { status }),
        };
        Ok(kind)
    }
}

/// Signals that the input ended in the middle of an event.
fn truncated<T>() -> StdResult<Option<T>, ErrorKind> {
    if cfg!(feature = "strict") {
        bail!(err_malformed!("unexpected eof in the middle of an event"))
    }
    Ok(None)
}

/// Represents a MIDI message, associated to a MIDI channel.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MidiMessage {
    /// Stop playing a note.
    NoteOff {
        /// The MIDI key to stop playing.
        key: u8,
        /// The velocity with which to stop playing it.
        vel: u8,
    },
    /// Start playing a note.
    NoteOn {
        /// The key to start playing.
        key: u8,
        /// The velocity (strength) with which to press it.
        ///
        /// Note that by convention a `NoteOn` message with a velocity of 0 is equivalent to a
        /// `NoteOff`.
        vel: u8,
    },
    /// Modify the velocity of a note after it has been played.
    Aftertouch {
        /// The key for which to modify its velocity.
        key: u8,
        /// The new velocity for the key.
        vel: u8,
    },
    /// Modify the value of a MIDI controller.
    Controller {
        /// The controller to modify.
        controller: u8,
        /// The value to set it to.
        value: u8,
    },
    /// Change the program (also known as instrument) for a channel.
    ProgramChange {
        /// The new program (instrument) to use for the channel.
        program: u8,
    },
    /// Change the note velocity of a whole channel at once, without starting new notes.
    ChannelAftertouch {
        /// The new velocity for all notes currently playing in the channel.
        vel: u8,
    },
    /// Set the pitch bend value for the entire channel.
    PitchBend {
        /// The raw data bytes, least significant first.
        data: [u8; 2],
    },
}
impl MidiMessage {
    /// Midi messages have a known length.
    pub(crate) fn msg_length(status: u8) -> usize {
        const LENGTH_BY_STATUS: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2, 1, 1, 2, 0];
        LENGTH_BY_STATUS[(status >> 4) as usize] as usize
    }

    /// Read the data bytes of a channel message.
    ///
    /// `status` must be within `0x80..=0xEF`.
    fn read(status: u8, cursor: &mut Cursor) -> StdResult<Option<MidiMessage>, ErrorKind> {
        let mut data = [0; 2];
        for byte in data.iter_mut().take(Self::msg_length(status)) {
            *byte = match cursor.read_u8() {
                Some(byte) => byte,
                None => return truncated(),
            };
        }
        let [a, b] = data;
        Ok(Some(match status >> 4 {
            0x8 => MidiMessage::NoteOff { key: a, vel: b },
            0x9 => MidiMessage::NoteOn { key: a, vel: b },
            0xA => MidiMessage::Aftertouch { key: a, vel: b },
            0xB => MidiMessage::Controller {
                controller: a,
                value: b,
            },
            0xC => MidiMessage::ProgramChange { program: a },
            0xD => MidiMessage::ChannelAftertouch { vel: a },
            _ => MidiMessage::PitchBend { data },
        }))
    }

    /// Get the raw status nibble for this MIDI message type.
    pub fn status_nibble(&self) -> u8 {
        match self {
            MidiMessage::NoteOff { .. } => 0x8,
            MidiMessage::NoteOn { .. } => 0x9,
            MidiMessage::Aftertouch { .. } => 0xA,
            MidiMessage::Controller { .. } => 0xB,
            MidiMessage::ProgramChange { .. } => 0xC,
            MidiMessage::ChannelAftertouch { .. } => 0xD,
            MidiMessage::PitchBend { .. } => 0xE,
        }
    }
}

/// A "meta message", as defined by the SMF spec.
/// These events carry metadata about the track, such as tempo, time signature, copyright, etc...
///
/// Text payloads are decoded one character per byte.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum MetaMessage {
    /// Arbitrary text associated to an instant.
    Text(String),
    /// A copyright notice.
    Copyright(String),
    /// Information about the name of the track.
    TrackName(String),
    /// Information about the name of the current instrument.
    InstrumentName(String),
    /// Arbitrary lyric information associated to an instant.
    Lyric(String),
    /// Arbitrary marker text associated to an instant.
    Marker(String),
    /// Arbitrary cue point text associated to an instant.
    CuePoint(String),
    /// Information about the name of the current program.
    ProgramName(String),
    /// Obligatory at track end.
    EndOfTrack,
    /// Amount of microseconds per beat (quarter note), read from the whole payload.
    Tempo(u32),
    /// Offset for the starting point of the track, as `[hour, minute, second, frame, subframe]`.
    ///
    /// The hour byte is kept raw, its top bits encode the frame rate.
    SmpteOffset([u8; 5]),
    /// In order of the MIDI specification, numerator, denominator exponent, MIDI clocks per
    /// click, 32nd notes per quarter.
    TimeSignature(u8, u8, u8, u8),
    /// As in the MIDI specification, negative numbers indicate number of flats and positive
    /// numbers indicate number of sharps.
    /// `false` indicates a major scale, `true` indicates a minor scale.
    KeySignature(i8, bool),
    /// An unknown or malformed meta-message, skipped over by its length.
    Unknown {
        /// The raw meta-message identifier byte.
        type_byte: u8,
        /// The declared payload length.
        len: u32,
    },
}
impl MetaMessage {
    fn read(cursor: &mut Cursor) -> StdResult<Option<MetaMessage>, ErrorKind> {
        let type_byte = match cursor.read_u8() {
            Some(type_byte) => type_byte,
            None => return truncated(),
        };
        if type_byte == 0x2F {
            //Skip the zero length byte
            cursor.move_by(1);
            return Ok(Some(MetaMessage::EndOfTrack));
        }
        let len = match cursor.read_varlen() {
            Some(len) => len,
            None => return truncated(),
        };
        let payload = cursor.read_slice(len as usize);
        let mut data = Cursor::new(payload);
        macro_rules! fixed {
            ($count:expr) => {{
                let mut bytes = [0; $count];
                if payload.len() < $count {
                    return Ok(Some(Self::too_short(type_byte, len)?));
                }
                bytes.copy_from_slice(data.read_slice($count));
                bytes
            }};
        }
        let msg = match type_byte {
            0x01 => MetaMessage::Text(data.read_str(payload.len())),
            0x02 => MetaMessage::Copyright(data.read_str(payload.len())),
            0x03 => MetaMessage::TrackName(data.read_str(payload.len())),
            0x04 => MetaMessage::InstrumentName(data.read_str(payload.len())),
            0x05 => MetaMessage::Lyric(data.read_str(payload.len())),
            0x06 => MetaMessage::Marker(data.read_str(payload.len())),
            0x07 => MetaMessage::CuePoint(data.read_str(payload.len())),
            0x08 => MetaMessage::ProgramName(data.read_str(payload.len())),
            0x51 => match data.read_int(payload.len()) {
                Some(tempo) => MetaMessage::Tempo(tempo),
                None => Self::too_short(type_byte, len)?,
            },
            0x54 => MetaMessage::SmpteOffset(fixed!(5)),
            0x58 => {
                let [nn, dd, cc, bb] = fixed!(4);
                MetaMessage::TimeSignature(nn, dd, cc, bb)
            }
            0x59 => {
                let [sf, mi] = fixed!(2);
                MetaMessage::KeySignature(sf as i8, mi != 0)
            }
            _ => {
                log::warn!("unimplemented meta event {:#x}, skipped {} bytes", type_byte, len);
                MetaMessage::Unknown { type_byte, len }
            }
        };
        Ok(Some(msg))
    }

    /// A known meta event whose payload cannot hold its fields.
    fn too_short(type_byte: u8, len: u32) -> StdResult<MetaMessage, ErrorKind> {
        if cfg!(feature = "strict") {
            bail!(err_malformed!("meta event payload too short"))
        }
        log::warn!("meta event {:#x} with short payload ({} bytes), skipped", type_byte, len);
        Ok(MetaMessage::Unknown { type_byte, len })
    }
}
