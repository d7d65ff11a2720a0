use crate::{
    num::u4, parse, Cursor, ErrorKind, EventIter, EventKind, Format, Fps, MetaMessage,
    MidiMessage, NoteKind, Smf, Timing, Track, NOTE_ON_FLAG,
};

const END_OF_TRACK: [u8; 4] = [0x00, 0xFF, 0x2F, 0x00];

fn header_chunk(format: u16, track_count: u16, division: [u8; 2]) -> Vec<u8> {
    let mut raw = b"MThd\0\0\0\x06".to_vec();
    raw.extend_from_slice(&format.to_be_bytes());
    raw.extend_from_slice(&track_count.to_be_bytes());
    raw.extend_from_slice(&division);
    raw
}

fn track_chunk(events: &[u8]) -> Vec<u8> {
    let mut raw = b"MTrk".to_vec();
    raw.extend_from_slice(&(events.len() as u32).to_be_bytes());
    raw.extend_from_slice(events);
    raw
}

/// Build a format 1 file at 480 ticks per beat.
fn smf_bytes(tracks: &[&[u8]]) -> Vec<u8> {
    let mut raw = header_chunk(1, tracks.len() as u16, [0x01, 0xE0]);
    for track in tracks {
        raw.extend(track_chunk(track));
    }
    raw
}

/// Parse a single-track file made of `events`.
macro_rules! single_track {
    ($($byte:expr),* $(,)?) => {{
        let events = [$($byte),*];
        let raw = smf_bytes(&[&events[..]]);
        let mut smf = Smf::parse(&raw).expect("failed to parse test file");
        assert_eq!(smf.tracks.len(), 1);
        smf.tracks.remove(0)
    }};
}

/// Encode a variable-length quantity.
fn varlen(int: u32) -> Vec<u8> {
    let mut bytes = vec![(int & 0x7F) as u8];
    let mut rest = int >> 7;
    while rest > 0 {
        bytes.insert(0, (rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    bytes
}

/// Test the byte cursor on its own.
mod cursor {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn varlen_known_values() {
        let cases: &[(&[u8], u32)] = &[
            (&[0x00], 0),
            (&[0x7F], 127),
            (&[0x81, 0x00], 128),
            (&[0xFF, 0x7F], 16383),
            (&[0x81, 0x80, 0x00], 16384),
            (&[0xFF, 0xFF, 0xFF, 0x7F], 0x0FFF_FFFF),
        ];
        for &(raw, expected) in cases {
            let mut cursor = Cursor::new(raw);
            assert_eq!(cursor.read_varlen(), Some(expected), "decoding {:x?}", raw);
            assert!(cursor.is_eof());
        }
    }

    #[test]
    fn varlen_encoded_values_decode_back() {
        for &int in &[0, 1, 0x7F, 0x80, 0x2000, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, 0x0FFF_FFFF] {
            let raw = varlen(int);
            assert_eq!(Cursor::new(&raw).read_varlen(), Some(int));
        }
    }

    #[test]
    fn varlen_stops_at_terminating_byte() {
        let mut cursor = Cursor::new(&[0x83, 0x60, 0x05]);
        assert_eq!(cursor.read_varlen(), Some(0x1E0));
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_varlen(), Some(5));
    }

    #[test]
    fn varlen_at_eof() {
        assert_eq!(Cursor::new(&[]).read_varlen(), None);
        assert_eq!(Cursor::new(&[0x81, 0x80]).read_varlen(), None);
    }

    #[test]
    fn read_int_is_big_endian() {
        let mut cursor = Cursor::new(&[0x4D, 0x54, 0x68, 0x64, 0x00, 0x06]);
        assert_eq!(cursor.read_int(4), Some(0x4D54_6864));
        assert_eq!(cursor.read_int(2), Some(6));
    }

    #[test]
    fn read_int_clamps_to_available_bytes() {
        let mut cursor = Cursor::new(&[0x12, 0x34]);
        assert_eq!(cursor.read_int(4), Some(0x1234));
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_int(1), None);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn read_int_of_zero_width_is_eof() {
        assert_eq!(Cursor::new(&[0x01]).read_int(0), None);
    }

    #[test]
    fn move_by_rewinds_and_skips() {
        let mut cursor = Cursor::new(&[1, 2, 3]);
        assert_eq!(cursor.read_u8(), Some(1));
        assert_eq!(cursor.move_by(-1), 0);
        assert_eq!(cursor.read_u8(), Some(1));
        assert_eq!(cursor.move_by(10), 11);
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.read_u8(), None);
        assert_eq!(cursor.read_slice(2), &[] as &[u8]);
        assert_eq!(cursor.move_by(-100), 0);
    }

    #[test]
    fn read_str_maps_bytes_to_chars() {
        let mut cursor = Cursor::new(&[b'H', b'i', 0xE9, b'!']);
        assert_eq!(cursor.read_str(3), "Hi\u{e9}");
        assert_eq!(cursor.read_str(5), "!");
        assert_eq!(cursor.read_str(1), "");
    }
}

/// Test header and chunk handling.
mod header {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_file() {
        let raw = smf_bytes(&[&END_OF_TRACK]);
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.track_count, 1);
        assert_eq!(smf.header.timing, Timing::Metrical(480));
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.tracks[0], Track::default());
        assert!(smf.tracks[0].is_empty());
    }

    #[test]
    fn rejects_non_midi_header() {
        let mut raw = smf_bytes(&[&END_OF_TRACK]);
        raw[..4].copy_from_slice(b"RIFF");
        let err = Smf::parse(&raw).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::InvalidHeader {
                found: u32::from_be_bytes(*b"RIFF")
            }
        );
        assert_eq!(err.position(), 0);
        assert!(parse(&raw).is_none());
    }

    #[test]
    fn rejects_empty_and_truncated_header() {
        assert_eq!(
            Smf::parse(&[]).unwrap_err().kind(),
            ErrorKind::TruncatedHeader
        );
        let header = header_chunk(1, 1, [0x01, 0xE0]);
        let raw = &header[..12];
        assert_eq!(
            Smf::parse(raw).unwrap_err().kind(),
            ErrorKind::TruncatedHeader
        );
    }

    #[test]
    fn unknown_format_is_kept() {
        let mut raw = header_chunk(7, 1, [0x00, 0x60]);
        raw.extend(track_chunk(&END_OF_TRACK));
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(smf.header.format, Format::Other(7));
        assert_eq!(smf.header.format.as_int(), 7);
        assert_eq!(smf.header.timing.ticks_per_beat(), Some(96));
    }

    #[test]
    fn smpte_division() {
        let mut raw = header_chunk(0, 1, [0xE8, 0x01]);
        raw.extend(track_chunk(&END_OF_TRACK));
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(
            smf.header.timing,
            Timing::Timecode {
                frames: 104,
                ticks_per_frame: 1
            }
        );
        assert_eq!(smf.header.timing.fps(), Some(Fps::Fps24));
        assert_eq!(smf.header.timing.ticks_per_beat(), None);
    }

    #[test]
    fn rejects_bad_track_magic() {
        let mut raw = header_chunk(1, 1, [0x01, 0xE0]);
        raw.extend_from_slice(b"MTrx\0\0\0\x04");
        raw.extend_from_slice(&END_OF_TRACK);
        let err = Smf::parse(&raw).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::InvalidTrackHeader {
                found: u32::from_be_bytes(*b"MTrx")
            }
        );
        assert_eq!(err.position(), 14);
    }

    #[test]
    #[cfg(not(feature = "strict"))]
    fn tolerates_fewer_tracks_than_declared() {
        let mut raw = header_chunk(1, 3, [0x01, 0xE0]);
        raw.extend(track_chunk(&END_OF_TRACK));
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(smf.header.track_count, 3);
        assert_eq!(smf.tracks.len(), 1);
    }

    #[test]
    #[cfg(not(feature = "strict"))]
    fn declared_track_count_does_not_reserve_tracks() {
        let raw = header_chunk(1, 0xFFFF, [0x01, 0xE0]);
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(smf.header.track_count, 0xFFFF);
        assert!(smf.tracks.is_empty());
        assert!(smf.tracks.capacity() <= raw.len());
    }

    #[test]
    #[cfg(feature = "strict")]
    fn strict_rejects_fewer_tracks_than_declared() {
        let mut raw = header_chunk(1, 3, [0x01, 0xE0]);
        raw.extend(track_chunk(&END_OF_TRACK));
        assert!(Smf::parse(&raw).unwrap_err().is_malformed());
    }

    #[test]
    fn tracks_are_kept_apart() {
        let first: &[u8] = &[0x00, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00];
        let second: &[u8] = &[0x00, 0xC0, 0x10, 0x00, 0xFF, 0x2F, 0x00];
        let raw = smf_bytes(&[first, second]);
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(smf.tracks[0].notes.len(), 1);
        assert!(smf.tracks[0].program_changes.is_empty());
        assert!(smf.tracks[1].notes.is_empty());
        assert_eq!(smf.track(1).unwrap().program_changes[0].program, 0x10);
        assert!(smf.track(2).is_none());
    }
}

/// Test the event decode loop.
mod events {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn running_status() {
        let track = single_track![
            0x00, 0x90, 0x3C, 0x40, //
            0x10, 0x3E, 0x50, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        assert_eq!(track.notes.len(), 2);
        for note in &track.notes {
            assert_eq!(note.channel, u4::new(0));
            assert_eq!(note.kind, NoteKind::On);
        }
        assert_eq!((track.notes[0].key, track.notes[0].velocity), (0x3C, 0x40));
        assert_eq!((track.notes[1].key, track.notes[1].velocity), (0x3E, 0x50));
        assert_eq!(track.notes[1].delta, 0x10);
    }

    #[test]
    fn data_without_status_is_fatal() {
        let raw = smf_bytes(&[&[0x00, 0x40, 0x40, 0x00, 0xFF, 0x2F, 0x00]]);
        let err = Smf::parse(&raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownEvent { status: None });
        assert!(parse(&raw).is_none());
    }

    #[test]
    fn deltas_are_not_accumulated() {
        let track = single_track![
            0x0A, 0x90, 0x3C, 0x40, //
            0x14, 0x80, 0x3C, 0x00, //
            0x81, 0x00, 0xC0, 0x05, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let deltas = track.notes.iter().map(|n| n.delta).collect::<Vec<_>>();
        assert_eq!(deltas, vec![10, 20]);
        assert_eq!(track.program_changes[0].delta, 128);
    }

    #[test]
    fn note_on_flag() {
        let track = single_track![
            0x00, 0x91, 0x3C, 0x40, //
            0x00, 0x81, 0x3C, 0x00, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let on = track.notes[0];
        let off = track.notes[1];
        assert_eq!(on.kind, NoteKind::On);
        assert_eq!(on.on, NOTE_ON_FLAG);
        assert!(!NOTE_ON_FLAG);
        assert_eq!(off.kind, NoteKind::Off);
        assert!(!off.on);
        assert_eq!(on.channel, u4::new(1));
    }

    #[test]
    fn channel_events_by_size() {
        let track = single_track![
            0x00, 0xC3, 0x2A, // program change
            0x00, 0xD3, 0x7F, // channel pressure
            0x00, 0xA3, 0x3C, 0x10, // aftertouch
            0x00, 0xB3, 0x07, 0x64, // controller
            0x00, 0xE3, 0x00, 0x40, // pitch bend
            0x00, 0xFF, 0x2F, 0x00,
        ];
        assert_eq!(track.program_changes.len(), 1);
        assert_eq!(track.program_changes[0].program, 0x2A);
        assert_eq!(track.program_changes[0].channel, u4::new(3));

        assert_eq!(track.one_byte_events.len(), 1);
        assert_eq!(track.one_byte_events[0].kind, 0xD);
        assert_eq!(track.one_byte_events[0].data, [0x7F]);

        let kinds = track
            .two_byte_events
            .iter()
            .map(|ev| (ev.kind, ev.data))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![(0xA, [0x3C, 0x10]), (0xB, [0x07, 0x64]), (0xE, [0x00, 0x40])]
        );
        assert!(track.two_byte_events.iter().all(|ev| ev.channel == u4::new(3)));
    }

    #[test]
    fn sysex_is_skipped() {
        let track = single_track![
            0x00, 0xF0, 0x03, 0x7E, 0x09, 0xF7, //
            0x05, 0xC1, 0x05, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        assert_eq!(track.event_count(), 1);
        assert_eq!(track.program_changes[0].delta, 5);
        assert_eq!(track.program_changes[0].channel, u4::new(1));
    }

    #[test]
    #[cfg(not(feature = "strict"))]
    fn oversized_sysex_ends_the_track() {
        let events: &[u8] = &[
            0x00, 0x90, 0x3C, 0x40, //
            0x00, 0xF0, 0x88, 0x80, 0x80, 0x80, 0x00, 0x7E, //
            0x00, 0xC0, 0x05, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let mut cursor = Cursor::new(events);
        let kinds = EventIter::new(&mut cursor)
            .map(|ev| ev.map(|ev| ev.kind))
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(kinds.len(), 2);
        assert_eq!(
            kinds[1],
            EventKind::SysEx {
                status: 0xF0,
                len: 0x8000_0000
            }
        );
        assert!(cursor.is_eof());

        let raw = smf_bytes(&[events]);
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.tracks[0].notes.len(), 1);
        assert!(smf.tracks[0].program_changes.is_empty());
    }

    #[test]
    fn meta_status_becomes_running_status() {
        let track = single_track![
            0x00, 0xFF, 0x01, 0x01, 0x41, //
            0x00, 0x02, 0x01, 0x42, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        assert_eq!(track.text.len(), 1);
        assert_eq!(track.text[0].text, "A");
        assert_eq!(track.copyright.len(), 1);
        assert_eq!(track.copyright[0].text, "B");
    }

    #[test]
    fn sysex_status_becomes_running_status() {
        let events: [u8; 14] = [
            0x00, 0xF0, 0x01, 0xF7, //
            0x00, 0x01, 0x7E, //
            0x00, 0xC0, 0x05, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let mut cursor = Cursor::new(&events);
        let kinds = EventIter::new(&mut cursor)
            .map(|ev| ev.map(|ev| ev.kind))
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            kinds[..2],
            [
                EventKind::SysEx { status: 0xF0, len: 1 },
                EventKind::SysEx { status: 0xF0, len: 1 },
            ]
        );
        assert_eq!(kinds.len(), 4);

        let track = single_track![
            0x00, 0xF0, 0x01, 0xF7, //
            0x00, 0x01, 0x7E, //
            0x00, 0xC0, 0x05, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        assert_eq!(track.event_count(), 1);
        assert_eq!(track.program_changes[0].program, 0x05);
    }

    #[test]
    fn unknown_meta_is_skipped() {
        let track = single_track![
            0x00, 0xFF, 0x7F, 0x02, 0xAA, 0xBB, //
            0x00, 0xB0, 0x07, 0x64, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        assert_eq!(track.event_count(), 1);
        assert_eq!(track.two_byte_events[0].data, [0x07, 0x64]);
    }

    #[test]
    fn end_of_track_stops_the_track() {
        let second: &[u8] = &[0x00, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00];
        let raw = smf_bytes(&[&END_OF_TRACK, second]);
        let smf = Smf::parse(&raw).unwrap();
        assert!(smf.tracks[0].is_empty());
        assert_eq!(smf.tracks[1].notes.len(), 1);
    }

    #[test]
    #[cfg(not(feature = "strict"))]
    fn truncated_event_ends_the_track() {
        let track = single_track![0x00, 0x90, 0x3C, 0x40, 0x00, 0x90, 0x3E];
        assert_eq!(track.notes.len(), 1);
    }

    #[test]
    #[cfg(feature = "strict")]
    fn strict_rejects_truncated_event() {
        let raw = smf_bytes(&[&[0x00, 0x90, 0x3C]]);
        assert!(Smf::parse(&raw).unwrap_err().is_malformed());
    }

    #[test]
    fn event_iter_keeps_file_order() {
        let raw: [u8; 23] = [
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, //
            0x60, 0x90, 0x3C, 0x40, //
            0x60, 0x80, 0x3C, 0x00, //
            0x00, 0xFF, 0x2F, 0x00, //
            0x00, 0x90, 0x3C, 0x40,
        ];
        let mut cursor = Cursor::new(&raw);
        let events = EventIter::new(&mut cursor)
            .collect::<crate::Result<Vec<_>>>()
            .unwrap();
        let kinds = events.iter().map(|ev| ev.kind.clone()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                EventKind::Meta(MetaMessage::Tempo(500_000)),
                EventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::NoteOn { key: 0x3C, vel: 0x40 },
                },
                EventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::NoteOff { key: 0x3C, vel: 0 },
                },
                EventKind::Meta(MetaMessage::EndOfTrack),
            ]
        );
        assert!(events[3].is_end_of_track());
        assert_eq!(cursor.position(), 19);
    }
}

/// Test meta event decoding.
mod meta {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta(type_byte: u8, data: &[u8]) -> Vec<u8> {
        let mut raw = vec![0x00, 0xFF, type_byte];
        raw.extend(varlen(data.len() as u32));
        raw.extend_from_slice(data);
        raw
    }

    fn track_of(metas: &[Vec<u8>]) -> Track {
        let mut events = metas.concat();
        events.extend_from_slice(&END_OF_TRACK);
        let raw = smf_bytes(&[&events]);
        Smf::parse(&raw).unwrap().tracks.remove(0)
    }

    #[test]
    fn text_events() {
        let track = track_of(&[
            meta(0x01, b"text"),
            meta(0x02, b"(c) nobody"),
            meta(0x03, b"Piano"),
            meta(0x04, b"Grand"),
            meta(0x05, b"la"),
            meta(0x06, b"Verse"),
            meta(0x07, b"cue"),
            meta(0x08, b"prog"),
        ]);
        assert_eq!(track.text[0].text, "text");
        assert_eq!(track.copyright[0].text, "(c) nobody");
        assert_eq!(track.track_name[0].text, "Piano");
        assert_eq!(track.instrument_name[0].text, "Grand");
        assert_eq!(track.lyric[0].text, "la");
        assert_eq!(track.marker[0].text, "Verse");
        assert_eq!(track.cue_point[0].text, "cue");
        assert_eq!(track.program_name[0].text, "prog");
        assert_eq!(track.event_count(), 8);
    }

    #[test]
    fn long_text_uses_varlen_length() {
        let name = [b'x'; 200];
        let track = track_of(&[meta(0x03, &name)]);
        assert_eq!(track.track_name[0].text.len(), 200);
    }

    #[test]
    fn tempo() {
        let track = track_of(&[meta(0x51, &[0x07, 0xA1, 0x20])]);
        assert_eq!(track.tempo[0].tempo, 500_000);
        assert_eq!(track.tempo[0].beats_per_minute(), Some(120.0));
    }

    #[test]
    fn smpte_offset() {
        let track = track_of(&[meta(0x54, &[0x61, 0x02, 0x03, 0x04, 0x05])]);
        let offset = track.smpte_offset[0];
        assert_eq!(offset.hour, 0x61);
        assert_eq!(offset.hour_of_day(), 1);
        assert_eq!(offset.fps(), Fps::Fps30);
        assert_eq!(
            (offset.minute, offset.second, offset.frame, offset.subframe),
            (2, 3, 4, 5)
        );
    }

    #[test]
    fn time_and_key_signature() {
        let track = track_of(&[
            meta(0x58, &[0x06, 0x03, 0x18, 0x08]),
            meta(0x59, &[0xFD, 0x01]),
        ]);
        let sig = track.time_signature[0];
        assert_eq!(sig.numerator, 6);
        assert_eq!(sig.beat_unit(), Some(8));
        assert_eq!(sig.clocks_per_click, 24);
        assert_eq!(sig.notes_32nd_per_quarter, 8);
        let key = track.key_signature[0];
        assert_eq!(key.sharps, -3);
        assert!(key.minor);
    }

    #[test]
    #[cfg(not(feature = "strict"))]
    fn short_payload_is_skipped() {
        let track = track_of(&[meta(0x58, &[0x04, 0x02]), meta(0x03, b"after")]);
        assert!(track.time_signature.is_empty());
        assert_eq!(track.track_name[0].text, "after");
    }

    #[test]
    #[cfg(feature = "strict")]
    fn strict_rejects_short_payload() {
        let mut events = meta(0x58, &[0x04, 0x02]);
        events.extend_from_slice(&END_OF_TRACK);
        let raw = smf_bytes(&[&events]);
        assert!(Smf::parse(&raw).unwrap_err().is_malformed());
    }
}
