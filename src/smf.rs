//! Specific to the SMF packaging of MIDI streams.

use crate::{
    cursor::Cursor,
    error::{Error, ErrorKind, Result},
    event::TrackEvent,
    prelude::*,
    primitive::{Format, Timing},
    track::Track,
};

/// `MThd`, as a big-endian integer.
pub const HEADER_MAGIC: u32 = u32::from_be_bytes(*b"MThd");
/// `MTrk`, as a big-endian integer.
pub const TRACK_MAGIC: u32 = u32::from_be_bytes(*b"MTrk");

/// A parsed Standard Midi File.
///
/// Built in a single pass over a buffer that is already fully in memory.
/// There is no partial result: either the whole file is available or parsing failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Smf {
    pub header: Header,
    /// One entry per `MTrk` chunk that was actually found, which may be fewer than
    /// `header.track_count` if the file is truncated.
    pub tracks: Vec<Track>,
}
impl Smf {
    pub fn new(header: Header, tracks: Vec<Track>) -> Smf {
        Smf { header, tracks }
    }

    /// Parse a raw SMF file.
    ///
    /// Every fatal error is logged before being returned.
    pub fn parse(raw: &[u8]) -> Result<Smf> {
        Self::parse_impl(raw).map_err(|err| {
            log::error!("failed to parse midi file: {}", err);
            err
        })
    }

    fn parse_impl(raw: &[u8]) -> Result<Smf> {
        let mut cursor = Cursor::new(raw);
        let header = Header::read(&mut cursor)?;
        let mut tracks = Vec::new();
        for idx in 0..header.track_count {
            if !read_track_header(&mut cursor)? {
                log::debug!(
                    "file ended after {} of {} declared tracks",
                    idx,
                    header.track_count
                );
                break;
            }
            let track = Track::read(&mut cursor)?;
            log::trace!("track {} holds {} events", idx, track.event_count());
            tracks.push(track);
        }
        validate_smf(&header, tracks.len(), &cursor)?;
        Ok(Smf { header, tracks })
    }

    /// Get a track by index.
    #[inline]
    pub fn track(&self, idx: usize) -> Option<&Track> {
        self.tracks.get(idx)
    }
}

/// Parse a raw SMF file, discarding the reason for failure.
///
/// `None` means the input is not a readable MIDI file. The reason is still logged.
pub fn parse(raw: &[u8]) -> Option<Smf> {
    Smf::parse(raw).ok()
}

fn validate_smf(header: &Header, track_count: usize, cursor: &Cursor) -> Result<()> {
    if cfg!(feature = "strict") {
        ensure!(
            header.track_count as usize == track_count,
            Error::new(
                cursor.position(),
                err_malformed!("file has a different amount of tracks than declared")
            )
        );
    }
    Ok(())
}

/// Read a track chunk header, leaving the cursor at the first event.
///
/// Returns `Ok(false)` if the input ended exactly at a chunk boundary.
/// The declared chunk length is skipped but not trusted, events are read until the end-of-track
/// marker.
pub fn read_track_header(cursor: &mut Cursor) -> Result<bool> {
    let start = cursor.position();
    match cursor.read_int(4) {
        None => Ok(false),
        Some(TRACK_MAGIC) => {
            cursor.move_by(4);
            Ok(true)
        }
        Some(found) => Err(Error::new(start, ErrorKind::InvalidTrackHeader { found })),
    }
}

/// A MIDI file header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Header {
    pub format: Format,
    /// The amount of tracks declared by the header.
    pub track_count: u16,
    pub timing: Timing,
}
impl Header {
    pub fn new(format: Format, track_count: u16, timing: Timing) -> Header {
        Header {
            format,
            track_count,
            timing,
        }
    }

    /// Read and validate the `MThd` chunk, leaving the cursor at the first track chunk.
    ///
    /// The declared header length is skipped without being checked.
    pub fn read(cursor: &mut Cursor) -> Result<Header> {
        let start = cursor.position();
        let truncated = |cursor: &Cursor| Error::new(cursor.position(), ErrorKind::TruncatedHeader);
        let magic = cursor.read_int(4).ok_or_else(|| truncated(cursor))?;
        ensure!(
            magic == HEADER_MAGIC,
            Error::new(start, ErrorKind::InvalidHeader { found: magic })
        );
        cursor.move_by(4);
        let format = cursor.read_int(2).ok_or_else(|| truncated(cursor))?;
        let track_count = cursor.read_int(2).ok_or_else(|| truncated(cursor))?;
        let first = cursor.read_u8().ok_or_else(|| truncated(cursor))?;
        let second = cursor.read_u8().ok_or_else(|| truncated(cursor))?;
        Ok(Header::new(
            Format::from_int(format as u16),
            track_count as u16,
            Timing::from_bytes(first, second),
        ))
    }
}

/// An iterator of events over a single track.
///
/// Yields events in file order until the end-of-track marker (which is yielded too) or the end
/// of input.
/// After an error is yielded the iterator is fused, since the stream alignment is lost.
#[derive(Debug)]
pub struct EventIter<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    running_status: Option<u8>,
    done: bool,
}
impl<'c, 'a> EventIter<'c, 'a> {
    /// Start reading events at the cursor position, with no running status.
    pub fn new(cursor: &'c mut Cursor<'a>) -> EventIter<'c, 'a> {
        EventIter {
            cursor,
            running_status: None,
            done: false,
        }
    }

    /// Get the current running status of the track.
    pub fn running_status(&self) -> Option<u8> {
        self.running_status
    }

    /// The offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }
}
impl Iterator for EventIter<'_, '_> {
    type Item = Result<TrackEvent>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match TrackEvent::read(self.cursor, &mut self.running_status) {
            Ok(Some(ev)) => {
                self.done = ev.is_end_of_track();
                Some(Ok(ev))
            }
            Ok(None) => {
                self.done = true;
                if cfg!(feature = "strict") {
                    Some(Err(Error::new(
                        self.cursor.position(),
                        err_malformed!("reached eof before end of track"),
                    )))
                } else {
                    None
                }
            }
            Err(kind) => {
                self.done = true;
                Some(Err(Error::new(self.cursor.position(), kind)))
            }
        }
    }
}
