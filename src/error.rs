use thiserror::Error as ThisError;

/// Represents a fatal error while reading an SMF file.
///
/// Carries the byte offset where parsing stopped along with the [`ErrorKind`].
/// Whenever an error is returned no part of the file is available, as the byte alignment of the
/// stream can no longer be trusted.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("at byte {position}: {kind}")]
pub struct Error {
    position: usize,
    kind: ErrorKind,
}
impl Error {
    /// Create a new error at the given byte offset.
    #[inline]
    pub fn new(position: usize, kind: ErrorKind) -> Error {
        Error { position, kind }
    }

    /// More information about the error itself.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The byte offset into the raw file where the error was detected.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the error was raised by the `strict` feature rather than by an unreadable file.
    #[inline]
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, ErrorKind::Malformed(_))
    }
}

/// The type of error that occurred while parsing.
///
/// All kinds except `Malformed` mean the file is not a MIDI file or is corrupted beyond the
/// point where events can be told apart.
/// Recoverable gaps (unknown meta events, system exclusive blocks, truncation) never produce an
/// error unless the `strict` feature is enabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ErrorKind {
    /// The first four bytes are not `MThd`.
    #[error("header validation failed (not midi or corrupt file), code: {found:#x}")]
    InvalidHeader {
        /// The big-endian value actually read.
        found: u32,
    },
    /// The file ends before the header fields could be read.
    #[error("file ends inside the midi header")]
    TruncatedHeader,
    /// A track chunk does not start with `MTrk`.
    #[error("track header validation failed (not midi or corrupt file), code: {found:#x}")]
    InvalidTrackHeader {
        /// The big-endian value actually read.
        found: u32,
    },
    /// An event status outside of the known classes.
    ///
    /// `None` means a data byte was found before any status byte, so there was no running status
    /// to reuse.
    #[error("unknown event {} detected, reading cancelled", status_code(.status))]
    UnknownEvent {
        /// The offending status byte.
        status: Option<u8>,
    },
    /// Non-fatal error, but the file is clearly corrupted.
    ///
    /// This kind of error is not emitted by default, only if the `strict` crate feature is
    /// enabled.
    #[error("malformed midi: {0}")]
    Malformed(&'static str),
}

/// Renders the high nibble of an optional status byte.
struct StatusCode(Option<u8>);
fn status_code(status: &Option<u8>) -> StatusCode {
    StatusCode(*status)
}
impl core::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.0 {
            Some(status) => write!(f, "{:#x}", status >> 4),
            None => f.write_str("without running status"),
        }
    }
}

#[allow(unused_macros)]
macro_rules! err_malformed {
    ($msg:expr) => {
        $crate::error::ErrorKind::Malformed($msg)
    };
}

/// The result type used by the MIDI parser.
pub type Result<T> = core::result::Result<T, Error>;
