use zstd_safe::{ErrorCode, get_error_name};

/// A `Result` alias where the `Err` case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The errors that may occur when working with this crate.
pub struct Error {
    kind: Kind,
}

impl Error {
    pub(crate) fn format() -> Self {
        Self { kind: Kind::Format }
    }

    /// Returns true if the source does not begin with a valid Zstandard frame, or if no frames
    /// were found while building the index.
    pub fn is_format(&self) -> bool {
        matches!(self.kind, Kind::Format)
    }

    pub(crate) fn corrupt_frame() -> Self {
        Self {
            kind: Kind::CorruptFrame(None),
        }
    }

    pub(crate) fn corrupt_frame_code(code: ErrorCode) -> Self {
        Self {
            kind: Kind::CorruptFrame(Some(code)),
        }
    }

    /// Returns true if a streaming decompression call failed mid-frame, or a frame ended before
    /// its declared content size was reached.
    pub fn is_corrupt_frame(&self) -> bool {
        matches!(self.kind, Kind::CorruptFrame(_))
    }

    pub(crate) fn negative_seek() -> Self {
        Self {
            kind: Kind::NegativeSeek,
        }
    }

    /// Returns true if a seek resolved to a negative absolute position.
    pub fn is_negative_seek(&self) -> bool {
        matches!(self.kind, Kind::NegativeSeek)
    }

    pub(crate) fn beyond_end() -> Self {
        Self {
            kind: Kind::BeyondEnd,
        }
    }

    /// Returns true if a seek resolved past the end of the uncompressed stream.
    pub fn is_beyond_end(&self) -> bool {
        matches!(self.kind, Kind::BeyondEnd)
    }

    pub(crate) fn poisoned() -> Self {
        Self {
            kind: Kind::Poisoned,
        }
    }

    /// Returns true if this `Reader` suffered a [`CorruptFrame`](Self::is_corrupt_frame) error
    /// on a previous call and now rejects every operation.
    pub fn is_poisoned(&self) -> bool {
        matches!(self.kind, Kind::Poisoned)
    }

    /// Returns true if the error originates from an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, Kind::Io(_))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            Kind::Format => f.write_str("source is not a valid Zstandard stream"),
            Kind::CorruptFrame(None) => f.write_str("frame ended prematurely"),
            Kind::CorruptFrame(Some(code)) => write!(f, "corrupt frame: {}", get_error_name(*code)),
            Kind::NegativeSeek => f.write_str("seek resolved to a negative position"),
            Kind::BeyondEnd => f.write_str("seek resolved past the end of the stream"),
            Kind::Poisoned => f.write_str("reader is poisoned after a previous read error"),
            Kind::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self {
            kind: Kind::Io(value),
        }
    }
}

enum Kind {
    Format,
    CorruptFrame(Option<ErrorCode>),
    NegativeSeek,
    BeyondEnd,
    Poisoned,
    Io(std::io::Error),
}
