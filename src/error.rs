use core::convert::Infallible;
use core::fmt::{self, Display};

use crate::consts::{QOI_MAGIC, QOI_PADDING_SIZE};

/// Broad classification of an [`Error`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// The caller passed an unusable image or buffer; nothing was written.
    InvalidInput,
    /// The encoded stream is malformed; no decoded pixels are returned.
    Format,
    /// The underlying reader or writer failed.
    Io,
}

#[derive(Debug)]
pub enum Error {
    InvalidChannels { channels: u8 },
    InvalidColorSpace { colorspace: u8 },
    EmptyImage { width: u32, height: u32 },
    ImageTooLarge { width: u32, height: u32 },
    InvalidImageLength { size: usize, width: u32, height: u32 },
    OutputBufferTooSmall { size: usize, required: usize },
    InvalidMagic { magic: [u8; 4] },
    InvalidDimensions { width: u32, height: u32 },
    InvalidHeaderChannels { channels: u8 },
    UnexpectedBufferEnd,
    RunOverflow { run: usize, remaining: usize },
    Integrity(Warning),
    IoError(std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidChannels { .. }
            | Self::InvalidColorSpace { .. }
            | Self::EmptyImage { .. }
            | Self::ImageTooLarge { .. }
            | Self::InvalidImageLength { .. }
            | Self::OutputBufferTooSmall { .. } => ErrorKind::InvalidInput,
            Self::InvalidMagic { .. }
            | Self::InvalidDimensions { .. }
            | Self::InvalidHeaderChannels { .. }
            | Self::UnexpectedBufferEnd
            | Self::RunOverflow { .. }
            | Self::Integrity(_) => ErrorKind::Format,
            Self::IoError(_) => ErrorKind::Io,
        }
    }

    pub const fn is_format_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Format)
    }

    pub const fn is_invalid_input(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidInput)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::InvalidChannels { channels } => {
                write!(f, "invalid number of channels: {} (expected 3 or 4)", channels)
            }
            Self::InvalidColorSpace { colorspace } => {
                write!(f, "invalid color space: {} (expected 0 or 1)", colorspace)
            }
            Self::EmptyImage { width, height } => {
                write!(f, "image contains no pixels: {}x{}", width, height)
            }
            Self::ImageTooLarge { width, height } => {
                write!(f, "image is too large: {}x{} (pixel count overflows u32)", width, height)
            }
            Self::InvalidImageLength { size, width, height } => {
                write!(f, "invalid image length: {} bytes for {}x{} RGBA", size, width, height)
            }
            Self::OutputBufferTooSmall { size, required } => {
                write!(f, "output buffer size too small: {} (minimum required: {})", size, required)
            }
            Self::InvalidMagic { magic } => {
                write!(f, "invalid magic: expected {:?}, got {:?}", QOI_MAGIC, magic)
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid image dimensions in header: {}x{}", width, height)
            }
            Self::InvalidHeaderChannels { channels } => {
                write!(f, "invalid number of channels in header: {}", channels)
            }
            Self::UnexpectedBufferEnd => {
                write!(f, "unexpected input buffer end while decoding")
            }
            Self::RunOverflow { run, remaining } => {
                write!(f, "run of {} pixels overflows image ({} pixels remaining)", run, remaining)
            }
            Self::Integrity(ref warning) => {
                write!(f, "stream integrity check failed: {}", warning)
            }
            Self::IoError(ref err) => {
                write!(f, "i/o error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        unreachable!()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}

/// Problem with the bytes following the last pixel chunk.
///
/// The decoded image is still complete when one of these is reported.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Warning {
    /// Eight bytes follow the pixel data, but they are not the end marker.
    EndMarkerMismatch,
    /// Fewer than eight bytes follow the pixel data.
    EndMarkerTruncated { len: usize },
    /// Extra bytes follow the end marker.
    TrailingBytes { count: usize },
}

impl Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::EndMarkerMismatch => {
                write!(f, "end-of-stream marker mismatch")
            }
            Self::EndMarkerTruncated { len } => {
                write!(f, "end-of-stream marker truncated: {} of {} bytes", len, QOI_PADDING_SIZE)
            }
            Self::TrailingBytes { count } => {
                write!(f, "{} trailing bytes after end-of-stream marker", count)
            }
        }
    }
}
