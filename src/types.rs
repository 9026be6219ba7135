use core::convert::TryFrom;

use crate::error::{Error, Result};

/// Color space recorded in the header.
///
/// Informative only: decoded pixels are the same bytes whichever value is
/// stored.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum ColorSpace {
    /// sRGB color channels, linear alpha
    #[default]
    Srgb = 0,
    /// All four channels linear
    Linear = 1,
}

impl ColorSpace {
    /// Header byte for this color space.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Header reading: zero is sRGB, any other byte is taken as linear.
    pub(crate) const fn from_u8_lossy(colorspace: u8) -> Self {
        match colorspace {
            0 => Self::Srgb,
            _ => Self::Linear,
        }
    }
}

impl From<ColorSpace> for u8 {
    #[inline]
    fn from(colorspace: ColorSpace) -> Self {
        colorspace.as_u8()
    }
}

impl TryFrom<u8> for ColorSpace {
    type Error = Error;

    #[inline]
    fn try_from(colorspace: u8) -> Result<Self> {
        match colorspace {
            0 => Ok(Self::Srgb),
            1 => Ok(Self::Linear),
            _ => Err(Error::InvalidColorSpace { colorspace }),
        }
    }
}

/// Channel count recorded in the header.
///
/// Pixels are always RGBA in memory and in the chunk stream.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Channels {
    Rgb = 3,
    #[default]
    Rgba = 4,
}

impl Channels {
    /// Header byte for this channel count.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Channels> for u8 {
    #[inline]
    fn from(channels: Channels) -> Self {
        channels.as_u8()
    }
}

impl TryFrom<u8> for Channels {
    type Error = Error;

    #[inline]
    fn try_from(channels: u8) -> Result<Self> {
        match channels {
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            _ => Err(Error::InvalidChannels { channels }),
        }
    }
}
