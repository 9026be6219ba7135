use core::convert::{TryFrom, TryInto};

use crate::consts::{QOI_HEADER_SIZE, QOI_MAGIC, QOI_PADDING_SIZE, QOI_PIXELS_MAX};
use crate::error::{Error, Result};
use crate::types::{Channels, ColorSpace};
use crate::utils::unlikely;

/// Image header: dimensions, channels, color space.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of 8-bit channels recorded for the image
    pub channels: Channels,
    /// Color space (informative field, doesn't affect encoding)
    pub colorspace: ColorSpace,
}

#[inline]
fn u32_from_be(v: &[u8]) -> u32 {
    u32::from_be_bytes([v[0], v[1], v[2], v[3]])
}

#[inline]
const fn pixel_count(width: u32, height: u32) -> Option<usize> {
    let n = (width as u64) * (height as u64);
    if n > QOI_PIXELS_MAX as u64 {
        None
    } else {
        Some(n as usize)
    }
}

impl Header {
    /// Size of the encoded header in bytes.
    pub const SIZE: usize = QOI_HEADER_SIZE;

    /// Creates a new header and validates image dimensions.
    #[inline]
    pub fn try_new(
        width: u32, height: u32, channels: Channels, colorspace: ColorSpace,
    ) -> Result<Self> {
        if unlikely(width == 0 || height == 0) {
            return Err(Error::EmptyImage { width, height });
        } else if unlikely(pixel_count(width, height).is_none()) {
            return Err(Error::ImageTooLarge { width, height });
        }
        Ok(Self { width, height, channels, colorspace })
    }

    /// Creates a new header with modified channels.
    #[inline]
    pub const fn with_channels(mut self, channels: Channels) -> Self {
        self.channels = channels;
        self
    }

    /// Creates a new header with modified color space.
    #[inline]
    pub const fn with_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.colorspace = colorspace;
        self
    }

    /// Serializes the header into a bytes array.
    #[inline]
    pub fn encode(&self) -> [u8; QOI_HEADER_SIZE] {
        let mut out = [0; QOI_HEADER_SIZE];
        out[..4].copy_from_slice(&QOI_MAGIC);
        out[4..8].copy_from_slice(&self.width.to_be_bytes());
        out[8..12].copy_from_slice(&self.height.to_be_bytes());
        out[12] = self.channels.into();
        out[13] = self.colorspace.into();
        out
    }

    /// Deserializes the header from a byte slice and validates it.
    ///
    /// Only the magic, the dimensions and the channel count are checked.
    #[inline]
    pub fn decode(data: impl AsRef<[u8]>) -> Result<Self> {
        let data = data.as_ref();
        if unlikely(data.len() < QOI_HEADER_SIZE) {
            return Err(Error::UnexpectedBufferEnd);
        }
        let magic: [u8; 4] = data[..4].try_into().map_err(|_| Error::UnexpectedBufferEnd)?;
        let width = u32_from_be(&data[4..8]);
        let height = u32_from_be(&data[8..12]);
        let channels = data[12];
        let colorspace = data[13];

        if unlikely(magic != QOI_MAGIC) {
            return Err(Error::InvalidMagic { magic });
        } else if unlikely(width == 0 || height == 0 || pixel_count(width, height).is_none()) {
            return Err(Error::InvalidDimensions { width, height });
        }
        let channels = Channels::try_from(channels)
            .map_err(|_| Error::InvalidHeaderChannels { channels })?;
        if unlikely(colorspace > 1) {
            log::warn!("unknown colorspace byte {} in header, reading as linear", colorspace);
        }
        let colorspace = ColorSpace::from_u8_lossy(colorspace);
        Ok(Self { width, height, channels, colorspace })
    }

    /// Returns a number of pixels in the image.
    #[inline]
    pub const fn n_pixels(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Returns the size of the decoded RGBA image in bytes.
    #[inline]
    pub const fn n_bytes(&self) -> usize {
        self.n_pixels().saturating_mul(4)
    }

    /// The maximum number of bytes the encoded image will take.
    ///
    /// Every pixel takes at most 5 bytes (a literal RGBA chunk).
    #[inline]
    pub const fn encode_max_len(&self) -> usize {
        QOI_HEADER_SIZE
            .saturating_add(self.n_pixels().saturating_mul(5))
            .saturating_add(QOI_PADDING_SIZE)
    }
}
