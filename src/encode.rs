use core::convert::TryInto;
use std::io::Write;

use bytemuck::try_cast_slice;

use crate::consts::{
    QOI_HEADER_SIZE, QOI_OP_RGB, QOI_OP_RGBA, QOI_PADDING, QOI_PADDING_SIZE, QOI_RUN_MAX,
};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::ops::{op_index, op_run, pack_diff, pack_luma};
use crate::pixel::{Pixel, RunningState};
use crate::types::{Channels, ColorSpace};
use crate::utils::{unlikely, BytesMut, GenericWriter, Writer};

/// Greedy per-pixel chunk selection.
pub(crate) struct ChunkEncoder {
    state: RunningState,
    run: u8,
}

impl ChunkEncoder {
    pub const fn new() -> Self {
        Self { state: RunningState::new(), run: 0 }
    }

    #[cfg(test)]
    pub const fn state(&self) -> &RunningState {
        &self.state
    }

    #[inline]
    fn flush_run<W: Writer>(&mut self, buf: &mut W) -> Result<()> {
        if self.run != 0 {
            buf.write_one(op_run(self.run))?;
            self.run = 0;
            // same cache update the decoder performs for a run chunk
            let px = self.state.prev;
            self.state.push(px);
        }
        Ok(())
    }

    #[inline]
    pub fn push<W: Writer>(&mut self, px: Pixel, buf: &mut W) -> Result<()> {
        let px_prev = self.state.prev;
        if px == px_prev {
            self.run += 1;
            if self.run == QOI_RUN_MAX {
                self.flush_run(buf)?;
            }
            return Ok(());
        }
        self.flush_run(buf)?;

        let index_pos = px.hash_index();
        if self.state.cache.get(index_pos) == px {
            buf.write_one(op_index(index_pos))?;
        } else if px.a == px_prev.a {
            let (dr, dg, db) = px.rgb_sub(px_prev);
            if let Some(b1) = pack_diff(dr, dg, db) {
                buf.write_one(b1)?;
            } else if let Some(luma) = pack_luma(dr, dg, db) {
                buf.write_many(&luma)?;
            } else {
                buf.write_many(&[QOI_OP_RGB, px.r, px.g, px.b])?;
            }
        } else {
            buf.write_many(&[QOI_OP_RGBA, px.r, px.g, px.b, px.a])?;
        }
        self.state.push(px);
        Ok(())
    }

    #[inline]
    pub fn finish<W: Writer>(&mut self, buf: &mut W) -> Result<()> {
        self.flush_run(buf)?;
        buf.write_many(&QOI_PADDING)
    }
}

fn encode_impl<W: Writer>(buf: &mut W, data: &[Pixel], header: &Header) -> Result<usize> {
    buf.write_many(&header.encode())?;

    let mut encoder = ChunkEncoder::new();
    for &px in data {
        encoder.push(px, buf)?;
    }
    encoder.finish(buf)?;

    log::debug!(
        "encoded {}x{} image ({} pixels) into {} bytes",
        header.width,
        header.height,
        data.len(),
        buf.written()
    );
    Ok(buf.written())
}

/// The maximum number of bytes the encoded image will take.
///
/// Can be used to pre-allocate the buffer to encode the image into.
#[inline]
pub fn encode_max_len(width: u32, height: u32) -> usize {
    let n_pixels = (width as usize).saturating_mul(height as usize);
    QOI_HEADER_SIZE.saturating_add(n_pixels.saturating_mul(5)).saturating_add(QOI_PADDING_SIZE)
}

/// Encode the image into a pre-allocated buffer.
///
/// `data` holds `width * height` RGBA pixels, row-major. Returns the total
/// number of bytes written.
#[inline]
pub fn encode_to_buf<C, S>(
    mut buf: impl AsMut<[u8]>, data: impl AsRef<[u8]>, width: u32, height: u32, channels: C,
    colorspace: S,
) -> Result<usize>
where
    C: TryInto<Channels>,
    S: TryInto<ColorSpace>,
    Error: From<C::Error> + From<S::Error>,
{
    Encoder::new(&data, width, height)?
        .with_channels(channels.try_into()?)
        .with_colorspace(colorspace.try_into()?)
        .encode_to_buf(&mut buf)
}

/// Encode the image into a newly allocated vector.
///
/// `data` holds `width * height` RGBA pixels, row-major.
#[inline]
pub fn encode_to_vec<C, S>(
    data: impl AsRef<[u8]>, width: u32, height: u32, channels: C, colorspace: S,
) -> Result<Vec<u8>>
where
    C: TryInto<Channels>,
    S: TryInto<ColorSpace>,
    Error: From<C::Error> + From<S::Error>,
{
    Encoder::new(&data, width, height)?
        .with_channels(channels.try_into()?)
        .with_colorspace(colorspace.try_into()?)
        .encode_to_vec()
}

/// Encode QOI images into buffers or into streams.
pub struct Encoder<'a> {
    data: &'a [Pixel],
    header: Header,
}

impl<'a> Encoder<'a> {
    /// Creates a new encoder from a given array of RGBA bytes and image dimensions.
    ///
    /// The header records 4 channels and sRGB color space unless changed with
    /// [`Encoder::with_channels`] and [`Encoder::with_colorspace`].
    #[inline]
    pub fn new(data: &'a (impl AsRef<[u8]> + ?Sized), width: u32, height: u32) -> Result<Self> {
        let data = data.as_ref();
        if unlikely(data.is_empty()) {
            return Err(Error::EmptyImage { width, height });
        }
        let header = Header::try_new(width, height, Channels::Rgba, ColorSpace::default())?;
        let size = data.len();
        if unlikely(size != header.n_bytes()) {
            return Err(Error::InvalidImageLength { size, width, height });
        }
        let data = try_cast_slice(data)
            .map_err(|_| Error::InvalidImageLength { size, width, height })?;
        Ok(Self { data, header })
    }

    /// Creates a new encoder from a slice of pixels and image dimensions.
    #[inline]
    pub fn from_pixels(data: &'a [Pixel], width: u32, height: u32) -> Result<Self> {
        Self::new(bytemuck::cast_slice::<Pixel, u8>(data), width, height)
    }

    /// Returns a new encoder with modified channel count recorded in the header.
    ///
    /// Pixels are still encoded with all four channels.
    #[inline]
    pub const fn with_channels(mut self, channels: Channels) -> Self {
        self.header = self.header.with_channels(channels);
        self
    }

    /// Returns a new encoder with modified color space.
    ///
    /// Note: the color space is purely informative. Although it is saved to the
    /// file header, it does not affect encoding/decoding in any way.
    #[inline]
    pub const fn with_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.header = self.header.with_colorspace(colorspace);
        self
    }

    /// Returns the inferred image header.
    #[inline]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the minimum buffer size needed to encode the image.
    #[inline]
    pub const fn required_buf_len(&self) -> usize {
        self.header.encode_max_len()
    }

    /// Encodes the image to a pre-allocated buffer and returns the number of bytes written.
    ///
    /// The minimum size of the buffer can be found via [`Encoder::required_buf_len`].
    #[inline]
    pub fn encode_to_buf(&self, mut buf: impl AsMut<[u8]>) -> Result<usize> {
        let buf = buf.as_mut();
        let size_required = self.required_buf_len();
        if unlikely(buf.len() < size_required) {
            return Err(Error::OutputBufferTooSmall { size: buf.len(), required: size_required });
        }
        encode_impl(&mut BytesMut::new(buf), self.data, &self.header)
    }

    /// Encodes the image into a newly allocated vector of bytes and returns it.
    #[inline]
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(QOI_HEADER_SIZE + self.data.len() + QOI_PADDING_SIZE);
        encode_impl(&mut out, self.data, &self.header)?;
        Ok(out)
    }

    /// Encodes the image directly to a generic writer that implements [`Write`](std::io::Write).
    ///
    /// Note: while it's possible to pass a `&mut [u8]` slice here since it implements `Write`,
    /// it would be more efficient to use a specialized method instead: [`Encoder::encode_to_buf`].
    #[inline]
    pub fn encode_to_stream<W: Write>(&self, writer: &mut W) -> Result<usize> {
        encode_impl(&mut GenericWriter::new(writer), self.data, &self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ChunkDecoder;

    fn gradient(n: usize) -> Vec<Pixel> {
        (0..n)
            .map(|i| {
                let v = (i * 7 % 251) as u8;
                let a = if i % 17 == 0 { 128 } else { 255 };
                match i % 5 {
                    0 | 1 => Pixel::new(10, 10, 10, 255),
                    2 => Pixel::new(v, v.wrapping_add(1), v, a),
                    3 => Pixel::new(v, 3, 200, a),
                    _ => Pixel::new(0, 0, 0, 255),
                }
            })
            .collect()
    }

    #[test]
    fn test_cache_in_lockstep() -> Result<()> {
        let pixels = gradient(5000);

        let mut out = Vec::new();
        let mut encoder = ChunkEncoder::new();
        let mut encoder_states = vec![];
        for &px in &pixels {
            let len = out.len();
            encoder.push(px, &mut out)?;
            if out.len() != len {
                encoder_states.push((out.len(), *encoder.state()));
            }
        }
        encoder.finish(&mut out)?;
        encoder_states.push((out.len() - QOI_PADDING_SIZE, *encoder.state()));

        let mut decoder = ChunkDecoder::new(&out);
        let mut decoder_states = vec![];
        let mut n_decoded = 0;
        while n_decoded < pixels.len() {
            let (_, count) = decoder.next_chunk()?;
            n_decoded += count;
            decoder_states.push((decoder.position(), *decoder.state()));
        }
        assert_eq!(n_decoded, pixels.len());

        for (pos, state) in &encoder_states {
            let (_, decoder_state) = decoder_states
                .iter()
                .find(|(p, _)| p == pos)
                .expect("encoder chunk boundary not seen by decoder");
            assert_eq!(state, decoder_state, "state mismatch at byte {}", pos);
        }
        Ok(())
    }

    #[test]
    fn test_first_run_is_cached() -> Result<()> {
        let mut out = Vec::new();
        let mut encoder = ChunkEncoder::new();
        encoder.push(Pixel::START, &mut out)?;
        encoder.push(Pixel::new(1, 2, 3, 255), &mut out)?;
        assert_eq!(out[0], op_run(1));
        assert_eq!(encoder.state().cache.get(Pixel::START.hash_index()), Pixel::START);
        Ok(())
    }
}
