use std::borrow::Cow;
use std::io::{ErrorKind as IoErrorKind, Read};

use bytemuck::try_cast_slice_mut;

use crate::consts::{
    QOI_HEADER_SIZE, QOI_OP_DIFF, QOI_OP_INDEX, QOI_OP_LUMA, QOI_OP_RGB, QOI_OP_RGBA, QOI_PADDING,
    QOI_PADDING_SIZE, QOI_RUN_MAX,
};
use crate::error::{Error, Result, Warning};
use crate::header::Header;
use crate::ops::{payload, run_len, tag, unpack_diff, unpack_luma};
use crate::pixel::{Pixel, RunningState};
use crate::utils::{cold, unlikely};

/// Reads chunks one at a time and replays them against the running state.
pub(crate) struct ChunkDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    state: RunningState,
}

impl<'a> ChunkDecoder<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, state: RunningState::new() }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[cfg(test)]
    pub const fn state(&self) -> &RunningState {
        &self.state
    }

    #[inline]
    fn read_one(&mut self) -> Result<u8> {
        match self.data.get(self.pos) {
            Some(&v) => {
                self.pos += 1;
                Ok(v)
            }
            None => {
                cold();
                Err(Error::UnexpectedBufferEnd)
            }
        }
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        match self.data.get(self.pos..self.pos + N) {
            Some(v) => {
                let mut out = [0; N];
                out.copy_from_slice(v);
                self.pos += N;
                Ok(out)
            }
            None => {
                cold();
                Err(Error::UnexpectedBufferEnd)
            }
        }
    }

    /// Decodes the next chunk, returning the pixel and how many times it repeats.
    #[inline]
    pub fn next_chunk(&mut self) -> Result<(Pixel, usize)> {
        let px_prev = self.state.prev;
        let b1 = self.read_one()?;
        let (px, count) = match b1 {
            QOI_OP_RGB => (px_prev.with_rgb(self.read_array::<3>()?), 1),
            QOI_OP_RGBA => (Pixel::from_array(self.read_array::<4>()?), 1),
            _ => match tag(b1) {
                QOI_OP_INDEX => (self.state.cache.get(payload(b1)), 1),
                QOI_OP_DIFF => {
                    let (dr, dg, db) = unpack_diff(b1);
                    (px_prev.rgb_add(dr, dg, db), 1)
                }
                QOI_OP_LUMA => {
                    let b2 = self.read_one()?;
                    let (dr, dg, db) = unpack_luma(b1, b2);
                    (px_prev.rgb_add(dr, dg, db), 1)
                }
                _ => (px_prev, run_len(b1)),
            },
        };
        self.state.push(px);
        Ok((px, count))
    }
}

/// Fills `out` from the chunk stream and returns the number of bytes consumed.
fn decode_impl(data: &[u8], out: &mut [Pixel]) -> Result<usize> {
    let mut decoder = ChunkDecoder::new(data);
    let mut n_decoded = 0;
    while n_decoded < out.len() {
        let (px, count) = decoder.next_chunk()?;
        let remaining = out.len() - n_decoded;
        if unlikely(count > remaining) {
            return Err(Error::RunOverflow { run: count, remaining });
        }
        out[n_decoded..n_decoded + count].fill(px);
        n_decoded += count;
    }
    Ok(decoder.position())
}

/// Checks whatever follows the last pixel chunk against the end marker.
fn check_padding(tail: &[u8]) -> Vec<Warning> {
    let mut warnings = vec![];
    if tail.len() < QOI_PADDING_SIZE {
        warnings.push(Warning::EndMarkerTruncated { len: tail.len() });
    } else {
        if tail[..QOI_PADDING_SIZE] != QOI_PADDING {
            warnings.push(Warning::EndMarkerMismatch);
        }
        if tail.len() > QOI_PADDING_SIZE {
            warnings.push(Warning::TrailingBytes { count: tail.len() - QOI_PADDING_SIZE });
        }
    }
    warnings
}

/// Rejects streams too short to hold the declared pixel count.
///
/// Every chunk byte yields at most one full run, so this runs before the
/// output buffer is allocated.
fn check_stream_len(data: &[u8], header: &Header) -> Result<()> {
    let n_pixels = header.n_pixels();
    let run_max = QOI_RUN_MAX as usize;
    let min_chunk_bytes = n_pixels / run_max + usize::from(n_pixels % run_max != 0);
    let chunk_bytes = data.len().saturating_sub(QOI_HEADER_SIZE);
    if unlikely(chunk_bytes < min_chunk_bytes) {
        return Err(Error::UnexpectedBufferEnd);
    }
    Ok(())
}

/// Decodes into `out`, which must be exactly `header.n_bytes()` long.
fn decode_to_rgba(
    data: &[u8], header: &Header, out: &mut [u8], strict: bool,
) -> Result<Vec<Warning>> {
    check_stream_len(data, header)?;
    let size = out.len();
    let pixels = try_cast_slice_mut::<u8, Pixel>(out)
        .map_err(|_| Error::OutputBufferTooSmall { size, required: header.n_bytes() })?;
    let chunks = data.get(QOI_HEADER_SIZE..).ok_or(Error::UnexpectedBufferEnd)?;
    let consumed = decode_impl(chunks, pixels)?;

    let warnings = check_padding(&chunks[consumed..]);
    for warning in &warnings {
        log::warn!("{}", warning);
    }
    if strict {
        if let Some(&warning) = warnings.first() {
            return Err(Error::Integrity(warning));
        }
    }
    log::debug!(
        "decoded {}x{} image from {} bytes",
        header.width,
        header.height,
        QOI_HEADER_SIZE + consumed
    );
    Ok(warnings)
}

/// Decode the image into a pre-allocated buffer.
///
/// The buffer receives `width * height` RGBA pixels. If decoding fails, the
/// part of the buffer that would hold the image is zeroed.
#[inline]
pub fn decode_to_buf(buf: impl AsMut<[u8]>, data: impl AsRef<[u8]>) -> Result<Header> {
    let mut decoder = Decoder::new(&data)?;
    decoder.decode_to_buf(buf)?;
    Ok(*decoder.header())
}

/// Decode the image into a newly allocated vector of RGBA bytes.
#[inline]
pub fn decode_to_vec(data: impl AsRef<[u8]>) -> Result<(Header, Vec<u8>)> {
    let mut decoder = Decoder::new(&data)?;
    let out = decoder.decode_to_vec()?;
    Ok((*decoder.header(), out))
}

/// Decode the image header from a slice of bytes.
#[inline]
pub fn decode_header(data: impl AsRef<[u8]>) -> Result<Header> {
    Header::decode(data)
}

/// Decode QOI images from slices or from streams.
#[derive(Clone)]
pub struct Decoder<'a> {
    data: Cow<'a, [u8]>,
    header: Header,
    strict: bool,
    warnings: Vec<Warning>,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder from a slice of bytes.
    ///
    /// The header will be decoded immediately upon construction.
    #[inline]
    pub fn new(data: &'a (impl AsRef<[u8]> + ?Sized)) -> Result<Self> {
        let data = data.as_ref();
        let header = Header::decode(data)?;
        Ok(Self { data: Cow::Borrowed(data), header, strict: false, warnings: vec![] })
    }

    /// Returns a new decoder that rejects streams with a bad end marker.
    ///
    /// By default a missing or mismatched end marker and trailing bytes are only
    /// reported through [`Decoder::warnings`]; in strict mode they fail with
    /// [`Error::Integrity`].
    #[inline]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the decoded image header.
    #[inline]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// The number of bytes the decoded RGBA image will take.
    #[inline]
    pub const fn required_buf_len(&self) -> usize {
        self.header.n_bytes()
    }

    /// Integrity warnings from the last successful decode.
    #[inline]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Decodes the image to a pre-allocated buffer and returns the number of bytes written.
    ///
    /// The minimum size of the buffer can be found via [`Decoder::required_buf_len`].
    #[inline]
    pub fn decode_to_buf(&mut self, mut buf: impl AsMut<[u8]>) -> Result<usize> {
        let buf = buf.as_mut();
        let size = self.required_buf_len();
        if unlikely(buf.len() < size) {
            return Err(Error::OutputBufferTooSmall { size: buf.len(), required: size });
        }
        let out = &mut buf[..size];
        match decode_to_rgba(&self.data, &self.header, out, self.strict) {
            Ok(warnings) => {
                self.warnings = warnings;
                Ok(size)
            }
            Err(err) => {
                out.fill(0);
                Err(err)
            }
        }
    }

    /// Decodes the image into a newly allocated vector of RGBA bytes and returns it.
    #[inline]
    pub fn decode_to_vec(&mut self) -> Result<Vec<u8>> {
        check_stream_len(&self.data, &self.header)?;
        let mut out = vec![0; self.required_buf_len()];
        self.warnings = decode_to_rgba(&self.data, &self.header, &mut out, self.strict)?;
        Ok(out)
    }
}

impl Decoder<'static> {
    /// Creates a new decoder from a generic reader that implements [`Read`](std::io::Read).
    ///
    /// The header is read and validated first; the rest of the stream is then
    /// read to its end so trailing bytes can be reported.
    #[inline]
    pub fn from_stream<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = vec![0; QOI_HEADER_SIZE];
        reader.read_exact(&mut data).map_err(|err| match err.kind() {
            IoErrorKind::UnexpectedEof => Error::UnexpectedBufferEnd,
            _ => Error::IoError(err),
        })?;
        let header = Header::decode(&data)?;
        reader.read_to_end(&mut data)?;
        Ok(Self { data: Cow::Owned(data), header, strict: false, warnings: vec![] })
    }
}
