use std::io::Write;

use crate::error::{Error, Result};

#[inline(always)]
#[cold]
pub const fn cold() {}

#[inline(always)]
pub const fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}

/// Byte sink the encoder writes chunks into.
pub trait Writer {
    fn write_one(&mut self, v: u8) -> Result<()>;
    fn write_many(&mut self, v: &[u8]) -> Result<()>;
    fn written(&self) -> usize;
}

/// Writes into a caller-provided slice that is known to be large enough.
pub struct BytesMut<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BytesMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn overflow(&self, required: usize) -> Error {
        cold();
        Error::OutputBufferTooSmall { size: self.buf.len(), required }
    }
}

impl<'a> Writer for BytesMut<'a> {
    #[inline]
    fn write_one(&mut self, v: u8) -> Result<()> {
        match self.buf.get_mut(self.pos) {
            Some(slot) => {
                *slot = v;
                self.pos += 1;
                Ok(())
            }
            None => Err(self.overflow(self.pos + 1)),
        }
    }

    #[inline]
    fn write_many(&mut self, v: &[u8]) -> Result<()> {
        let end = self.pos + v.len();
        match self.buf.get_mut(self.pos..end) {
            Some(head) => {
                head.copy_from_slice(v);
                self.pos = end;
                Ok(())
            }
            None => Err(self.overflow(end)),
        }
    }

    #[inline]
    fn written(&self) -> usize {
        self.pos
    }
}

impl Writer for Vec<u8> {
    #[inline]
    fn write_one(&mut self, v: u8) -> Result<()> {
        self.push(v);
        Ok(())
    }

    #[inline]
    fn write_many(&mut self, v: &[u8]) -> Result<()> {
        self.extend_from_slice(v);
        Ok(())
    }

    #[inline]
    fn written(&self) -> usize {
        self.len()
    }
}

/// Adapts any `std::io::Write` implementor, counting bytes written.
pub struct GenericWriter<W> {
    writer: W,
    n_written: usize,
}

impl<W: Write> GenericWriter<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer, n_written: 0 }
    }
}

impl<W: Write> Writer for GenericWriter<W> {
    #[inline]
    fn write_one(&mut self, v: u8) -> Result<()> {
        self.write_many(&[v])
    }

    #[inline]
    fn write_many(&mut self, v: &[u8]) -> Result<()> {
        self.writer.write_all(v)?;
        self.n_written += v.len();
        Ok(())
    }

    #[inline]
    fn written(&self) -> usize {
        self.n_written
    }
}
