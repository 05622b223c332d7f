use std::io::Cursor;

use binrw::{BinRead, Endian};

use crate::{
    format::{CStringU16, FourCC},
    Error, Result,
};

/// Bounds-checked big-endian cursor over a chunk payload.
///
/// Every read either advances past the bytes it consumed or fails with
/// [`Error::Decode`]; nothing is ever read outside `data`.
pub struct ChunkReader<'a> {
    tag: FourCC,
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ChunkReader<'a> {
    /// `base` is the absolute offset of `data` within the container, used for error reporting.
    pub fn new(tag: FourCC, data: &'a [u8], base: usize) -> Self {
        Self { tag, data, pos: 0, base }
    }

    #[inline]
    pub fn tag(&self) -> FourCC { self.tag }

    #[inline]
    pub fn position(&self) -> usize { self.pos }

    #[inline]
    pub fn remaining(&self) -> usize { self.data.len() - self.pos }

    #[inline]
    pub fn is_empty(&self) -> bool { self.pos >= self.data.len() }

    pub fn error<S: Into<String>>(&self, message: S) -> Error {
        Error::Decode { tag: self.tag, offset: self.base + self.pos, message: message.into() }
    }

    /// Reads any `binrw` type with big-endian byte order.
    pub fn read<T>(&mut self) -> Result<T>
    where T: for<'b> BinRead<Args<'b> = ()> {
        let mut cursor = Cursor::new(&self.data[self.pos..]);
        let value = T::read_options(&mut cursor, Endian::Big, ()).map_err(|e| self.error(e.to_string()))?;
        self.pos += cursor.position() as usize;
        Ok(value)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.error(format!(
                "read of {len:#X} bytes overruns payload ({:#X} remaining)",
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8> { self.read() }

    #[inline]
    pub fn u16(&mut self) -> Result<u16> { self.read() }

    #[inline]
    pub fn u32(&mut self) -> Result<u32> { self.read() }

    #[inline]
    pub fn f32(&mut self) -> Result<f32> { self.read() }

    #[inline]
    pub fn four_cc(&mut self) -> Result<FourCC> { self.read() }

    /// Reads a u16-length-prefixed UTF-8 string.
    pub fn string(&mut self) -> Result<String> { Ok(self.read::<CStringU16>()?.into_string()) }

    /// Consumes the reader, warning about any bytes the decoder left behind.
    pub fn finish(self) {
        let remaining = self.remaining();
        if remaining != 0 {
            log::warn!("{}: {:#X} bytes unprocessed at {:#X}", self.tag, remaining, self.base + self.pos);
        }
    }
}
