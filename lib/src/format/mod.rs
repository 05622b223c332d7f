pub mod came;
pub mod chunk;
pub mod container;
pub mod geom;
pub mod head;
pub mod mate;
pub mod node;

use std::fmt::{Debug, Display, Formatter, Write};

use binrw_derive::binread;
use serde::Serializer;
use serde_derive::Serialize;

/// Divisor shared by every 16-bit quantized value in the format.
pub const QUANT_DIVISOR: f32 = 0x7F00 as f32;

#[inline]
pub fn dequantize(raw: i16, scale: f32) -> f32 { raw as f32 * scale / QUANT_DIVISOR }

#[inline]
pub fn dequantize_unsigned(raw: u16, scale: f32) -> f32 { raw as f32 * scale / QUANT_DIVISOR }

#[binread]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 4] { &self.0 }
}

impl Display for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for c in self.0 {
            f.write_char(c as char)?;
        }
        Ok(())
    }
}

impl Debug for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_char('"')?;
        for c in self.0 {
            f.write_char(c as char)?;
        }
        f.write_char('"')?;
        Ok(())
    }
}

impl PartialEq<[u8; 4]> for FourCC {
    fn eq(&self, other: &[u8; 4]) -> bool { &self.0 == other }
}

impl serde::Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Flat 16-float matrix in file order; never transposed on read.
#[binread]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CMatrix4f {
    pub m: [f32; 16],
}

impl CMatrix4f {
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    };

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 { self.m[row * 4 + col] }
}

/// u16-length-prefixed string.
#[binread]
#[derive(Clone, Debug, Default)]
pub struct CStringU16 {
    pub size: u16,
    #[br(count = size)]
    pub text: Vec<u8>,
}

impl CStringU16 {
    pub fn into_string(self) -> String {
        match String::from_utf8(self.text) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Empty strings mean "not set" in several places.
    pub fn into_option(self) -> Option<String> {
        if self.text.is_empty() {
            None
        } else {
            Some(self.into_string())
        }
    }
}
