//! Big-endian payload builders for decoder tests.

use crate::util::crc::crc32;

#[derive(Default)]
pub struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    pub fn new() -> Self { Self::default() }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self { self.bytes(&v.to_be_bytes()) }

    pub fn i16(&mut self, v: i16) -> &mut Self { self.bytes(&v.to_be_bytes()) }

    pub fn u32(&mut self, v: u32) -> &mut Self { self.bytes(&v.to_be_bytes()) }

    pub fn i32(&mut self, v: i32) -> &mut Self { self.bytes(&v.to_be_bytes()) }

    pub fn f32(&mut self, v: f32) -> &mut Self { self.bytes(&v.to_be_bytes()) }

    pub fn string(&mut self, s: &str) -> &mut Self {
        self.u16(s.len() as u16);
        self.bytes(s.as_bytes())
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn matrix(&mut self, m: &[f32; 16]) -> &mut Self {
        for v in m {
            self.f32(*v);
        }
        self
    }

    pub fn finish(&mut self) -> Vec<u8> { std::mem::take(&mut self.buf) }
}

/// Frames a payload as a chunk record with a valid CRC.
pub fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 12);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(payload);
    let crc = crc32(&out[4..]);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

pub fn container(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = b"SC3D".to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// Quantizes a float the way the exporter does: `raw = value * 0x7F00 / scale`.
pub fn quantize(value: f32, scale: f32) -> i16 { (value * 32512.0 / scale).round() as i16 }
