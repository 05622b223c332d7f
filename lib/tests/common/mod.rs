//! Builders for whole SC3D files.

#![allow(dead_code)]

use std::{fs, path::Path};

#[derive(Default)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new() -> Self { Self::default() }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn u16(self, v: u16) -> Self { self.bytes(&v.to_be_bytes()) }

    pub fn i16(self, v: i16) -> Self { self.bytes(&v.to_be_bytes()) }

    pub fn u32(self, v: u32) -> Self { self.bytes(&v.to_be_bytes()) }

    pub fn f32(self, v: f32) -> Self { self.bytes(&v.to_be_bytes()) }

    pub fn string(self, s: &str) -> Self { self.u16(s.len() as u16).bytes(s.as_bytes()) }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.0.extend_from_slice(data);
        self
    }

    pub fn build(self) -> Vec<u8> { self.0 }
}

pub fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(tag);
    out.extend_from_slice(payload);
    let crc = crc32fast::hash(&out[4..]);
    out.extend_from_slice(&crc.to_be_bytes());
    out
}

pub fn header(library: &str) -> Vec<u8> {
    chunk(b"HEAD", &Payload::new().i16(2).i16(30).u32(0).string(library).build())
}

pub fn end() -> Vec<u8> { chunk(b"WEND", &[]) }

/// Container with a header naming `library` (empty for none) and the given chunks.
pub fn file(library: &str, chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = b"SC3D".to_vec();
    out.extend(header(library));
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out.extend(end());
    out
}

pub fn write_file(dir: &Path, name: &str, data: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}
