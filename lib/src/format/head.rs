use binrw_derive::binread;
use serde_derive::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    format::{CStringU16, FourCC},
    util::read::ChunkReader,
    Result,
};

// File header
pub const K_CHUNK_HEAD: FourCC = FourCC(*b"HEAD");

pub const HEADER_VERSION: i16 = 2;
pub const HEADER_REVISION: i16 = 30;

#[skip_serializing_none]
#[binread]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Header {
    pub version: i16,
    pub revision: i16,
    pub unk: i32,
    /// Library container this file draws shared geometry from.
    #[br(map = CStringU16::into_option)]
    pub library: Option<String>,
}

impl Header {
    pub fn read(reader: &mut ChunkReader) -> Result<Self> {
        if reader.is_empty() {
            return Ok(Self::default());
        }
        let header: Header = reader.read()?;
        if header.version != HEADER_VERSION {
            log::warn!("HEAD: version {} != {}", header.version, HEADER_VERSION);
        }
        if header.revision != HEADER_REVISION {
            log::warn!("HEAD: revision {} != {}", header.revision, HEADER_REVISION);
        }
        Ok(header)
    }
}
