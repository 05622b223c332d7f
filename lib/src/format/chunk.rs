use std::ops::Range;

use binrw_derive::binread;
use serde_derive::Serialize;
use strum::EnumDiscriminants;

use crate::{
    format::{
        came::{Camera, K_CHUNK_CAME},
        container::K_FORM_SC3D,
        geom::{Geometry, K_CHUNK_GEOM},
        head::{Header, K_CHUNK_HEAD},
        mate::{Material, K_CHUNK_MATE},
        node::{NodeList, K_CHUNK_NODE},
        FourCC,
    },
    util::{crc::crc32, read::ChunkReader},
    Error, Result,
};

// End of chunk stream
pub const K_CHUNK_WEND: FourCC = FourCC(*b"WEND");

/// Bytes around every payload: length, tag and CRC.
pub const CHUNK_OVERHEAD: usize = 12;

#[binread]
#[derive(Clone, Debug)]
pub struct ChunkDescriptor {
    pub size: u32,
    pub id: FourCC,
}

#[derive(Clone, Debug, Serialize, EnumDiscriminants)]
#[strum_discriminants(name(ChunkKind), derive(strum::Display))]
#[serde(tag = "kind")]
pub enum ChunkBody {
    Header(Header),
    Geometry(Geometry),
    NodeList(NodeList),
    Material(Material),
    Camera(Camera),
    End,
    /// Unknown tag, payload kept undecoded.
    Opaque,
}

impl ChunkBody {
    /// Dispatches a payload to the decoder for `id`.
    pub fn read(id: FourCC, data: &[u8], base: usize) -> Result<Self> {
        let mut reader = ChunkReader::new(id, data, base);
        let body = match id {
            K_CHUNK_HEAD => Self::Header(Header::read(&mut reader)?),
            K_CHUNK_GEOM => Self::Geometry(Geometry::read(&mut reader)?),
            K_CHUNK_NODE => Self::NodeList(NodeList::read(&mut reader)?),
            K_CHUNK_MATE => Self::Material(Material::read(&mut reader)?),
            K_CHUNK_CAME => Self::Camera(Camera::read(&mut reader)?),
            K_CHUNK_WEND => Self::End,
            id => {
                log::warn!("Unknown chunk {id} at {base:#X}, ignoring...");
                return Ok(Self::Opaque);
            }
        };
        reader.finish();
        Ok(body)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Chunk {
    pub id: FourCC,
    /// Declared payload length.
    pub size: u32,
    /// Offset of the chunk record within the container buffer.
    pub offset: usize,
    #[serde(skip)]
    pub data: Range<usize>,
    pub stored_crc: u32,
    pub computed_crc: u32,
    pub body: ChunkBody,
}

impl Chunk {
    /// Reads and decodes the chunk record starting at `offset` in `buf`.
    pub fn read(buf: &[u8], offset: usize) -> Result<Self> {
        let Some(data) = buf.get(offset..) else {
            return Err(Error::Decode {
                tag: K_FORM_SC3D,
                offset,
                message: format!("chunk offset past end of buffer ({:#X} bytes)", buf.len()),
            });
        };
        let mut reader = ChunkReader::new(K_FORM_SC3D, data, offset);
        let desc: ChunkDescriptor = reader.read()?;
        let data_start = offset + reader.position();
        let size = desc.size as usize;
        if reader.remaining() < size + 4 {
            return Err(Error::Decode {
                tag: desc.id,
                offset,
                message: format!(
                    "declared length {:#X} overruns buffer ({:#X} bytes left)",
                    size,
                    reader.remaining()
                ),
            });
        }
        let payload = reader.bytes(size)?;
        let stored_crc = reader.u32()?;
        let computed_crc = crc32(&buf[offset + 4..data_start + size]);
        if computed_crc != stored_crc {
            log::warn!(
                "CRC mismatch for chunk {}: {:#010X} != {:#010X}",
                desc.id,
                stored_crc,
                computed_crc
            );
        }
        let body = ChunkBody::read(desc.id, payload, data_start)?;
        Ok(Self {
            id: desc.id,
            size: desc.size,
            offset,
            data: data_start..data_start + size,
            stored_crc,
            computed_crc,
            body,
        })
    }

    /// Bytes consumed by the whole record.
    #[inline]
    pub fn record_size(&self) -> usize { self.size as usize + CHUNK_OVERHEAD }

    #[inline]
    pub fn crc_ok(&self) -> bool { self.stored_crc == self.computed_crc }

    #[inline]
    pub fn kind(&self) -> ChunkKind { ChunkKind::from(&self.body) }

    pub fn header(&self) -> Option<&Header> {
        match &self.body {
            ChunkBody::Header(v) => Some(v),
            _ => None,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.body {
            ChunkBody::Geometry(v) => Some(v),
            _ => None,
        }
    }

    pub fn node_list(&self) -> Option<&NodeList> {
        match &self.body {
            ChunkBody::NodeList(v) => Some(v),
            _ => None,
        }
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.body {
            ChunkBody::Material(v) => Some(v),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.body {
            ChunkBody::Camera(v) => Some(v),
            _ => None,
        }
    }
}
