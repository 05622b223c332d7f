use std::{ops::Deref, path::Path};

use memmap2::Mmap;
use serde_derive::Serialize;

use crate::{
    format::{
        came::{Camera, K_CHUNK_CAME},
        chunk::{Chunk, CHUNK_OVERHEAD, K_CHUNK_WEND},
        geom::{Geometry, K_CHUNK_GEOM},
        head::{Header, K_CHUNK_HEAD},
        mate::{Material, K_CHUNK_MATE},
        node::{Node, NodeList, K_CHUNK_NODE},
        FourCC,
    },
    util::file::map_file,
    Error, Result,
};

// File magic
pub const K_FORM_SC3D: FourCC = FourCC(*b"SC3D");

/// Backing buffer of a container: owned bytes or a memory mapped file.
#[derive(Debug)]
pub enum ContainerData {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for ContainerData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(v) => v,
            Self::Mapped(m) => m,
        }
    }
}

impl From<Vec<u8>> for ContainerData {
    fn from(value: Vec<u8>) -> Self { Self::Owned(value) }
}

impl From<Mmap> for ContainerData {
    fn from(value: Mmap) -> Self { Self::Mapped(value) }
}

/// A decoded SC3D file.
///
/// Created from a buffer with [`Container::new`], which only validates the
/// magic; [`Container::load`] splits and decodes the chunk stream once.
#[derive(Debug, Serialize)]
pub struct Container {
    pub name: String,
    #[serde(skip)]
    data: ContainerData,
    chunks: Vec<Chunk>,
    loaded: bool,
}

impl Container {
    pub fn new<D: Into<ContainerData>, S: Into<String>>(data: D, name: S) -> Result<Self> {
        let data = data.into();
        if data.len() < K_FORM_SC3D.0.len() || data[..4] != K_FORM_SC3D.0 {
            let found = &data[..data.len().min(4)];
            return Err(Error::Validation(format!("bad magic {found:02X?}")));
        }
        Ok(Self { name: name.into(), data, chunks: vec![], loaded: false })
    }

    /// Validates and loads `data` in one step.
    pub fn parse<D: Into<ContainerData>, S: Into<String>>(data: D, name: S) -> Result<Self> {
        let mut container = Self::new(data, name)?;
        container.load()?;
        Ok(container)
    }

    /// Maps and loads the file at `path`, named after its file name.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        Self::parse(map_file(path)?, name)
    }

    /// Splits the buffer into chunks, stopping after the end marker or at the end of
    /// the buffer. Does nothing if the container is already loaded.
    pub fn load(&mut self) -> Result<&mut Self> {
        if self.loaded {
            return Ok(self);
        }
        let mut chunks = Vec::new();
        let mut offset = K_FORM_SC3D.0.len();
        while self.data.len() - offset >= CHUNK_OVERHEAD {
            let chunk = Chunk::read(&self.data, offset)?;
            offset += chunk.record_size();
            let end = chunk.id == K_CHUNK_WEND;
            chunks.push(chunk);
            if end {
                break;
            }
        }
        if offset < self.data.len() {
            log::warn!("{}: {:#X} trailing bytes after chunk stream", self.name, self.data.len() - offset);
        }
        log::debug!("{}: loaded {} chunks", self.name, chunks.len());
        self.chunks = chunks;
        self.loaded = true;
        Ok(self)
    }

    #[inline]
    pub fn is_loaded(&self) -> bool { self.loaded }

    #[inline]
    pub fn data(&self) -> &[u8] { &self.data }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    /// Raw payload bytes of a chunk belonging to this container.
    pub fn payload(&self, chunk: &Chunk) -> &[u8] { &self.data[chunk.data.clone()] }

    /// First chunk with the given tag, in file order.
    pub fn find_chunk(&self, id: FourCC) -> Option<&Chunk> { self.chunks.iter().find(|c| c.id == id) }

    pub fn find_chunks(&self, id: FourCC) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().filter(move |c| c.id == id)
    }

    pub fn header(&self) -> Option<&Header> { self.find_chunk(K_CHUNK_HEAD).and_then(Chunk::header) }

    /// Library named by the header, if any.
    pub fn library(&self) -> Option<&str> { self.header().and_then(|h| h.library.as_deref()) }

    pub fn geometries(&self) -> impl Iterator<Item = &Geometry> {
        self.find_chunks(K_CHUNK_GEOM).filter_map(Chunk::geometry)
    }

    pub fn geometry(&self, name: &str) -> Option<&Geometry> { self.geometries().find(|g| g.name == name) }

    pub fn node_list(&self) -> Option<&NodeList> { self.find_chunk(K_CHUNK_NODE).and_then(Chunk::node_list) }

    pub fn nodes(&self) -> &[Node] { self.node_list().map(NodeList::nodes).unwrap_or_default() }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.find_chunks(K_CHUNK_MATE).filter_map(Chunk::material)
    }

    pub fn material(&self, name: &str) -> Option<&Material> { self.materials().find(|m| m.name == name) }

    pub fn cameras(&self) -> impl Iterator<Item = &Camera> {
        self.find_chunks(K_CHUNK_CAME).filter_map(Chunk::camera)
    }
}
