use binrw_derive::binread;
use serde_derive::Serialize;

use crate::{
    format::{CStringU16, FourCC},
    util::read::ChunkReader,
    Result,
};

// Camera
pub const K_CHUNK_CAME: FourCC = FourCC(*b"CAME");

#[binread]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Camera {
    #[br(map = CStringU16::into_string)]
    pub name: String,
    pub unk: f32,
    /// Vertical field of view.
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Camera {
    pub fn read(reader: &mut ChunkReader) -> Result<Self> { reader.read() }
}
