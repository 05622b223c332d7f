use serde_derive::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    format::{CStringU16, FourCC},
    util::read::ChunkReader,
    Result,
};

// Material
pub const K_CHUNK_MATE: FourCC = FourCC(*b"MATE");

/// A material input: either a texture reference or a packed ARGB color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialChannel {
    Texture(String),
    Color(u32),
}

impl MaterialChannel {
    fn read(reader: &mut ChunkReader) -> Result<Self> {
        Ok(if reader.u8()? != 0 { Self::Texture(reader.string()?) } else { Self::Color(reader.u32()?) })
    }

    pub fn texture(&self) -> Option<&str> {
        match self {
            Self::Texture(name) => Some(name),
            Self::Color(_) => None,
        }
    }

    pub fn color(&self) -> Option<u32> {
        match self {
            Self::Color(argb) => Some(*argb),
            Self::Texture(_) => None,
        }
    }

    /// Packed color split into `[a, r, g, b]`.
    pub fn argb(&self) -> Option<[u8; 4]> { self.color().map(u32::to_be_bytes) }
}

impl Default for MaterialChannel {
    fn default() -> Self { Self::Color(0xFFFFFFFF) }
}

#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize)]
pub struct Material {
    pub name: String,
    pub shader: String,
    pub flags: u8,
    pub ambient: MaterialChannel,
    pub diffuse: MaterialChannel,
    pub stencil: MaterialChannel,
    pub unk_str1: String,
    pub unk_str2: String,
    pub colorize: MaterialChannel,
    pub emission: MaterialChannel,
    pub alpha_texture: Option<String>,
    pub unk_float1: f32,
    pub unk_float2: f32,
    pub lightmap_diffuse: Option<String>,
    pub lightmap_specular: Option<String>,
    pub unk1: u32,
    pub unk2: u32,
}

impl Material {
    pub fn read(reader: &mut ChunkReader) -> Result<Self> {
        let name = reader.string()?;
        let shader = reader.string()?;
        let flags = reader.u8()?;
        let ambient = MaterialChannel::read(reader)?;
        let diffuse = MaterialChannel::read(reader)?;
        let stencil = MaterialChannel::read(reader)?;
        let unk_str1 = reader.string()?;
        let unk_str2 = reader.string()?;
        let colorize = MaterialChannel::read(reader)?;
        let emission = MaterialChannel::read(reader)?;
        let alpha_texture = reader.read::<CStringU16>()?.into_option();
        let unk_float1 = reader.f32()?;
        let unk_float2 = reader.f32()?;
        let lightmap_diffuse = reader.read::<CStringU16>()?.into_option();
        let lightmap_specular = reader.read::<CStringU16>()?.into_option();
        let unk1 = reader.u32()?;
        let unk2 = reader.u32()?;
        Ok(Self {
            name,
            shader,
            flags,
            ambient,
            diffuse,
            stencil,
            unk_str1,
            unk_str2,
            colorize,
            emission,
            alpha_texture,
            unk_float1,
            unk_float2,
            lightmap_diffuse,
            lightmap_specular,
            unk1,
            unk2,
        })
    }

    /// Every texture the material references, in file order.
    pub fn textures(&self) -> impl Iterator<Item = &str> {
        [&self.ambient, &self.diffuse, &self.stencil, &self.colorize, &self.emission]
            .into_iter()
            .filter_map(MaterialChannel::texture)
            .chain(self.alpha_texture.as_deref())
            .chain(self.lightmap_diffuse.as_deref())
            .chain(self.lightmap_specular.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{util::test_util::PayloadWriter, Error};

    fn read(data: &[u8]) -> Result<Material> { Material::read(&mut ChunkReader::new(K_CHUNK_MATE, data, 0)) }

    #[test]
    fn reads_all_fields() {
        let mut w = PayloadWriter::new();
        w.string("wood").string("shader/phong.vert").u8(3);
        w.u8(0).u32(0xFF102030);
        w.u8(1).string("wood_diffuse.png");
        w.u8(0).u32(0);
        w.string("").string("aux");
        w.u8(0).u32(0x80FF0000);
        w.u8(1).string("glow.png");
        w.string("wood_alpha.png");
        w.f32(0.5).f32(2.0);
        w.string("lm_diffuse.png").string("");
        w.u32(1).u32(2);
        let mat = read(&w.finish()).unwrap();

        assert_eq!(mat.name, "wood");
        assert_eq!(mat.shader, "shader/phong.vert");
        assert_eq!(mat.flags, 3);
        assert_eq!(mat.ambient.color(), Some(0xFF102030));
        assert_eq!(mat.ambient.argb(), Some([0xFF, 0x10, 0x20, 0x30]));
        assert_eq!(mat.diffuse.texture(), Some("wood_diffuse.png"));
        assert_eq!(mat.diffuse.color(), None);
        assert_eq!(mat.stencil, MaterialChannel::Color(0));
        assert_eq!(mat.unk_str2, "aux");
        assert_eq!(mat.colorize.argb(), Some([0x80, 0xFF, 0, 0]));
        assert_eq!(mat.emission.texture(), Some("glow.png"));
        assert_eq!(mat.alpha_texture.as_deref(), Some("wood_alpha.png"));
        assert_eq!((mat.unk_float1, mat.unk_float2), (0.5, 2.0));
        assert_eq!(mat.lightmap_diffuse.as_deref(), Some("lm_diffuse.png"));
        assert_eq!(mat.lightmap_specular, None);
        assert_eq!((mat.unk1, mat.unk2), (1, 2));
        assert_eq!(mat.textures().collect::<Vec<_>>(), [
            "wood_diffuse.png",
            "glow.png",
            "wood_alpha.png",
            "lm_diffuse.png"
        ]);
    }

    #[test]
    fn truncated_material() {
        let mut w = PayloadWriter::new();
        w.string("wood").string("shader").u8(0).u8(1);
        assert!(matches!(read(&w.finish()), Err(Error::Decode { .. })));
    }
}
