use binrw_derive::binread;
use indexmap::IndexMap;
use mint::{Vector2, Vector3, Vector4};
use serde_derive::Serialize;
use serde_with::skip_serializing_none;
use strum::FromRepr;

use crate::{
    format::{dequantize, dequantize_unsigned, CMatrix4f, CStringU16, FourCC},
    util::read::ChunkReader,
    Result,
};

// Geometry
pub const K_CHUNK_GEOM: FourCC = FourCC(*b"GEOM");

// Well-known property names
pub const POSITION: &str = "POSITION";
pub const NORMAL: &str = "NORMAL";
pub const TEXCOORD: &str = "TEXCOORD";
pub const COLOR: &str = "COLOR";

/// Divisor for 16-bit fixed-point skin weights.
pub const WEIGHT_DIVISOR: f32 = 0xFFFF as f32;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, strum::Display)]
pub enum EValueKind {
    Position,
    Normal,
    TexCoord,
    Color,
    Unknown(u8),
}

impl EValueKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Position,
            1 => Self::Normal,
            2 => Self::TexCoord,
            3 => Self::Color,
            v => Self::Unknown(v),
        }
    }

    /// Smallest element that holds every component of this kind.
    pub fn min_element_size(self) -> usize {
        match self {
            Self::Position | Self::Normal | Self::Color => 6,
            Self::TexCoord => 4,
            Self::Unknown(_) => 0,
        }
    }
}

#[binread]
#[derive(Clone, Debug)]
struct SPropertyHeader {
    #[br(map = CStringU16::into_string)]
    name: String,
    kind: u8,
    slot: u8,
    #[br(map = |v: u8| v as usize * 2)]
    element_size: usize,
    scale: f32,
    count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValues {
    Vec3(Vec<Vector3<f32>>),
    Vec2(Vec<Vector2<f32>>),
    Color(Vec<Vector4<f32>>),
    None,
}

impl PropertyValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Vec3(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Color(v) => v.len(),
            Self::None => 0,
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// A vertex attribute stream.
#[derive(Clone, Debug, Serialize)]
pub struct Property {
    pub kind: EValueKind,
    /// Secondary slot, e.g. the UV set index.
    pub slot: u8,
    pub element_size: usize,
    pub scale: f32,
    pub count: u32,
    /// Quantized element data as stored.
    #[serde(skip)]
    pub raw: Vec<u8>,
    pub values: PropertyValues,
}

impl Property {
    fn read(reader: &mut ChunkReader) -> Result<(String, Self)> {
        let SPropertyHeader { name, kind, slot, element_size, scale, count } = reader.read()?;
        let kind = EValueKind::from_raw(kind);
        if let EValueKind::Unknown(v) = kind {
            log::warn!("GEOM: unknown property kind {v} for '{name}'");
        }
        if count != 0 && element_size < kind.min_element_size() {
            return Err(reader.error(format!(
                "{kind} property '{name}' has element size {element_size}, need {}",
                kind.min_element_size()
            )));
        }
        let len = (count as usize)
            .checked_mul(element_size)
            .ok_or_else(|| reader.error(format!("property '{name}' size overflows")))?;
        let raw = reader.bytes(len)?.to_vec();
        let values = decode_values(kind, &raw, element_size, scale);
        Ok((name, Self { kind, slot, element_size, scale, count, raw, values }))
    }
}

#[inline]
fn be_i16(data: &[u8], offset: usize) -> i16 { i16::from_be_bytes([data[offset], data[offset + 1]]) }

#[inline]
fn be_u16(data: &[u8], offset: usize) -> u16 { u16::from_be_bytes([data[offset], data[offset + 1]]) }

/// `raw` must hold whole elements at least [`EValueKind::min_element_size`] wide.
fn decode_values(kind: EValueKind, raw: &[u8], element_size: usize, scale: f32) -> PropertyValues {
    if element_size == 0 {
        return PropertyValues::None;
    }
    let elements = raw.chunks_exact(element_size);
    match kind {
        EValueKind::Position | EValueKind::Normal => PropertyValues::Vec3(
            elements
                .map(|e| Vector3 {
                    x: dequantize(be_i16(e, 0), scale),
                    y: dequantize(be_i16(e, 2), scale),
                    z: dequantize(be_i16(e, 4), scale),
                })
                .collect(),
        ),
        EValueKind::TexCoord => PropertyValues::Vec2(
            elements
                .map(|e| Vector2 {
                    x: dequantize(be_i16(e, 0), scale),
                    y: dequantize(be_i16(e, 2), scale),
                })
                .collect(),
        ),
        EValueKind::Color => PropertyValues::Color(
            elements
                .map(|e| Vector4 {
                    x: dequantize_unsigned(be_u16(e, 0), scale),
                    y: dequantize_unsigned(be_u16(e, 2), scale),
                    z: dequantize_unsigned(be_u16(e, 4), scale),
                    w: if element_size == 8 { dequantize_unsigned(be_u16(e, 6), scale) } else { 1.0 },
                })
                .collect(),
        ),
        EValueKind::Unknown(_) => PropertyValues::None,
    }
}

#[binread]
#[derive(Clone, Debug, Serialize)]
pub struct Joint {
    #[br(map = CStringU16::into_string)]
    pub name: String,
    pub matrix: CMatrix4f,
}

#[binread]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct VertexWeight {
    pub joints: [u8; 4],
    #[br(map = |raw: [u16; 4]| raw.map(|w| w as f32 / WEIGHT_DIVISOR))]
    pub weights: [f32; 4],
}

/// Byte width of each index in a triangle stream.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, FromRepr)]
pub enum EIndexFormat {
    U8 = 1,
    U16 = 2,
    U32 = 4,
}

impl EIndexFormat {
    #[inline]
    pub fn byte_size(self) -> usize { self as usize }

    #[inline]
    fn read(self, data: &[u8]) -> u32 {
        match self {
            Self::U8 => data[0] as u32,
            Self::U16 => u16::from_be_bytes([data[0], data[1]]) as u32,
            Self::U32 => u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
        }
    }
}

/// One triangle corner. Secondary indices are present according to the mesh's
/// component count, in the fixed order normal, texcoord, color.
#[skip_serializing_none]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Corner {
    pub vertex: u32,
    pub normal: Option<u32>,
    pub texcoord: Option<u32>,
    pub color: Option<u32>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Triangle {
    pub corners: [Corner; 3],
}

impl Triangle {
    #[inline]
    pub fn vertices(&self) -> [u32; 3] { self.corners.map(|c| c.vertex) }
}

/// Split form of the mesh mode word: low byte index width, high byte component count.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TriangleMode {
    pub format: EIndexFormat,
    pub components: u8,
}

impl TriangleMode {
    pub const MAX_COMPONENTS: u8 = 4;

    pub fn from_raw(mode: u16, reader: &ChunkReader) -> Result<Self> {
        let width = (mode & 0xFF) as u8;
        let components = (mode >> 8) as u8;
        let Some(format) = EIndexFormat::from_repr(width) else {
            return Err(reader.error(format!("unsupported index width {width} (mode {mode:#06X})")));
        };
        if !(1..=Self::MAX_COMPONENTS).contains(&components) {
            return Err(reader.error(format!(
                "unsupported component count {components} (mode {mode:#06X})"
            )));
        }
        Ok(Self { format, components })
    }

    #[inline]
    pub fn corner_size(self) -> usize { self.format.byte_size() * self.components as usize }

    #[inline]
    pub fn triangle_size(self) -> usize { 3 * self.corner_size() }

    fn read_corner(self, data: &[u8]) -> Corner {
        let size = self.format.byte_size();
        let index = |i: usize| self.format.read(&data[i * size..]);
        Corner {
            vertex: index(0),
            normal: (self.components >= 2).then(|| index(1)),
            texcoord: (self.components >= 3).then(|| index(2)),
            color: (self.components >= 4).then(|| index(3)),
        }
    }

    /// Decodes `data.len() / triangle_size()` triangles.
    pub fn read_triangles(self, data: &[u8]) -> Vec<Triangle> {
        let corner_size = self.corner_size();
        data.chunks_exact(self.triangle_size())
            .map(|tri| Triangle {
                corners: [
                    self.read_corner(&tri[..corner_size]),
                    self.read_corner(&tri[corner_size..2 * corner_size]),
                    self.read_corner(&tri[2 * corner_size..]),
                ],
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Mesh {
    pub material: String,
    pub unk_str: String,
    pub mode: TriangleMode,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    fn read(reader: &mut ChunkReader) -> Result<Self> {
        let material = reader.string()?;
        let unk_str = reader.string()?;
        let count = reader.u16()? as usize;
        let mode = TriangleMode::from_raw(reader.u16()?, reader)?;
        let data = reader.bytes(count * mode.triangle_size())?;
        Ok(Self { material, unk_str, mode, triangles: mode.read_triangles(data) })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Geometry {
    pub name: String,
    pub group: String,
    /// Properties by semantic name, in file order; each list is sorted by slot.
    pub properties: IndexMap<String, Vec<Property>>,
    pub bind_matrix: Option<CMatrix4f>,
    pub joints: Vec<Joint>,
    pub weights: Vec<VertexWeight>,
    pub meshes: Vec<Mesh>,
}

impl Geometry {
    pub fn read(reader: &mut ChunkReader) -> Result<Self> {
        let name = reader.string()?;
        let group = reader.string()?;

        let property_count = reader.u8()?;
        let mut properties: IndexMap<String, Vec<Property>> = IndexMap::new();
        for _ in 0..property_count {
            let (name, property) = Property::read(reader)?;
            properties.entry(name).or_default().push(property);
        }
        for list in properties.values_mut() {
            list.sort_by_key(|p| p.slot);
        }

        let bind_matrix = if reader.u8()? != 0 { Some(reader.read()?) } else { None };

        let joint_count = reader.u8()?;
        let joints = (0..joint_count).map(|_| reader.read()).collect::<Result<Vec<Joint>>>()?;

        let weight_count = reader.u32()?;
        let mut weights = Vec::with_capacity((weight_count as usize).min(reader.remaining() / 12));
        for _ in 0..weight_count {
            weights.push(reader.read::<VertexWeight>()?);
        }

        // Meshes are only kept if every one of them decodes
        let mesh_count = reader.u8()?;
        let meshes = (0..mesh_count).map(|_| Mesh::read(reader)).collect::<Result<Vec<Mesh>>>()?;

        Ok(Self { name, group, properties, bind_matrix, joints, weights, meshes })
    }

    /// Property by name and slot.
    pub fn property(&self, name: &str, slot: u8) -> Option<&Property> {
        self.properties.get(name)?.iter().find(|p| p.slot == slot)
    }

    pub fn properties_of(&self, kind: EValueKind) -> impl Iterator<Item = &Property> {
        self.properties.values().flatten().filter(move |p| p.kind == kind)
    }

    /// Looks up by well-known name first, then by the first property of `kind` in `slot`.
    fn find(&self, name: &str, kind: EValueKind, slot: u8) -> Option<&Property> {
        self.property(name, slot).or_else(|| self.properties_of(kind).find(|p| p.slot == slot))
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        match self.find(POSITION, EValueKind::Position, 0).map(|p| &p.values) {
            Some(PropertyValues::Vec3(v)) => v,
            _ => &[],
        }
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        match self.find(NORMAL, EValueKind::Normal, 0).map(|p| &p.values) {
            Some(PropertyValues::Vec3(v)) => v,
            _ => &[],
        }
    }

    pub fn tex_coords(&self, slot: u8) -> &[Vector2<f32>] {
        match self.find(TEXCOORD, EValueKind::TexCoord, slot).map(|p| &p.values) {
            Some(PropertyValues::Vec2(v)) => v,
            _ => &[],
        }
    }

    pub fn colors(&self) -> &[Vector4<f32>] {
        match self.find(COLOR, EValueKind::Color, 0).map(|p| &p.values) {
            Some(PropertyValues::Color(v)) => v,
            _ => &[],
        }
    }

    pub fn triangle_count(&self) -> usize { self.meshes.iter().map(|m| m.triangles.len()).sum() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::QUANT_DIVISOR,
        util::test_util::{quantize, PayloadWriter},
        Error,
    };

    fn property(w: &mut PayloadWriter, name: &str, kind: u8, slot: u8, width: u8, scale: f32) {
        w.string(name).u8(kind).u8(slot).u8(width).f32(scale);
    }

    /// Geometry with no properties, matrix, joints or weights.
    fn bare(w: &mut PayloadWriter) -> &mut PayloadWriter {
        w.string("box").string("group").u8(0).u8(0).u8(0).u32(0)
    }

    fn read(data: &[u8]) -> Result<Geometry> {
        Geometry::read(&mut ChunkReader::new(K_CHUNK_GEOM, data, 0))
    }

    #[test]
    fn quantized_positions_round_trip() {
        let scale = 1.0;
        let mut w = PayloadWriter::new();
        w.string("box").string("group").u8(1);
        property(&mut w, POSITION, 0, 0, 3, scale);
        w.u32(1);
        for v in [1.0, -1.0, 0.5] {
            w.i16(quantize(v, scale));
        }
        w.u8(0).u8(0).u32(0).u8(0);
        let geom = read(&w.finish()).unwrap();
        let p = geom.positions()[0];
        for (got, want) in [(p.x, 1.0), (p.y, -1.0), (p.z, 0.5)] {
            assert!((got - want).abs() <= 1.0 / QUANT_DIVISOR, "{got} != {want}");
        }
    }

    #[test]
    fn scales_texcoords_and_colors() {
        let mut w = PayloadWriter::new();
        w.string("quad").string("").u8(3);
        property(&mut w, TEXCOORD, 2, 0, 2, 2.0);
        w.u32(1).i16(0x7F00).i16(-0x3F80);
        property(&mut w, COLOR, 3, 0, 3, 1.0);
        w.u32(1).u16(0x7F00).u16(0).u16(0x3F80);
        property(&mut w, "COLOR_ALPHA", 3, 0, 4, 1.0);
        w.u32(1).u16(0).u16(0).u16(0).u16(0x7F00);
        w.u8(0).u8(0).u32(0).u8(0);
        let geom = read(&w.finish()).unwrap();

        let uv = geom.tex_coords(0)[0];
        assert_eq!((uv.x, uv.y), (2.0, -1.0));
        let color = geom.colors()[0];
        assert_eq!((color.x, color.y, color.z, color.w), (1.0, 0.0, 0.5, 1.0));
        match &geom.property("COLOR_ALPHA", 0).unwrap().values {
            PropertyValues::Color(c) => assert_eq!(c[0].w, 1.0),
            v => panic!("unexpected values {v:?}"),
        }
    }

    #[test]
    fn secondary_slots() {
        let mut w = PayloadWriter::new();
        w.string("geo").string("").u8(2);
        property(&mut w, TEXCOORD, 2, 1, 2, 1.0);
        w.u32(1).i16(0).i16(0x7F00);
        property(&mut w, TEXCOORD, 2, 0, 2, 1.0);
        w.u32(1).i16(0x7F00).i16(0);
        w.u8(0).u8(0).u32(0).u8(0);
        let geom = read(&w.finish()).unwrap();
        let list = &geom.properties[TEXCOORD];
        assert_eq!(list.iter().map(|p| p.slot).collect::<Vec<_>>(), [0, 1]);
        assert_eq!(geom.tex_coords(0)[0].x, 1.0);
        assert_eq!(geom.tex_coords(1)[0].y, 1.0);
        assert!(geom.tex_coords(2).is_empty());
    }

    #[test]
    fn falls_back_to_kind_lookup() {
        let mut w = PayloadWriter::new();
        w.string("geo").string("").u8(1);
        property(&mut w, "VERTS", 0, 0, 4, 1.0);
        w.u32(2).bytes(&[0; 16]);
        w.u8(0).u8(0).u32(0).u8(0);
        let geom = read(&w.finish()).unwrap();
        assert_eq!(geom.positions().len(), 2);
        assert!(geom.property(POSITION, 0).is_none());
        assert_eq!(geom.properties_of(EValueKind::Position).count(), 1);
    }

    #[test]
    fn unknown_kind_keeps_raw_bytes() {
        let mut w = PayloadWriter::new();
        w.string("geo").string("").u8(1);
        property(&mut w, "TANGENT", 9, 0, 1, 1.0);
        w.u32(2).bytes(&[1, 2, 3, 4]);
        w.u8(0).u8(0).u32(0).u8(0);
        let geom = read(&w.finish()).unwrap();
        let prop = geom.property("TANGENT", 0).unwrap();
        assert_eq!(prop.kind, EValueKind::Unknown(9));
        assert_eq!(prop.raw, [1, 2, 3, 4]);
        assert!(prop.values.is_empty());
    }

    #[test]
    fn narrow_element_is_fatal() {
        let mut w = PayloadWriter::new();
        w.string("geo").string("").u8(1);
        property(&mut w, POSITION, 0, 0, 1, 1.0);
        w.u32(1).bytes(&[0, 0]);
        w.u8(0).u8(0).u32(0).u8(0);
        assert!(matches!(read(&w.finish()), Err(Error::Decode { .. })));
    }

    #[test]
    fn skinning_data() {
        let mut m = [0.0f32; 16];
        for (i, v) in m.iter_mut().enumerate() {
            *v = i as f32;
        }
        let mut w = PayloadWriter::new();
        w.string("skin").string("").u8(0);
        w.u8(1).matrix(&m);
        w.u8(2).string("root").matrix(&CMatrix4f::IDENTITY.m).string("arm").matrix(&m);
        w.u32(1).bytes(&[0, 1, 0, 0]).u16(0xFFFF).u16(0).u16(0).u16(0);
        w.u8(0);
        let geom = read(&w.finish()).unwrap();

        // Flat layout, element (0, 1) is the second float
        let bind = geom.bind_matrix.as_ref().unwrap();
        assert_eq!(bind.get(0, 1), 1.0);
        assert_eq!(bind.get(1, 0), 4.0);
        assert_eq!(geom.joints.len(), 2);
        assert_eq!(geom.joints[0].name, "root");
        assert_eq!(geom.joints[0].matrix, CMatrix4f::IDENTITY);
        assert_eq!(geom.joints[1].matrix.m, m);
        assert_eq!(geom.weights[0].joints, [0, 1, 0, 0]);
        assert_eq!(geom.weights[0].weights, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn single_component_triangles() {
        let mut w = PayloadWriter::new();
        bare(&mut w).u8(1).string("mat").string("").u16(2).u16(0x0102);
        for i in [0u16, 1, 2, 2, 1, 3] {
            w.u16(i);
        }
        let geom = read(&w.finish()).unwrap();
        let mesh = &geom.meshes[0];
        assert_eq!(mesh.material, "mat");
        assert_eq!(mesh.mode, TriangleMode { format: EIndexFormat::U16, components: 1 });
        assert_eq!(mesh.triangles.len(), 2);
        assert_eq!(mesh.triangles[0].vertices(), [0, 1, 2]);
        assert_eq!(mesh.triangles[1].vertices(), [2, 1, 3]);
        for corner in mesh.triangles.iter().flat_map(|t| t.corners) {
            assert_eq!((corner.normal, corner.texcoord, corner.color), (None, None, None));
        }
    }

    #[test]
    fn interleaved_components() {
        let mut w = PayloadWriter::new();
        bare(&mut w).u8(2);
        // Three components: vertex, normal, texcoord
        w.string("a").string("").u16(1).u16(0x0301);
        w.bytes(&[0, 10, 20, 1, 11, 21, 2, 12, 22]);
        // Four components at 32-bit width
        w.string("b").string("").u16(1).u16(0x0404);
        for i in 0u32..12 {
            w.u32(i);
        }
        let geom = read(&w.finish()).unwrap();
        assert_eq!(geom.triangle_count(), 2);

        let c = geom.meshes[0].triangles[0].corners[2];
        assert_eq!(c, Corner { vertex: 2, normal: Some(12), texcoord: Some(22), color: None });
        let c = geom.meshes[1].triangles[0].corners[1];
        assert_eq!(c, Corner { vertex: 4, normal: Some(5), texcoord: Some(6), color: Some(7) });
    }

    #[test]
    fn unsupported_index_width() {
        let mut w = PayloadWriter::new();
        bare(&mut w).u8(2);
        w.string("ok").string("").u16(1).u16(0x0101).bytes(&[0, 1, 2]);
        w.string("bad").string("").u16(1).u16(0x0103).bytes(&[0; 9]);
        let err = read(&w.finish()).unwrap_err();
        match err {
            Error::Decode { message, .. } => assert!(message.contains("index width 3"), "{message}"),
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn unsupported_component_count() {
        let mut w = PayloadWriter::new();
        bare(&mut w).u8(1).string("m").string("").u16(0).u16(0x0502);
        assert!(matches!(read(&w.finish()), Err(Error::Decode { .. })));
    }

    #[test]
    fn truncated_triangles() {
        let mut w = PayloadWriter::new();
        bare(&mut w).u8(1).string("m").string("").u16(2).u16(0x0101).bytes(&[0, 1, 2, 3]);
        assert!(matches!(read(&w.finish()), Err(Error::Decode { .. })));
    }
}
