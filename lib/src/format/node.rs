use std::collections::HashMap;

use bitflags::bitflags;
use mint::{Quaternion, Vector3};
use serde_derive::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    format::{dequantize, FourCC},
    util::read::ChunkReader,
    Result,
};

// Scene nodes & animation
pub const K_CHUNK_NODE: FourCC = FourCC(*b"NODE");

bitflags! {
    /// Channels stored in every frame after the first.
    #[derive(Default, Serialize)]
    #[serde(transparent)]
    pub struct ChannelFlags: u8 {
        const SCALE_X = 1 << 6;
        const SCALE_Y = 1 << 5;
        const SCALE_Z = 1 << 4;
        const POSITION_X = 1 << 3;
        const POSITION_Y = 1 << 2;
        const POSITION_Z = 1 << 1;
        const ROTATION = 1 << 0;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaterialBinding {
    pub symbol: String,
    pub target: String,
}

/// What a node instantiates, e.g. a geometry or camera.
#[derive(Clone, Debug, Serialize)]
pub struct Target {
    pub kind: FourCC,
    pub name: String,
    pub bindings: Vec<MaterialBinding>,
}

impl Target {
    fn read(reader: &mut ChunkReader) -> Result<Self> {
        let kind = reader.four_cc()?;
        let name = reader.string()?;
        let count = reader.u16()?;
        let mut bindings = Vec::with_capacity(count as usize);
        for _ in 0..count {
            bindings.push(MaterialBinding { symbol: reader.string()?, target: reader.string()? });
        }
        Ok(Self { kind, name, bindings })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub index: u16,
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

fn read_rotation(reader: &mut ChunkReader) -> Result<Quaternion<f32>> {
    let [x, y, z, w] = reader.read::<[i16; 4]>()?.map(|v| dequantize(v, 1.0));
    Ok(Quaternion { v: Vector3 { x, y, z }, s: w })
}

/// Reads the axes selected by `mask`, keeping `base` for the rest.
fn read_axes(
    reader: &mut ChunkReader,
    flags: ChannelFlags,
    mask: [ChannelFlags; 3],
    base: Vector3<f32>,
) -> Result<Vector3<f32>> {
    let mut out: [f32; 3] = base.into();
    for (axis, flag) in out.iter_mut().zip(mask) {
        if flags.contains(flag) {
            *axis = reader.f32()?;
        }
    }
    Ok(out.into())
}

impl Frame {
    fn read_first(reader: &mut ChunkReader) -> Result<Self> {
        let index = reader.u16()?;
        let rotation = read_rotation(reader)?;
        let position = reader.read::<[f32; 3]>()?.into();
        let scale = reader.read::<[f32; 3]>()?.into();
        Ok(Self { index, position, rotation, scale })
    }

    /// Reads a delta frame; absent channels come from `first`.
    fn read_delta(reader: &mut ChunkReader, flags: ChannelFlags, first: &Frame) -> Result<Self> {
        let index = reader.u16()?;
        let rotation = if flags.contains(ChannelFlags::ROTATION) {
            read_rotation(reader)?
        } else {
            first.rotation
        };
        let position = read_axes(
            reader,
            flags,
            [ChannelFlags::POSITION_X, ChannelFlags::POSITION_Y, ChannelFlags::POSITION_Z],
            first.position,
        )?;
        let scale = read_axes(
            reader,
            flags,
            [ChannelFlags::SCALE_X, ChannelFlags::SCALE_Y, ChannelFlags::SCALE_Z],
            first.scale,
        )?;
        Ok(Self { index, position, rotation, scale })
    }
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub name: String,
    pub parent_name: String,
    /// Index of the parent in the owning [`NodeList`]; `None` for roots.
    pub parent: Option<usize>,
    pub target: Option<Target>,
    pub flags: ChannelFlags,
    pub frames: Vec<Frame>,
}

impl Node {
    fn read(reader: &mut ChunkReader) -> Result<Self> {
        let name = reader.string()?;
        let parent_name = reader.string()?;
        let target = if reader.u16()? != 0 { Some(Target::read(reader)?) } else { None };

        let frame_count = reader.u16()?;
        let mut flags = ChannelFlags::empty();
        let mut frames = Vec::with_capacity(frame_count as usize);
        if frame_count != 0 {
            flags = ChannelFlags::from_bits_truncate(reader.u8()?);
            let first = Frame::read_first(reader)?;
            frames.push(first);
            for _ in 1..frame_count {
                frames.push(Frame::read_delta(reader, flags, &first)?);
            }
        }
        Ok(Self { name, parent_name, parent: None, target, flags, frames })
    }

    #[inline]
    pub fn is_root(&self) -> bool { self.parent.is_none() }
}

/// Node arena with parent links resolved by name.
#[derive(Clone, Debug, Serialize)]
pub struct NodeList {
    nodes: Vec<Node>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
    #[serde(skip)]
    children: Vec<Vec<usize>>,
}

impl NodeList {
    pub fn read(reader: &mut ChunkReader) -> Result<Self> {
        let count = reader.u16()?;
        let mut nodes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            nodes.push(Node::read(reader)?);
        }
        Ok(Self::new(nodes))
    }

    /// Builds the arena from nodes in file order, resolving parent names.
    pub fn new(mut nodes: Vec<Node>) -> Self {
        let mut lookup = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            lookup.entry(node.name.clone()).or_insert(idx);
        }
        let mut children = vec![vec![]; nodes.len()];
        for (idx, node) in nodes.iter_mut().enumerate() {
            node.parent = None;
            if node.parent_name.is_empty() {
                continue;
            }
            match lookup.get(&node.parent_name) {
                Some(&parent) if parent != idx => {
                    node.parent = Some(parent);
                    children[parent].push(idx);
                }
                _ => log::warn!(
                    "NODE: parent '{}' of '{}' not found, treating as root",
                    node.parent_name,
                    node.name
                ),
            }
        }
        Self { nodes, lookup, children }
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] { &self.nodes }

    #[inline]
    pub fn len(&self) -> usize { self.nodes.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    pub fn get(&self, idx: usize) -> Option<&Node> { self.nodes.get(idx) }

    /// Index of the first node called `name`.
    pub fn find(&self, name: &str) -> Option<usize> { self.lookup.get(name).copied() }

    pub fn parent(&self, idx: usize) -> Option<&Node> { self.nodes.get(idx)?.parent.map(|p| &self.nodes[p]) }

    pub fn children(&self, idx: usize) -> &[usize] {
        self.children.get(idx).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_root()).map(|(i, _)| i)
    }

    pub fn frame_count(&self) -> usize { self.nodes.iter().map(|n| n.frames.len()).sum() }
}
