use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;
use sc3dlib::format::chunk::{Chunk, ChunkBody};

use crate::cmd::load_scene;

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// print a summary of an SC3D file
#[argh(subcommand, name = "info")]
pub struct Args {
    #[argh(positional)]
    /// input file
    input: PathBuf,
    #[argh(option, short = 'f')]
    /// library search folder (default: input directory)
    folder: Option<PathBuf>,
    #[argh(option, short = 'l')]
    /// library to load before the input (repeatable)
    lib: Vec<String>,
}

pub fn run(args: Args) -> Result<()> {
    let (container, resolver) = load_scene(&args.input, args.folder.as_deref(), &args.lib)?;
    log::info!("{}: {} chunks", container.name, container.chunks().len());
    for chunk in container.chunks() {
        log::info!(
            "  {} at {:#X} size {:#X}{} {}",
            chunk.id,
            chunk.offset,
            chunk.size,
            if chunk.crc_ok() { "" } else { " (CRC mismatch)" },
            describe(chunk)
        );
    }
    let registry = resolver.registry();
    if !registry.is_empty() {
        let mut names = registry.names().collect::<Vec<_>>();
        names.sort_unstable();
        log::info!("Libraries ({} parsed): {}", registry.parse_count(), names.join(", "));
    }
    Ok(())
}

fn describe(chunk: &Chunk) -> String {
    match &chunk.body {
        ChunkBody::Header(h) => format!(
            "version {}.{} library {}",
            h.version,
            h.revision,
            h.library.as_deref().unwrap_or("<none>")
        ),
        ChunkBody::Geometry(g) => format!(
            "'{}' {} properties, {} vertices, {} joints, {} meshes, {} triangles",
            g.name,
            g.properties.values().map(Vec::len).sum::<usize>(),
            g.positions().len(),
            g.joints.len(),
            g.meshes.len(),
            g.triangle_count()
        ),
        ChunkBody::NodeList(n) => format!("{} nodes, {} frames", n.len(), n.frame_count()),
        ChunkBody::Material(m) => format!("'{}' shader '{}'", m.name, m.shader),
        ChunkBody::Camera(c) => format!("'{}' fov {}", c.name, c.fov),
        ChunkBody::End => String::new(),
        ChunkBody::Opaque => "(not decoded)".to_string(),
    }
}
