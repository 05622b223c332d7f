pub mod dump;
pub mod info;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use argh::FromArgs;
use sc3dlib::{Container, ImportResolver};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
pub enum SubCommand {
    Info(info::Args),
    Dump(dump::Args),
}

/// Parses `path` and resolves its header import. Libraries are searched in
/// `folder`, or next to the input if unset.
pub fn load_scene(
    path: &Path,
    folder: Option<&Path>,
    preload: &[String],
) -> Result<(Arc<Container>, ImportResolver)> {
    let root = match folder {
        Some(folder) => folder.to_path_buf(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
    };
    let mut resolver = ImportResolver::new(root);
    for name in preload {
        resolver.resolve(name).with_context(|| format!("Failed to preload library '{name}'"))?;
    }

    let container =
        Container::open(path).with_context(|| format!("Failed to load '{}'", path.display()))?;
    if let Some(library) = resolver.resolve_imports(&container)? {
        log::info!("Resolved library '{}' ({} chunks)", library.name, library.chunks().len());
    }
    Ok((Arc::new(container), resolver))
}
