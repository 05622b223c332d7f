use std::{io, path::PathBuf};

use thiserror::Error;

use crate::format::FourCC;

#[derive(Debug, Error)]
pub enum Error {
    /// The buffer is not an SC3D container.
    #[error("Invalid SC3D file: {0}")]
    Validation(String),
    /// A chunk could not be decoded. `offset` is absolute within the container buffer.
    #[error("Failed to decode {tag} chunk at {offset:#X}: {message}")]
    Decode { tag: FourCC, offset: usize, message: String },
    #[error("Failed to locate library '{name}' (tried {})", join_paths(.tried))]
    MissingLibrary { name: String, tried: Vec<PathBuf> },
    #[error("Failed to read '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn join_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| format!("'{}'", p.display())).collect::<Vec<_>>().join(", ")
}
