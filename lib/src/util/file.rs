use std::{fs::File, path::Path};

use memmap2::{Mmap, MmapOptions};

use crate::{Error, Result};

/// Opens a memory mapped file.
pub fn map_file<P: AsRef<Path>>(path: P) -> Result<Mmap> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io { path: path.to_owned(), source })?;
    let map = unsafe { MmapOptions::new().map(&file) }
        .map_err(|source| Error::Io { path: path.to_owned(), source })?;
    Ok(map)
}
