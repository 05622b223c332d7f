//! Decoder for SC3D chunked 3D asset containers.
//!
//! An SC3D file is the `SC3D` magic followed by a stream of length-prefixed,
//! CRC-checked chunks. [`Container`] splits the stream and dispatches every
//! chunk to its decoder; [`ImportResolver`] loads the libraries that headers
//! reference and memoizes them in an [`ImportRegistry`].

pub mod error;
pub mod format;
pub mod import;
pub mod util;

pub use error::{Error, Result};
pub use format::container::Container;
pub use import::{ImportRegistry, ImportResolver};
