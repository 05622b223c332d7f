//! Library import resolution.
//!
//! A container header may name a library container holding shared geometry.
//! [`ImportResolver`] finds the library relative to a search root, parses it
//! and registers it in an [`ImportRegistry`], so every name is parsed at most
//! once per registry.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{format::head::Header, util::file::map_file, Container, Error, Result};

pub const LIBRARY_EXTENSION: &str = "scw";

/// Subdirectory of the search root tried when a library is not found directly.
pub const FALLBACK_DIR: &str = "sc3d";

/// Canonical registry key: trimmed, ending in the lowercase library extension.
pub fn normalize_library_name(name: &str) -> String {
    let name = name.trim();
    let has_ext = Path::new(name)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case(LIBRARY_EXTENSION));
    let stem = if has_ext { &name[..name.len() - LIBRARY_EXTENSION.len() - 1] } else { name };
    format!("{stem}.{LIBRARY_EXTENSION}")
}

/// Memoized library containers by normalized name.
#[derive(Debug, Default)]
pub struct ImportRegistry {
    libraries: HashMap<String, Arc<Container>>,
    parse_count: usize,
}

impl ImportRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, name: &str) -> Option<&Arc<Container>> {
        self.libraries.get(&normalize_library_name(name))
    }

    /// Registers a parsed container, replacing any previous entry with the same name.
    pub fn insert(&mut self, name: &str, container: Arc<Container>) -> Arc<Container> {
        self.libraries.insert(normalize_library_name(name), container.clone());
        container
    }

    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    #[inline]
    pub fn len(&self) -> usize { self.libraries.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.libraries.is_empty() }

    /// Number of containers parsed on behalf of this registry.
    #[inline]
    pub fn parse_count(&self) -> usize { self.parse_count }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.libraries.keys().map(String::as_str) }
}

pub struct ImportResolver {
    search_root: PathBuf,
    registry: ImportRegistry,
}

impl ImportResolver {
    pub fn new<P: Into<PathBuf>>(search_root: P) -> Self {
        Self { search_root: search_root.into(), registry: ImportRegistry::new() }
    }

    /// Resolves against an existing registry.
    pub fn with_registry<P: Into<PathBuf>>(search_root: P, registry: ImportRegistry) -> Self {
        Self { search_root: search_root.into(), registry }
    }

    #[inline]
    pub fn search_root(&self) -> &Path { &self.search_root }

    #[inline]
    pub fn registry(&self) -> &ImportRegistry { &self.registry }

    pub fn into_registry(self) -> ImportRegistry { self.registry }

    /// Returns the library called `name`, loading it and its own library on first use.
    pub fn resolve(&mut self, name: &str) -> Result<Arc<Container>> {
        let key = normalize_library_name(name);
        if let Some(container) = self.registry.libraries.get(&key) {
            log::debug!("Library '{key}' already loaded");
            return Ok(container.clone());
        }

        let path = self.locate(&key)?;
        log::info!("Loading library '{}'", path.display());
        let container = Arc::new(Container::parse(map_file(&path)?, key.clone())?);
        self.registry.parse_count += 1;
        // Registered before recursing so cyclic references end on a registry hit
        self.registry.insert(&key, container.clone());

        if let Some(library) = container.library() {
            if let Err(e) = self.resolve(library) {
                self.registry.libraries.remove(&key);
                return Err(e);
            }
        }
        Ok(container)
    }

    /// Candidate path for a normalized library name: the search root, then its fallback subdirectory.
    pub fn locate(&self, key: &str) -> Result<PathBuf> {
        let candidates = [self.search_root.join(key), self.search_root.join(FALLBACK_DIR).join(key)];
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Ok(path.clone()),
            None => Err(Error::MissingLibrary { name: key.to_string(), tried: candidates.to_vec() }),
        }
    }

    /// Resolves the library named by the header of `container`, if any.
    pub fn resolve_imports(&mut self, container: &Container) -> Result<Option<Arc<Container>>> {
        container.library().map(|name| self.resolve(name)).transpose()
    }

    /// Registered library referenced by `header`, without loading anything.
    pub fn library_of(&self, header: &Header) -> Option<&Arc<Container>> {
        self.registry.get(header.library.as_deref()?)
    }
}
