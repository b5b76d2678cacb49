/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin resource resolution.
//!
//! This module provides the trait and implementations for finding and reading
//! skin sources from various places (filesystem, memory, etc.). Lookup and
//! reading are separate so that a cached skin costs no read on reuse.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{SkinError, SkinResult};

/// Trait for locating and reading skin sources.
pub trait SkinResolver: Send + Sync {
    /// Find the origin of a skin reference.
    ///
    /// # Arguments
    /// * `reference` - The reference as written in the skin (e.g., "base", "./layout.html")
    /// * `base` - Origin of the referring skin when the lookup is relative to it
    ///
    /// # Returns
    /// The origin identifying the skin, or `None` if not found.
    fn locate(&self, reference: &str, base: Option<&Path>) -> Option<PathBuf>;

    /// Read the source text of a skin previously returned by [`locate`](Self::locate).
    fn read(&self, origin: &Path) -> SkinResult<String>;
}

/// True for references that must be resolved against the referring skin.
pub fn is_relative_reference(reference: &str) -> bool {
    reference.starts_with("./") || reference.starts_with("../")
}

/// Resolver that loads skins from the filesystem.
///
/// Path resolution rules:
/// - With a base origin, the skin's own directory is tried first
/// - Unless the reference starts with `./` or `../`, the search paths are tried next
/// - A reference with no extension takes the base skin's extension, or the
///   default extension when the base has none
#[derive(Debug, Clone, Default)]
pub struct FileSystemResolver {
    search_paths: Vec<PathBuf>,
    default_extension: Option<String>,
}

impl FileSystemResolver {
    /// Create a resolver that searches the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a global lookup root.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Set the extension used for references without one.
    pub fn with_default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = Some(extension.into());
        self
    }

    fn candidates(&self, reference: &str, base: Option<&Path>) -> Vec<PathBuf> {
        let extension = base
            .and_then(|b| b.extension())
            .and_then(|e| e.to_str())
            .or(self.default_extension.as_deref());

        let mut candidates = Vec::new();
        if let Some(base) = base {
            let base_dir = base.parent().unwrap_or(Path::new("."));
            candidates.push(resolve_skin_path(reference, base_dir, extension));
        }
        if !is_relative_reference(reference) {
            if self.search_paths.is_empty() {
                candidates.push(resolve_skin_path(reference, Path::new("."), extension));
            }
            for dir in &self.search_paths {
                candidates.push(resolve_skin_path(reference, dir, extension));
            }
        }
        candidates
    }
}

impl SkinResolver for FileSystemResolver {
    fn locate(&self, reference: &str, base: Option<&Path>) -> Option<PathBuf> {
        self.candidates(reference, base)
            .into_iter()
            .find(|path| path.is_file())
    }

    fn read(&self, origin: &Path) -> SkinResult<String> {
        Ok(std::fs::read_to_string(origin)?)
    }
}

/// Resolver that finds nothing (for skins that never reference others).
#[derive(Debug, Clone, Default)]
pub struct NullResolver;

impl SkinResolver for NullResolver {
    fn locate(&self, _reference: &str, _base: Option<&Path>) -> Option<PathBuf> {
        None
    }

    fn read(&self, origin: &Path) -> SkinResult<String> {
        Err(SkinError::NotFound {
            name: origin.display().to_string(),
        })
    }
}

/// Resolver that serves skins from an in-memory map.
///
/// Keys are slash-separated names (`"base"`, `"layouts/page"`). Relative
/// references are joined onto the directory of the referring skin's key.
/// Useful for testing and for skins bundled into the application.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    skins: HashMap<String, String>,
}

impl MemoryResolver {
    /// Create a new empty memory resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a skin to the resolver.
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.skins.insert(name.into(), source.into());
        self
    }

    /// Create a resolver with the given skins.
    pub fn with_skins(
        skins: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (name, source) in skins {
            resolver.add(name, source);
        }
        resolver
    }

    fn key(path: &Path) -> String {
        normalize_path(path).to_string_lossy().replace('\\', "/")
    }
}

impl SkinResolver for MemoryResolver {
    fn locate(&self, reference: &str, base: Option<&Path>) -> Option<PathBuf> {
        let mut keys = Vec::new();
        if let Some(base) = base {
            let base_dir = base.parent().unwrap_or(Path::new(""));
            keys.push(Self::key(&base_dir.join(reference)));
        }
        if !is_relative_reference(reference) {
            keys.push(Self::key(Path::new(reference)));
        }
        keys.into_iter()
            .find(|key| self.skins.contains_key(key))
            .map(PathBuf::from)
    }

    fn read(&self, origin: &Path) -> SkinResult<String> {
        self.skins
            .get(&Self::key(origin))
            .cloned()
            .ok_or_else(|| SkinError::NotFound {
                name: origin.display().to_string(),
            })
    }
}

/// Resolve the path to a skin file inside `dir`.
///
/// 1. If the reference has an extension: use it as-is
/// 2. Otherwise: append `extension` when one is known
///
/// # Examples
///
/// ```ignore
/// // dir: /skins, extension: html, reference: "header"       → /skins/header.html
/// // dir: /skins, extension: html, reference: "header.txt"   → /skins/header.txt
/// // dir: /skins, extension: html, reference: "../inc/head"  → /inc/head.html
/// ```
pub fn resolve_skin_path(reference: &str, dir: &Path, extension: Option<&str>) -> PathBuf {
    let joined = dir.join(reference);
    let path = match extension {
        Some(ext) if !ext.is_empty() && Path::new(reference).extension().is_none() => {
            let mut os = joined.into_os_string();
            os.push(".");
            os.push(ext);
            PathBuf::from(os)
        }
        _ => joined,
    };
    normalize_path(&path)
}

/// Lexically remove `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
