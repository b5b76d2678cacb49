/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Process-wide skin cache.
//!
//! Skins are keyed by origin. The cache is populated lazily by the loader and
//! never invalidated on its own; callers clear or disable it explicitly.
//! Reads vastly outnumber writes, hence the `RwLock`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::skin::Skin;

#[derive(Debug)]
pub struct SkinCache {
    enabled: AtomicBool,
    entries: RwLock<HashMap<PathBuf, Arc<Skin>>>,
}

impl Default for SkinCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SkinCache {
    /// An enabled, empty cache.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A cache that stores nothing until enabled.
    pub fn disabled() -> Self {
        let cache = Self::new();
        cache.enabled.store(false, Ordering::Relaxed);
        cache
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable caching. Disabling drops every cached skin.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        if !enabled {
            self.clear();
        }
    }

    pub fn get(&self, origin: &Path) -> Option<Arc<Skin>> {
        if !self.is_enabled() {
            return None;
        }
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(origin)
            .cloned()
    }

    /// Store a freshly loaded skin and return the cached instance.
    ///
    /// When another thread cached the same origin first, its skin is kept and
    /// returned, so every caller ends up sharing one instance.
    pub fn insert(&self, origin: PathBuf, skin: Arc<Skin>) -> Arc<Skin> {
        if !self.is_enabled() {
            return skin;
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(origin).or_insert(skin))
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SkinPart;
    use indexmap::IndexMap;

    fn skin() -> Arc<Skin> {
        Arc::new(Skin::from_parts(SkinPart::new(), IndexMap::new(), None, None))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = SkinCache::new();
        assert!(cache.is_empty());

        let stored = cache.insert(PathBuf::from("a.html"), skin());
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get(Path::new("a.html")).unwrap(), &stored));
        assert!(cache.get(Path::new("b.html")).is_none());
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = SkinCache::new();
        let first = cache.insert(PathBuf::from("a.html"), skin());
        let second = cache.insert(PathBuf::from("a.html"), skin());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = SkinCache::disabled();
        cache.insert(PathBuf::from("a.html"), skin());
        assert!(cache.is_empty());
        assert!(cache.get(Path::new("a.html")).is_none());
    }

    #[test]
    fn test_disable_clears() {
        let cache = SkinCache::new();
        cache.insert(PathBuf::from("a.html"), skin());
        cache.set_enabled(false);
        assert!(cache.is_empty());
        cache.set_enabled(true);
        cache.insert(PathBuf::from("a.html"), skin());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers() {
        let cache = SkinCache::new();
        let stored = cache.insert(PathBuf::from("shared.html"), skin());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let found = cache.get(Path::new("shared.html")).unwrap();
                    assert!(Arc::ptr_eq(&found, &stored));
                });
            }
        });
    }
}
