/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin loading.
//!
//! The loader drives the tokenizer and partitions its output into the main
//! part and named fragments. `<% subskin name %>` switches the collector to a
//! new fragment; `<% extends name %>` loads the parent skin immediately.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::cache::SkinCache;
use crate::error::{SkinError, SkinResult};
use crate::node::{Element, Node, SkinPart};
use crate::resolver::{SkinResolver, is_relative_reference};
use crate::skin::Skin;
use crate::tokenizer::{Token, tokenize};

const EXTENDS: &str = "extends";
const SUBSKIN: &str = "subskin";

/// Loads skins through a resolver, sharing results through a cache.
#[derive(Clone)]
pub struct SkinLoader {
    resolver: Arc<dyn SkinResolver>,
    cache: Arc<SkinCache>,
    max_depth: usize,
}

impl std::fmt::Debug for SkinLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinLoader")
            .field("cache", &self.cache)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl SkinLoader {
    pub fn new(resolver: Arc<dyn SkinResolver>, cache: Arc<SkinCache>, max_depth: usize) -> Self {
        Self {
            resolver,
            cache,
            max_depth,
        }
    }

    pub fn cache(&self) -> &Arc<SkinCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &Arc<dyn SkinResolver> {
        &self.resolver
    }

    /// Load a skin from raw source text. Such skins are never cached.
    ///
    /// `origin`, when given, is where relative references are resolved from.
    pub fn load_source(&self, source: &str, origin: Option<PathBuf>) -> SkinResult<Arc<Skin>> {
        Ok(Arc::new(self.build(source, origin, 0)?))
    }

    /// Load the skin a reference resolves to, relative to `base` if given.
    pub fn load(&self, reference: &str, base: Option<&Path>) -> SkinResult<Arc<Skin>> {
        self.find(reference, base)?.ok_or_else(|| SkinError::NotFound {
            name: reference.to_string(),
        })
    }

    /// Like [`load`](Self::load), but a reference that resolves nowhere is `None`.
    pub fn find(&self, reference: &str, base: Option<&Path>) -> SkinResult<Option<Arc<Skin>>> {
        match self.resolver.locate(reference, base) {
            Some(origin) => self.load_origin_at_depth(origin, 0).map(Some),
            None => Ok(None),
        }
    }

    /// Load the skin stored at a known origin (e.g., a file path).
    pub fn load_origin(&self, origin: &Path) -> SkinResult<Arc<Skin>> {
        self.load_origin_at_depth(origin.to_path_buf(), 0)
    }

    fn load_origin_at_depth(&self, origin: PathBuf, depth: usize) -> SkinResult<Arc<Skin>> {
        if let Some(skin) = self.cache.get(&origin) {
            tracing::trace!(origin = %origin.display(), "Skin cache hit");
            return Ok(skin);
        }

        let source = self.resolver.read(&origin)?;
        let skin = self.build(&source, Some(origin.clone()), depth)?;
        tracing::debug!(
            origin = %origin.display(),
            fragments = skin.fragment_names().count(),
            "Loaded skin"
        );
        Ok(self.cache.insert(origin, Arc::new(skin)))
    }

    /// Partition tokenizer output into a skin.
    fn build(&self, source: &str, origin: Option<PathBuf>, depth: usize) -> SkinResult<Skin> {
        let origin_label = origin
            .as_ref()
            .map_or_else(|| "<string>".to_string(), |o| o.display().to_string());
        let tokens = tokenize(source, &origin_label)?;

        let mut main = SkinPart::new();
        let mut fragments: IndexMap<String, SkinPart> = IndexMap::new();
        let mut current: Option<(String, SkinPart)> = None;
        let mut parent = None;

        for token in tokens {
            let element = match token {
                Token::Text(text) => Element::Text(text),
                Token::Macro(node) if node.name == EXTENDS => {
                    parent = Some(self.load_parent(&node, origin.as_deref(), &origin_label, depth)?);
                    continue;
                }
                Token::Macro(node) if node.name == SUBSKIN => {
                    let name = fragment_name(&node, &origin_label)?;
                    if let Some((name, part)) = current.take() {
                        fragments.insert(name, part);
                    }
                    let filter = node.filter.map(|f| *f);
                    current = Some((name, SkinPart::with_filter(filter)));
                    continue;
                }
                Token::Macro(node) => Element::Macro(node),
            };
            match &mut current {
                Some((_, part)) => part.push(element),
                None => main.push(element),
            }
        }
        if let Some((name, part)) = current {
            fragments.insert(name, part);
        }

        main.trim_trailing_whitespace();
        Ok(Skin::from_parts(main, fragments, parent, origin))
    }

    fn load_parent(
        &self,
        node: &Node,
        origin: Option<&Path>,
        origin_label: &str,
        depth: usize,
    ) -> SkinResult<Arc<Skin>> {
        let reference = node
            .parameters
            .first()
            .and_then(|p| p.as_text())
            .ok_or_else(|| SkinError::ParseError {
                origin: origin_label.to_string(),
                message: "extends requires a skin name".to_string(),
            })?;

        if depth >= self.max_depth {
            return Err(SkinError::RecursiveExtends {
                name: reference.to_string(),
                max_depth: self.max_depth,
            });
        }

        let base = origin.filter(|_| is_relative_reference(reference));
        let parent_origin =
            self.resolver
                .locate(reference, base)
                .ok_or_else(|| SkinError::NotFound {
                    name: reference.to_string(),
                })?;
        tracing::debug!(parent = %parent_origin.display(), child = origin_label, "Resolving extends");
        self.load_origin_at_depth(parent_origin, depth + 1)
    }
}

fn fragment_name(node: &Node, origin_label: &str) -> SkinResult<String> {
    node.parameters
        .first()
        .and_then(|p| p.as_text())
        .map(str::to_string)
        .ok_or_else(|| SkinError::ParseError {
            origin: origin_label.to_string(),
            message: "subskin requires a name".to_string(),
        })
}
