/*
 * skin.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin documents.
//!
//! A [`Skin`] holds a main part, named fragments (`<% subskin name %>`) and
//! an optional shared parent (`<% extends name %>`). Lookups fall back from a
//! skin to its parent chain, so a child can override single fragments of its
//! parent while reusing the parent's layout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::context::SkinContext;
use crate::diagnostics::RenderOutput;
use crate::environment::SkinEnvironment;
use crate::error::SkinResult;
use crate::evaluator::Renderer;
use crate::node::SkinPart;

/// A parsed skin. Immutable once loaded; safe to share between threads.
#[derive(Debug)]
pub struct Skin {
    main: SkinPart,
    fragments: IndexMap<String, SkinPart>,
    parent: Option<Arc<Skin>>,
    origin: Option<PathBuf>,
    /// Fragment names that resolved to separate skins, memoized per skin.
    external: RwLock<HashMap<String, Arc<Skin>>>,
}

impl Skin {
    pub(crate) fn from_parts(
        main: SkinPart,
        fragments: IndexMap<String, SkinPart>,
        parent: Option<Arc<Skin>>,
        origin: Option<PathBuf>,
    ) -> Self {
        Self {
            main,
            fragments,
            parent,
            origin,
            external: RwLock::new(HashMap::new()),
        }
    }

    /// This skin's own main part (without parent fallback).
    pub fn main(&self) -> &SkinPart {
        &self.main
    }

    /// This skin's own fragment (without parent fallback).
    pub fn fragment(&self, name: &str) -> Option<&SkinPart> {
        self.fragments.get(name)
    }

    /// Names of this skin's own fragments, in declaration order.
    pub fn fragment_names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    pub fn parent(&self) -> Option<&Arc<Skin>> {
        self.parent.as_ref()
    }

    /// Where this skin was loaded from. Relative references resolve against it.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// The part list for a fragment, or for the main body when `name` is `None`.
    ///
    /// Fragments fall back up the parent chain when missing here. The main
    /// body falls back to the parent's when this skin's own is empty; it is
    /// always present, possibly empty.
    pub fn get_parts(&self, name: Option<&str>) -> Option<&SkinPart> {
        match name {
            None => match &self.parent {
                Some(parent) if self.main.is_empty() => parent.get_parts(None),
                _ => Some(&self.main),
            },
            Some(name) => self
                .fragments
                .get(name)
                .or_else(|| self.parent.as_ref().and_then(|p| p.get_parts(Some(name)))),
        }
    }

    /// Render the main body.
    pub fn render_main(&self, env: &SkinEnvironment, context: &SkinContext) -> SkinResult<String> {
        let renderer = Renderer::new(env);
        renderer.render_main(self, &env.overlay(context))
    }

    /// Render a named fragment.
    ///
    /// Falls back to the parent chain, then to a separate skin found by
    /// resolving `name` relative to this skin's origin. A name that resolves
    /// nowhere is an error.
    pub fn render_fragment(
        &self,
        env: &SkinEnvironment,
        name: &str,
        context: &SkinContext,
    ) -> SkinResult<String> {
        let renderer = Renderer::new(env);
        renderer.render_fragment(self, name, &env.overlay(context))
    }

    /// Render the main body and report diagnostics.
    pub fn render_with_diagnostics(
        &self,
        env: &SkinEnvironment,
        context: &SkinContext,
    ) -> SkinResult<RenderOutput> {
        let renderer = Renderer::new(env);
        let text = renderer.render_main(self, &env.overlay(context))?;
        Ok(RenderOutput {
            text,
            diagnostics: renderer.into_diagnostics(),
        })
    }

    /// Render a named fragment and report diagnostics.
    pub fn render_fragment_with_diagnostics(
        &self,
        env: &SkinEnvironment,
        name: &str,
        context: &SkinContext,
    ) -> SkinResult<RenderOutput> {
        let renderer = Renderer::new(env);
        let text = renderer.render_fragment(self, name, &env.overlay(context))?;
        Ok(RenderOutput {
            text,
            diagnostics: renderer.into_diagnostics(),
        })
    }

    pub(crate) fn external_fragment(&self, name: &str) -> Option<Arc<Skin>> {
        self.external
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Memoize an externally resolved fragment. The first stored skin wins.
    pub(crate) fn remember_external(&self, name: &str, skin: Arc<Skin>) -> Arc<Skin> {
        let mut external = self.external.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(external.entry(name.to_string()).or_insert(skin))
    }
}
