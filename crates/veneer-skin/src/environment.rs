/*
 * environment.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The skin environment: the entry point for loading and rendering.
//!
//! An environment bundles a resolver, the skin cache, engine configuration
//! and global handlers. Globals are overlaid onto the caller's context once
//! per render call; handlers in the caller's context win on name clashes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::SkinCache;
use crate::config::EngineConfig;
use crate::context::SkinContext;
use crate::diagnostics::RenderOutput;
use crate::error::SkinResult;
use crate::handlers::{FilterCall, HandlerTable, MacroCall};
use crate::loader::SkinLoader;
use crate::resolver::{FileSystemResolver, SkinResolver};
use crate::skin::Skin;
use crate::stdlib::standard_filters;
use crate::value::SkinValue;

#[derive(Debug)]
pub struct SkinEnvironment {
    config: EngineConfig,
    loader: SkinLoader,
    globals: HandlerTable,
}

impl SkinEnvironment {
    /// An environment with default configuration and the standard filters.
    pub fn new(resolver: Arc<dyn SkinResolver>) -> Self {
        Self::with_config(resolver, EngineConfig::default())
    }

    pub fn with_config(resolver: Arc<dyn SkinResolver>, config: EngineConfig) -> Self {
        let cache = if config.cache {
            SkinCache::new()
        } else {
            SkinCache::disabled()
        };
        let loader = SkinLoader::new(resolver, Arc::new(cache), config.max_depth);
        Self {
            config,
            loader,
            globals: standard_filters(),
        }
    }

    /// An environment reading skins from the filesystem as configured.
    pub fn from_config(config: EngineConfig) -> Self {
        let mut resolver = FileSystemResolver::new();
        for path in &config.search_paths {
            resolver = resolver.with_search_path(path);
        }
        if let Some(extension) = &config.default_extension {
            resolver = resolver.with_default_extension(extension);
        }
        Self::with_config(Arc::new(resolver), config)
    }

    /// Use a cache shared with other environments.
    pub fn with_cache(mut self, cache: Arc<SkinCache>) -> Self {
        self.loader = SkinLoader::new(Arc::clone(self.loader.resolver()), cache, self.config.max_depth);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SkinCache> {
        self.loader.cache()
    }

    pub fn loader(&self) -> &SkinLoader {
        &self.loader
    }

    pub fn globals(&self) -> &HandlerTable {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut HandlerTable {
        &mut self.globals
    }

    /// Register a macro available to every render call.
    pub fn register_macro<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&MacroCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.globals.register_macro(name, f);
        self
    }

    /// Register a filter available to every render call.
    pub fn register_filter<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(SkinValue, &FilterCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.globals.register_filter(name, f);
        self
    }

    /// Register a function available to every render call.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&MacroCall<'_>) -> SkinResult<SkinValue> + Send + Sync + 'static,
    {
        self.globals.register_function(name, f);
        self
    }

    /// Load a skin by reference through the resolver's global lookup.
    pub fn load(&self, reference: &str) -> SkinResult<Arc<Skin>> {
        self.loader.load(reference, None)
    }

    /// Load the skin stored at `path`.
    pub fn load_file(&self, path: &Path) -> SkinResult<Arc<Skin>> {
        self.loader.load_origin(path)
    }

    /// Load a skin from source text. Its references use global lookup only.
    pub fn load_source(&self, source: &str) -> SkinResult<Arc<Skin>> {
        self.loader.load_source(source, None)
    }

    /// Load a skin from source text as if it were stored at `origin`.
    pub fn load_source_at(&self, source: &str, origin: impl Into<PathBuf>) -> SkinResult<Arc<Skin>> {
        self.loader.load_source(source, Some(origin.into()))
    }

    /// Render a skin's main body.
    pub fn render(&self, skin: &Skin, context: &SkinContext) -> SkinResult<String> {
        skin.render_main(self, context)
    }

    /// Render one fragment of a skin.
    pub fn render_fragment(
        &self,
        skin: &Skin,
        name: &str,
        context: &SkinContext,
    ) -> SkinResult<String> {
        skin.render_fragment(self, name, context)
    }

    /// Render a skin's main body and collect diagnostics.
    pub fn render_with_diagnostics(
        &self,
        skin: &Skin,
        context: &SkinContext,
    ) -> SkinResult<RenderOutput> {
        skin.render_with_diagnostics(self, context)
    }

    /// Render one fragment of a skin and collect diagnostics.
    pub fn render_fragment_with_diagnostics(
        &self,
        skin: &Skin,
        name: &str,
        context: &SkinContext,
    ) -> SkinResult<RenderOutput> {
        skin.render_fragment_with_diagnostics(self, name, context)
    }

    /// The caller's context with the global handlers underneath its own.
    pub(crate) fn overlay(&self, context: &SkinContext) -> SkinContext {
        if self.globals.is_empty() {
            return context.clone();
        }
        context.with_handlers(self.globals.merged(context.handlers()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryResolver;

    #[test]
    fn test_global_macro() {
        let mut env = SkinEnvironment::new(Arc::new(MemoryResolver::new()));
        env.register_macro("version", |_| Ok(SkinValue::from("1.0")));
        let skin = env.load_source("v<% version %>").unwrap();
        assert_eq!(env.render(&skin, &SkinContext::new()).unwrap(), "v1.0");
    }

    #[test]
    fn test_context_wins_over_globals() {
        let mut env = SkinEnvironment::new(Arc::new(MemoryResolver::new()));
        env.register_macro("who", |_| Ok(SkinValue::from("global")));
        let skin = env.load_source("<% who %>").unwrap();

        let mut ctx = SkinContext::new();
        ctx.register_macro("who", |_| Ok(SkinValue::from("local")));
        assert_eq!(env.render(&skin, &ctx).unwrap(), "local");
        // The caller's context is left as it was
        assert!(ctx.handlers().filter_handler("uppercase").is_none());
    }

    #[test]
    fn test_config_disables_cache() {
        let resolver = MemoryResolver::with_skins([("page", "P")]);
        let config = EngineConfig {
            cache: false,
            ..EngineConfig::default()
        };
        let env = SkinEnvironment::with_config(Arc::new(resolver), config);
        env.load("page").unwrap();
        assert!(env.cache().is_empty());
        assert!(!env.cache().is_enabled());
    }

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(SkinCache::new());
        let resolver: Arc<dyn SkinResolver> = Arc::new(MemoryResolver::with_skins([("page", "P")]));
        let a = SkinEnvironment::new(Arc::clone(&resolver)).with_cache(Arc::clone(&cache));
        let b = SkinEnvironment::new(resolver).with_cache(Arc::clone(&cache));

        let first = a.load("page").unwrap();
        let second = b.load("page").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_source_at_resolves_relative_references() {
        let resolver = MemoryResolver::with_skins([("layouts/base", "[<% render body %>]")]);
        let env = SkinEnvironment::new(Arc::new(resolver));
        let skin = env
            .load_source_at("<% extends ./base %><% subskin body %>inline", "layouts/inline")
            .unwrap();

        assert_eq!(env.render(&skin, &SkinContext::new()).unwrap(), "[inline]");
        // Only the parent came from the resolver
        assert_eq!(env.cache().len(), 1);
    }

    #[test]
    fn test_render_fragment_entry_point() {
        let env = SkinEnvironment::new(Arc::new(MemoryResolver::new()));
        let skin = env.load_source("main<% subskin side %>side").unwrap();
        assert_eq!(
            env.render_fragment(&skin, "side", &SkinContext::new()).unwrap(),
            "side"
        );
    }

    #[test]
    fn test_environment_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SkinEnvironment>();
    }
}
