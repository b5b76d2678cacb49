/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Skin templates: documents with fragments, inheritance and macro dispatch.
//!
//! A skin is literal text interleaved with macro tags:
//!
//! - Values and macros: `<% title %>`, `<% site.title %>`, `<% greet name=ada %>`
//! - Filter chains: `<% title | trim | uppercase %>` (leftmost runs first)
//! - Fragments: `<% subskin sidebar %>` starts a named, separately renderable part
//! - Inheritance: `<% extends base %>` makes another skin the parent
//! - Builtins: `render`, `echo`, `for ... in`, `if [not] ... [or|and]`, `set {...}`
//! - Comments: `<%-- ignored --%>`
//!
//! # Architecture
//!
//! Skins are parsed once by a [`SkinLoader`] and are immutable afterwards, so
//! one `Arc<Skin>` can be rendered from many threads at once. Macros, filters
//! and functions are looked up in a [`HandlerTable`] by their dotted name;
//! data lives in [`SkinValue`]s bound in a [`SkinContext`]. The
//! [`SkinEnvironment`] ties a resolver, the [`SkinCache`] and global handlers
//! together.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use veneer_skin::{MemoryResolver, SkinContext, SkinEnvironment};
//!
//! let resolver = MemoryResolver::with_skins([
//!     ("base", "<h1><% render title %></h1><% subskin title %>Untitled"),
//!     ("page", "<% extends base %>\n<% subskin title %><% name | uppercase %>"),
//! ]);
//! let env = SkinEnvironment::new(Arc::new(resolver));
//! let skin = env.load("page")?;
//!
//! let mut ctx = SkinContext::new();
//! ctx.insert("name", "home");
//! assert_eq!(env.render(&skin, &ctx)?, "<h1>HOME</h1>");
//! # Ok::<(), veneer_skin::SkinError>(())
//! ```

pub mod builtins;
pub mod cache;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod environment;
pub mod error;
mod evaluator;
pub mod handlers;
pub mod loader;
pub mod node;
pub mod resolver;
pub mod skin;
pub mod stdlib;
pub mod tokenizer;
pub mod value;

// Re-export main types at crate root
pub use builtins::Builtin;
pub use cache::SkinCache;
pub use config::EngineConfig;
pub use context::SkinContext;
pub use diagnostics::{RenderDiagnostic, RenderOutput};
pub use environment::SkinEnvironment;
pub use error::{SkinError, SkinResult};
pub use handlers::{FilterCall, HandlerTable, MacroCall};
pub use loader::SkinLoader;
pub use node::{Element, Node, Param, SkinPart};
pub use resolver::{FileSystemResolver, MemoryResolver, NullResolver, SkinResolver};
pub use skin::Skin;
pub use value::SkinValue;
