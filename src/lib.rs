//! viewforge: layered template compilation.
//!
//! viewforge flattens a hierarchy of template sources (a core set, an
//! inheritable theme chain, and plugin-contributed overrides) into one
//! output tree where every template has had its `<!-- IMPORT ... -->`
//! partial directives recursively inlined.
//!
//! # Pipeline
//!
//! ```text
//! theme chain  ──►  namespace (core → themes → plugins)  ──►  views/
//!                        per template: read → inline → write
//! ```
//!
//! - [`theme`] walks a theme's `baseTheme` links into an ordered list of
//!   template roots.
//! - [`namespace`] merges core, theme, and plugin layers into one mapping
//!   from canonical template path to winning physical file.
//! - [`inline`] recursively splices partial includes, tolerating missing
//!   and self-referential directives without failing the build.
//! - [`compiler`] orchestrates a full pass: reset the output tree, let
//!   collaborators respond, then compile every template concurrently.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use viewforge::{Compiler, CompilerConfig, TemplateRoot};
//!
//! # async fn run() -> viewforge::Result<()> {
//! let config = CompilerConfig {
//!     views_dir: PathBuf::from("build/views"),
//!     core_templates_dir: PathBuf::from("src/views"),
//!     themes_dir: PathBuf::from("themes"),
//!     template_root: TemplateRoot::Theme("midnight".to_string()),
//! };
//! Compiler::new(config).compile().await?;
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod hooks;
pub mod inline;
pub mod namespace;
pub mod theme;

pub use compiler::Compiler;
pub use config::{CompilerConfig, TemplateRoot};
pub use error::{Error, Result};
