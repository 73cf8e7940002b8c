//! Template namespace resolution.
//!
//! A compilation run sees many physical template trees: the core
//! templates, every root in the active theme's inheritance chain, and the
//! plugin-contributed mapping. This module flattens them into one logical
//! namespace: a map from canonical [`TemplatePath`] to the physical file
//! that wins at that path.
//!
//! Precedence is nothing more than merge order: each layer is applied on
//! top of the previous ones and overwrites colliding keys. The
//! [`NamespaceBuilder`] applies core first, then the theme chain from the
//! most-base ancestor to the active theme, then plugin entries, so the
//! winning layer for any path is always the last one that defined it.
//!
//! The namespace is built fresh for each run and is never mutated once the
//! per-template fan-out starts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Canonical override-namespace key identifying one logical template.
///
/// Always root-relative, forward-slash separated, with a leading slash
/// (`/admin/header.tpl`), regardless of which layer supplies the file or
/// what the host platform's separator is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplatePath(String);

impl TemplatePath {
    /// Canonicalize the location of `file` relative to `root`.
    ///
    /// Returns `None` if `file` is not under `root`.
    pub fn from_root(root: &Path, file: &Path) -> Option<Self> {
        let relative = file.strip_prefix(root).ok()?;
        let mut canonical = String::new();
        for component in relative.components() {
            canonical.push('/');
            canonical.push_str(&component.as_os_str().to_string_lossy());
        }
        if canonical.is_empty() {
            None
        } else {
            Some(Self(canonical))
        }
    }

    /// Build the key referenced by an `IMPORT` directive operand, which is
    /// written without the leading separator.
    pub fn from_directive(operand: &str) -> Self {
        Self(format!("/{}", operand.trim_start_matches('/')))
    }

    /// The key as a relative path fragment (no leading separator),
    /// suitable for joining onto an output directory.
    pub fn as_relative(&self) -> &str {
        &self.0[1..]
    }

    /// The canonical form, leading slash included.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Semantic origin of a template source root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The always-present base layer.
    Core,
    /// A root from the theme inheritance chain.
    Theme,
    /// A plugin-contributed override.
    Plugin,
}

/// A physical directory of templates plus where it came from.
///
/// Roots are read-only inputs; a compilation run never writes into them.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    pub dir: PathBuf,
    pub origin: Origin,
}

impl SourceRoot {
    pub fn new(dir: impl Into<PathBuf>, origin: Origin) -> Self {
        Self {
            dir: dir.into(),
            origin,
        }
    }
}

/// The resolved mapping from canonical template path to winning physical
/// file. Built once per compilation run, then shared read-only.
pub type Namespace = BTreeMap<TemplatePath, PathBuf>;

/// Map every file under `dir` by its canonical path relative to `dir`.
///
/// Any enumeration failure, including `dir` itself being absent, is
/// fatal to the run.
pub fn walk_root(dir: &Path) -> Result<BTreeMap<TemplatePath, PathBuf>> {
    let mut entries = BTreeMap::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|source| Error::Walk {
            root: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(key) = TemplatePath::from_root(dir, entry.path()) {
            entries.insert(key, entry.path().to_path_buf());
        }
    }
    Ok(entries)
}

/// Ordered merge of layered template sources into a [`Namespace`].
#[derive(Debug, Default)]
pub struct NamespaceBuilder {
    entries: BTreeMap<TemplatePath, PathBuf>,
}

impl NamespaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root` and overlay every file it contains onto the namespace,
    /// overwriting entries from earlier layers at the same path.
    pub fn layer_root(&mut self, root: &SourceRoot) -> Result<&mut Self> {
        let layer = walk_root(&root.dir)?;
        debug!(
            root = %root.dir.display(),
            origin = ?root.origin,
            templates = layer.len(),
            "layering template root"
        );
        self.entries.extend(layer);
        Ok(self)
    }

    /// Overlay pre-resolved entries (the plugin mapping) onto the
    /// namespace.
    pub fn layer_entries(&mut self, entries: BTreeMap<TemplatePath, PathBuf>) -> &mut Self {
        self.entries.extend(entries);
        self
    }

    pub fn build(self) -> Namespace {
        self.entries
    }
}
