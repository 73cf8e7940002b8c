//! Theme descriptors and inheritance chain resolution.
//!
//! A theme lives in its own subdirectory of the themes directory and
//! carries a `theme.json` descriptor naming an optional parent theme and
//! an optional templates subdirectory. Following the parent links yields
//! the inheritance chain; the chain's template roots, ordered from the
//! most-base ancestor to the named theme itself, define the theme layers
//! of the override namespace.
//!
//! Descriptor loading is a collaborator seam ([`DescriptorSource`]) so the
//! resolver never hard-codes a serialization format; the default
//! implementation reads JSON descriptors from disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Conventional templates subdirectory inside a theme.
const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// On-disk descriptor of a single theme.
///
/// Field names match the `theme.json` format:
///
/// ```json
/// { "templates": "custom_templates", "baseTheme": "vanilla" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeDescriptor {
    /// Templates subdirectory override, relative to the theme directory.
    #[serde(default)]
    pub templates: Option<String>,

    /// Parent theme this one inherits from.
    #[serde(default, rename = "baseTheme")]
    pub base_theme: Option<String>,
}

impl ThemeDescriptor {
    /// The templates subdirectory, falling back to the conventional name.
    pub fn templates_dir(&self) -> &str {
        self.templates.as_deref().unwrap_or(DEFAULT_TEMPLATES_DIR)
    }
}

/// Collaborator that produces a theme's descriptor by name.
///
/// A missing or malformed descriptor anywhere in the chain is fatal to the
/// whole compilation: without it the override order cannot be known.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    async fn descriptor(&self, theme: &str) -> Result<ThemeDescriptor>;
}

/// Default descriptor source: reads `<themes_dir>/<theme>/theme.json`.
#[derive(Debug, Clone)]
pub struct JsonDescriptorSource {
    themes_dir: PathBuf,
}

impl JsonDescriptorSource {
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        Self {
            themes_dir: themes_dir.into(),
        }
    }
}

#[async_trait]
impl DescriptorSource for JsonDescriptorSource {
    async fn descriptor(&self, theme: &str) -> Result<ThemeDescriptor> {
        let path = self.themes_dir.join(theme).join("theme.json");
        debug!(path = %path.display(), "loading theme descriptor");
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::descriptor(theme, e.into()))?;
        serde_json::from_str(&content).map_err(|e| Error::descriptor(theme, e.into()))
    }
}

/// Resolve a theme's inheritance chain into template roots, ordered from
/// the most-base ancestor to `start` itself.
///
/// Walks the parent links, accumulating each theme's templates directory,
/// then reverses the accumulated list. A theme with no parent yields a
/// chain of exactly one root. A repeated theme name means the declared
/// chain is cyclic and can never produce a consistent override order, so
/// it is rejected outright.
pub async fn resolve_chain(
    source: &dyn DescriptorSource,
    themes_dir: &Path,
    start: &str,
) -> Result<Vec<PathBuf>> {
    let mut chain = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut current = Some(start.to_string());

    while let Some(name) = current {
        if seen.contains(&name) {
            return Err(Error::ThemeCycle(name));
        }
        let descriptor = source.descriptor(&name).await?;
        chain.push(themes_dir.join(&name).join(descriptor.templates_dir()));
        seen.push(name);
        current = descriptor.base_theme;
    }

    chain.reverse();
    debug!(theme = start, roots = chain.len(), "resolved theme chain");
    Ok(chain)
}
