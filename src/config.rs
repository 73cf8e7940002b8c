//! Compiler configuration.
//!
//! Every path the pipeline touches is carried in an explicit
//! [`CompilerConfig`] handed to the compiler at construction. Nothing is
//! read from process-wide state, so two compilers with different
//! configurations can coexist in one process.
//!
//! A configuration can be built directly or loaded from a TOML file:
//!
//! ```toml
//! views_dir = "build/views"
//! core_templates_dir = "src/views"
//! themes_dir = "node_modules_themes"
//! theme = "midnight"
//! ```
//!
//! Exactly one of `theme` (resolve the full inheritance chain) or
//! `base_templates_dir` (use a single fixed root) must be set.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Where the active template layer comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRoot {
    /// Resolve the full inheritance chain starting at this theme name.
    Theme(String),
    /// Use a single fixed directory, skipping chain resolution.
    Base(PathBuf),
}

/// Configuration for one compilation pipeline.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Output directory for the flattened view tree. Destroyed and
    /// recreated on every run; never point this at user data.
    pub views_dir: PathBuf,

    /// Directory containing the core templates (the base layer every
    /// theme and plugin overrides).
    pub core_templates_dir: PathBuf,

    /// Directory containing installed themes, one subdirectory per theme.
    pub themes_dir: PathBuf,

    /// Active template root (theme chain or fixed base directory).
    pub template_root: TemplateRoot,
}

/// On-disk shape of a configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    views_dir: PathBuf,
    core_templates_dir: PathBuf,
    themes_dir: PathBuf,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    base_templates_dir: Option<PathBuf>,
}

impl TryFrom<RawConfig> for CompilerConfig {
    type Error = Error;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let template_root = match (raw.theme, raw.base_templates_dir) {
            (Some(theme), None) => TemplateRoot::Theme(theme),
            (None, Some(dir)) => TemplateRoot::Base(dir),
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "set either 'theme' or 'base_templates_dir', not both",
                ));
            }
            (None, None) => {
                return Err(Error::config(
                    "one of 'theme' or 'base_templates_dir' is required",
                ));
            }
        };

        Ok(Self {
            views_dir: raw.views_dir,
            core_templates_dir: raw.core_templates_dir,
            themes_dir: raw.themes_dir,
            template_root,
        })
    }
}

impl CompilerConfig {
    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation (see module docs).
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let raw: RawConfig = toml::from_str(&content)?;
        raw.try_into()
    }
}
