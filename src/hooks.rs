//! Pre-compile collaborator seams.
//!
//! Two pieces of a compilation run belong to external collaborators: a
//! notification fired before template resolution starts, and the
//! pre-resolved plugin template mapping. Both are traits so hosts can
//! plug in their own plugin machinery; the defaults do nothing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::namespace::{TemplatePath, walk_root};

/// Context handed to pre-compile hooks.
///
/// Carries nothing today; it exists so the extension point keeps its
/// shape when fields are added.
#[derive(Debug, Default)]
pub struct PrecompileContext {}

/// Extension point fired after the output tree has been reset and before
/// template resolution begins.
///
/// Fire-and-wait: compilation does not proceed until the hook returns,
/// and an error aborts the whole run.
#[async_trait]
pub trait PrecompileHook: Send + Sync {
    async fn before_compile(&self, ctx: &PrecompileContext) -> Result<()>;
}

/// Hook that does nothing.
#[derive(Debug, Default)]
pub struct NoopHook;

#[async_trait]
impl PrecompileHook for NoopHook {
    async fn before_compile(&self, _ctx: &PrecompileContext) -> Result<()> {
        Ok(())
    }
}

/// Supplies the pre-resolved plugin template mapping.
///
/// Entries are keyed by canonical [`TemplatePath`] and override core and
/// theme templates at the same path. Plugin discovery itself happens
/// elsewhere; by the time compilation runs, the mapping is already
/// resolved.
#[async_trait]
pub trait TemplateContributor: Send + Sync {
    async fn templates(&self) -> Result<BTreeMap<TemplatePath, PathBuf>>;
}

/// Contributor with no templates.
#[derive(Debug, Default)]
pub struct NoContributions;

#[async_trait]
impl TemplateContributor for NoContributions {
    async fn templates(&self) -> Result<BTreeMap<TemplatePath, PathBuf>> {
        Ok(BTreeMap::new())
    }
}

/// Contributor that maps every file under a set of directories, keyed by
/// its location relative to the directory it came from. Later directories
/// win on collision.
///
/// This is how the CLI feeds `--plugin-dir` arguments in as an
/// already-resolved mapping.
#[derive(Debug, Clone, Default)]
pub struct DirContributor {
    dirs: Vec<PathBuf>,
}

impl DirContributor {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

#[async_trait]
impl TemplateContributor for DirContributor {
    async fn templates(&self) -> Result<BTreeMap<TemplatePath, PathBuf>> {
        let mut out = BTreeMap::new();
        for dir in &self.dirs {
            out.extend(walk_root(dir)?);
        }
        Ok(out)
    }
}
