//! Compilation orchestration.
//!
//! [`Compiler`] drives one full pass from configuration to a populated
//! view tree:
//!
//! 1. Resolve the theme chain (or use the configured fixed base root).
//! 2. Destroy and recreate the views directory, so the output only ever
//!    reflects one complete pass, never a mix of runs.
//! 3. Fire the pre-compile extension point, then fetch the plugin
//!    template mapping. Both are fire-and-wait; either failing aborts.
//! 4. Build the override namespace (core → theme chain → plugins).
//! 5. Fan out over every namespace entry with bounded concurrency:
//!    read the winning source, inline its partials, ensure the
//!    destination subdirectory, write the compiled bytes.
//!
//! Per-path tasks have no ordering between each other; within one path
//! read strictly precedes inlining, which precedes the write. A per-path
//! failure makes the run fail with the first error encountered, but
//! in-flight work on other paths is drained rather than cancelled.

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CompilerConfig, TemplateRoot};
use crate::error::Result;
use crate::hooks::{
    NoContributions, NoopHook, PrecompileContext, PrecompileHook, TemplateContributor,
};
use crate::inline::inline_partials;
use crate::namespace::{Namespace, NamespaceBuilder, Origin, SourceRoot, TemplatePath};
use crate::theme::{DescriptorSource, JsonDescriptorSource, resolve_chain};

// External imports (alphabetized)
use futures::stream::{self, StreamExt};
use tracing::{debug, error};

/// Number of per-template tasks in flight at once.
const COMPILE_FAN_OUT: usize = 64;

/// Orchestrates template compilation passes.
pub struct Compiler {
    config: CompilerConfig,
    descriptors: Arc<dyn DescriptorSource>,
    hook: Arc<dyn PrecompileHook>,
    contributor: Arc<dyn TemplateContributor>,
}

impl Compiler {
    /// Compiler with the default collaborators: JSON descriptors under
    /// the configured themes directory, no pre-compile hook, no plugin
    /// templates.
    pub fn new(config: CompilerConfig) -> Self {
        let descriptors = Arc::new(JsonDescriptorSource::new(&config.themes_dir));
        Self {
            config,
            descriptors,
            hook: Arc::new(NoopHook),
            contributor: Arc::new(NoContributions),
        }
    }

    /// Replace the theme descriptor source.
    pub fn with_descriptor_source(mut self, descriptors: Arc<dyn DescriptorSource>) -> Self {
        self.descriptors = descriptors;
        self
    }

    /// Replace the pre-compile extension point.
    pub fn with_precompile_hook(mut self, hook: Arc<dyn PrecompileHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Replace the plugin template supplier.
    pub fn with_contributor(mut self, contributor: Arc<dyn TemplateContributor>) -> Self {
        self.contributor = contributor;
        self
    }

    /// Run one full compilation pass.
    ///
    /// On failure the views directory must be treated as not trustworthy:
    /// it has already been reset, and an unknown subset of templates may
    /// have been written.
    pub async fn compile(&self) -> Result<()> {
        debug!(views = %self.config.views_dir.display(), "compiling templates");
        match self.run().await {
            Ok(()) => {
                debug!("successfully compiled templates");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "template compilation failed");
                Err(e)
            }
        }
    }

    async fn run(&self) -> Result<()> {
        let theme_roots = self.template_roots().await?;

        // Barrier: reset and collaborator responses strictly precede any
        // per-template work.
        self.reset_views_dir().await?;
        self.hook.before_compile(&PrecompileContext::default()).await?;
        let plugin_templates = self.contributor.templates().await?;

        let namespace = Arc::new(self.build_namespace(&theme_roots, plugin_templates)?);
        debug!(templates = namespace.len(), "resolved template namespace");

        let entries: Vec<(TemplatePath, PathBuf)> = namespace
            .iter()
            .map(|(path, file)| (path.clone(), file.clone()))
            .collect();

        let mut results = stream::iter(entries)
            .map(|(path, file)| {
                let namespace = Arc::clone(&namespace);
                let views_dir = self.config.views_dir.clone();
                async move { compile_one(namespace, views_dir, path, file).await }
            })
            .buffer_unordered(COMPILE_FAN_OUT);

        // First error wins; the rest of the in-flight work is drained,
        // not cancelled.
        let mut first_err = None;
        while let Some(result) = results.next().await {
            if let Err(e) = result {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn template_roots(&self) -> Result<Vec<PathBuf>> {
        match &self.config.template_root {
            TemplateRoot::Theme(name) => {
                resolve_chain(self.descriptors.as_ref(), &self.config.themes_dir, name).await
            }
            TemplateRoot::Base(dir) => Ok(vec![dir.clone()]),
        }
    }

    /// Destroy any previous output tree and recreate it empty.
    async fn reset_views_dir(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.config.views_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(&self.config.views_dir).await?;
        Ok(())
    }

    fn build_namespace(
        &self,
        theme_roots: &[PathBuf],
        plugin_templates: BTreeMap<TemplatePath, PathBuf>,
    ) -> Result<Namespace> {
        let mut builder = NamespaceBuilder::new();
        builder.layer_root(&SourceRoot::new(
            self.config.core_templates_dir.clone(),
            Origin::Core,
        ))?;
        for root in theme_roots {
            builder.layer_root(&SourceRoot::new(root.clone(), Origin::Theme))?;
        }
        builder.layer_entries(plugin_templates);
        Ok(builder.build())
    }
}

/// Read one template, inline its partials, and write it into the output
/// tree at its canonical path.
async fn compile_one(
    namespace: Arc<Namespace>,
    views_dir: PathBuf,
    path: TemplatePath,
    file: PathBuf,
) -> Result<()> {
    let source = tokio::fs::read_to_string(&file).await?;
    let compiled = inline_partials(namespace.as_ref(), &path, source).await?;

    let dest = views_dir.join(path.as_relative());
    if let Some(parent) = dest.parent() {
        // Safe under concurrent creation of overlapping parents.
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&dest, compiled).await?;
    Ok(())
}
