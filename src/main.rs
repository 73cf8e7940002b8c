//! viewforge CLI entrypoint
//! Parses command-line arguments and dispatches to the template compiler.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use std::path::PathBuf;
use std::sync::Arc;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use viewforge::hooks::DirContributor;
use viewforge::{Compiler, CompilerConfig, TemplateRoot};

#[derive(Parser)]
#[command(name = "viewforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compile core, theme, and plugin templates into the views directory
    Compile {
        /// Path to a viewforge.toml configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory for compiled views (destroyed every run)
        #[arg(long)]
        views_dir: Option<PathBuf>,
        /// Directory containing the core templates
        #[arg(long)]
        core_templates_dir: Option<PathBuf>,
        /// Directory containing installed themes
        #[arg(long)]
        themes_dir: Option<PathBuf>,
        /// Active theme whose inheritance chain is resolved
        #[arg(long, conflicts_with = "base_templates_dir")]
        theme: Option<String>,
        /// Fixed template root, used instead of a theme chain
        #[arg(long)]
        base_templates_dir: Option<PathBuf>,
        /// Plugin template directory; may be given multiple times,
        /// later directories win on collision
        #[arg(long = "plugin-dir")]
        plugin_dirs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with default level INFO
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            config,
            views_dir,
            core_templates_dir,
            themes_dir,
            theme,
            base_templates_dir,
            plugin_dirs,
        } => {
            let config = resolve_config(
                config,
                views_dir,
                core_templates_dir,
                themes_dir,
                theme,
                base_templates_dir,
            )
            .await?;
            run_compile(config, plugin_dirs).await?;
        }
    }
    Ok(())
}

/// Build the compiler configuration from a config file or from flags.
///
/// Flags override values loaded from the file; without a file, the
/// directory flags are required.
async fn resolve_config(
    config_file: Option<PathBuf>,
    views_dir: Option<PathBuf>,
    core_templates_dir: Option<PathBuf>,
    themes_dir: Option<PathBuf>,
    theme: Option<String>,
    base_templates_dir: Option<PathBuf>,
) -> anyhow::Result<CompilerConfig> {
    let loaded = match config_file {
        Some(path) => Some(
            CompilerConfig::from_file(&path)
                .await
                .with_context(|| format!("failed to load configuration {}", path.display()))?,
        ),
        None => None,
    };

    let template_root = match (theme, base_templates_dir) {
        (Some(name), None) => Some(TemplateRoot::Theme(name)),
        (None, Some(dir)) => Some(TemplateRoot::Base(dir)),
        // clap rejects both flags being present
        _ => None,
    };

    let (file_views, file_core, file_themes, file_root) = match loaded {
        Some(c) => (
            Some(c.views_dir),
            Some(c.core_templates_dir),
            Some(c.themes_dir),
            Some(c.template_root),
        ),
        None => (None, None, None, None),
    };

    let require = |flag: &str, value: Option<PathBuf>| {
        value.ok_or_else(|| anyhow::anyhow!("--{flag} is required without --config"))
    };

    Ok(CompilerConfig {
        views_dir: require("views-dir", views_dir.or(file_views))?,
        core_templates_dir: require("core-templates-dir", core_templates_dir.or(file_core))?,
        themes_dir: require("themes-dir", themes_dir.or(file_themes))?,
        template_root: template_root
            .or(file_root)
            .ok_or_else(|| anyhow::anyhow!("--theme or --base-templates-dir is required"))?,
    })
}

/// Run one compilation pass and report the outcome.
async fn run_compile(config: CompilerConfig, plugin_dirs: Vec<PathBuf>) -> anyhow::Result<()> {
    let views_dir = config.views_dir.clone();
    let mut compiler = Compiler::new(config);
    if !plugin_dirs.is_empty() {
        compiler = compiler.with_contributor(Arc::new(DirContributor::new(plugin_dirs)));
    }

    compiler
        .compile()
        .await
        .context("template compilation failed")?;

    info!(views = %views_dir.display(), "views compiled");
    Ok(())
}
