//! Error handling for the viewforge compilation library.
//!
//! This module defines the main error type `Error` used throughout the
//! library, along with a convenient `Result` type alias. It uses `thiserror`
//! for easy error handling and implements conversions from common error
//! types.
//!
//! Every variant here is fatal to a compilation run. An unresolved partial
//! reference is deliberately *not* an error: the inliner logs a warning and
//! strips the directive instead (see [`crate::inline`]).

use std::path::PathBuf;

use thiserror::Error;

/// Result type for template compilation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for template compilation operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Theme descriptor missing or malformed
    #[error("Theme descriptor for '{theme}' could not be loaded: {source}")]
    Descriptor {
        theme: String,
        #[source]
        source: Box<Error>,
    },

    /// Theme inheritance chain loops back on itself
    #[error("Theme inheritance chain contains a cycle at '{0}'")]
    ThemeCycle(String),

    /// Failure enumerating a template source root
    #[error("Failed to enumerate template root {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Pre-compile collaborator failure
    #[error("Pre-compile collaborator failed: {0}")]
    Hook(String),

    /// Partial expansion did not settle within the pass ceiling
    #[error("Partial expansion exceeded {max} passes in '{path}'")]
    InlineDepthExceeded { path: String, max: usize },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new collaborator error
    pub fn hook<S: Into<String>>(msg: S) -> Self {
        Self::Hook(msg.into())
    }

    /// Wrap an error raised while loading `theme`'s descriptor
    pub fn descriptor(theme: &str, source: Error) -> Self {
        Self::Descriptor {
            theme: theme.to_string(),
            source: Box::new(source),
        }
    }
}
