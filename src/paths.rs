//! XDG-compliant path resolution for lexlink.
//!
//! `LexPaths` holds the global config, state and cache directories. Per-request
//! working directories for the extraction tool live under the cache directory.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(lexlink::paths::no_home),
        help("Set the HOME environment variable or ensure a valid user profile exists.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(lexlink::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Global XDG-compliant directories for lexlink.
#[derive(Debug, Clone)]
pub struct LexPaths {
    /// `$XDG_CONFIG_HOME/lexlink/`
    pub config_dir: PathBuf,
    /// `$XDG_STATE_HOME/lexlink/`
    pub state_dir: PathBuf,
    /// `$XDG_CACHE_HOME/lexlink/`
    pub cache_dir: PathBuf,
}

impl LexPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| PathError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join("lexlink");

        let state_dir = std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/state"))
            .join("lexlink");

        let cache_dir = std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".cache"))
            .join("lexlink");

        Ok(Self {
            config_dir,
            state_dir,
            cache_dir,
        })
    }

    /// Root all three directories under a single base.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.join("config"),
            state_dir: base.join("state"),
            cache_dir: base.join("cache"),
        }
    }

    /// Create all base directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [
            &self.config_dir,
            &self.state_dir,
            &self.cache_dir,
            &self.scratch_dir(),
        ] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Path to the global config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Parent directory of per-request extraction workspaces.
    pub fn scratch_dir(&self) -> PathBuf {
        self.cache_dir.join("scratch")
    }
}
