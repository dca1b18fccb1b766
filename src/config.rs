//! Service configuration, persisted as TOML.
//!
//! Every field carries a serde default, so an empty or partial file is valid.
//! `LEXLINK_BIND` and `LEXLINK_PORT` override the `[server]` section.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::LexPaths;

/// Errors from loading configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(lexlink::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(lexlink::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("invalid value for {variable}: \"{value}\"")]
    #[diagnostic(
        code(lexlink::config::env),
        help("LEXLINK_PORT must be a port number between 1 and 65535.")
    )]
    InvalidEnv { variable: String, value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub annotate: AnnotateConfig,
    #[serde(default)]
    pub ner: NerConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
}

/// `[server]`: listener address of `lexlinkd`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// `[extractor]`: how to invoke the external PDF training-data tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Java launcher.
    #[serde(default = "default_java")]
    pub java: String,
    /// Path to the one-jar build of the extraction tool.
    #[serde(default = "default_jar")]
    pub jar: PathBuf,
    /// The tool's home directory (models, lexicons).
    #[serde(default = "default_home")]
    pub home: PathBuf,
    /// JVM max heap, passed as `-Xmx{heap}`.
    #[serde(default = "default_heap")]
    pub heap: String,
    #[serde(default = "default_extract_timeout")]
    pub timeout_secs: u64,
}

fn default_java() -> String {
    "java".into()
}
fn default_jar() -> PathBuf {
    PathBuf::from("grobid-core/build/libs/grobid-core-0.7.1-onejar.jar")
}
fn default_home() -> PathBuf {
    PathBuf::from("grobid-home")
}
fn default_heap() -> String {
    "1G".into()
}
fn default_extract_timeout() -> u64 {
    600
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            jar: default_jar(),
            home: default_home(),
            heap: default_heap(),
            timeout_secs: default_extract_timeout(),
        }
    }
}

/// `[annotate]`: statute link rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateConfig {
    /// Prefix of every statute hyperlink; the act slug is appended.
    #[serde(default = "default_link_base")]
    pub link_base: String,
    /// Optional JSON object of extra act names → slugs.
    #[serde(default)]
    pub act_table: Option<PathBuf>,
}

fn default_link_base() -> String {
    "https://www.quickcompany.in/acts/".into()
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            link_base: default_link_base(),
            act_table: None,
        }
    }
}

/// `[ner]`: which recognizers feed the annotator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerConfig {
    /// `pattern` (offline regex recognizers) or `remote` (model server).
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Model server endpoint for the general model (citations).
    #[serde(default)]
    pub general_url: Option<String>,
    /// Model server endpoint for the organization model.
    #[serde(default)]
    pub org_url: Option<String>,
    /// Model server endpoint for the statute-section model.
    #[serde(default)]
    pub section_url: Option<String>,
    #[serde(default = "default_ner_timeout")]
    pub timeout_secs: u64,
}

fn default_backend() -> String {
    "pattern".into()
}
fn default_ner_timeout() -> u64 {
    30
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            general_url: None,
            org_url: None,
            section_url: None,
            timeout_secs: default_ner_timeout(),
        }
    }
}

/// `[corpus]`: trainer dataset layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Root of the trainer's per-model datasets (`{root}/{model}/corpus`).
    #[serde(default = "default_dataset_root")]
    pub dataset_root: PathBuf,
    /// Where downloaded archives are unpacked before installation.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Archive download timeout.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_dataset_root() -> PathBuf {
    PathBuf::from("grobid-trainer/resources/dataset")
}
fn default_staging_dir() -> PathBuf {
    PathBuf::from("trainingData")
}
fn default_download_timeout() -> u64 {
    300
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dataset_root: default_dataset_root(),
            staging_dir: default_staging_dir(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl LexConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load the XDG config file when present, defaults otherwise, then apply
    /// environment overrides.
    pub fn load_or_default(paths: &LexPaths) -> ConfigResult<Self> {
        let file = paths.config_file();
        let mut config = if file.is_file() {
            tracing::debug!(path = %file.display(), "loading config");
            Self::load(&file)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `LEXLINK_BIND` / `LEXLINK_PORT`.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        if let Ok(bind) = std::env::var("LEXLINK_BIND") {
            self.server.bind = bind;
        }
        if let Ok(port) = std::env::var("LEXLINK_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                variable: "LEXLINK_PORT".into(),
                value: port.clone(),
            })?;
        }
        Ok(())
    }
}
