//! Named-entity recognition seam.
//!
//! The annotator never looks inside a model: it consumes typed spans from
//! three `EntityRecognizer`s (general, organizations, statute sections).
//! `pattern` recognizes spans offline with regexes; `remote` asks an HTTP
//! model server.

pub mod pattern;
pub mod remote;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::NerConfig;
use crate::error::{NerError, NerResult};

pub use pattern::PatternRecognizer;
pub use remote::RemoteRecognizer;

/// Entity label as emitted by the models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityLabel {
    /// A statute provision reference (`SECTION`).
    Section,
    /// A case citation (`CIT`).
    Citation,
    /// An organization name (`ORG`).
    Organization,
    Other(String),
}

impl EntityLabel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Section => "SECTION",
            Self::Citation => "CIT",
            Self::Organization => "ORG",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for EntityLabel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SECTION" => Self::Section,
            "CIT" => Self::Citation,
            "ORG" => Self::Organization,
            _ => Self::Other(s),
        }
    }
}

impl From<EntityLabel> for String {
    fn from(label: EntityLabel) -> Self {
        label.as_str().to_string()
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized span. Offsets are byte offsets into the analyzed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            label,
            start,
            end,
        }
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Anything that turns text into typed spans.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> NerResult<Vec<Entity>>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// The three recognizers the annotator consumes.
#[derive(Clone)]
pub struct RecognizerSet {
    /// Citations (`CIT`) come from here.
    pub general: Arc<dyn EntityRecognizer>,
    /// Organizations (`ORG`).
    pub organizations: Arc<dyn EntityRecognizer>,
    /// Statute references (`SECTION`).
    pub sections: Arc<dyn EntityRecognizer>,
}

impl RecognizerSet {
    /// Offline regex recognizers.
    pub fn pattern() -> Self {
        Self {
            general: Arc::new(PatternRecognizer::citations()),
            organizations: Arc::new(PatternRecognizer::organizations()),
            sections: Arc::new(PatternRecognizer::sections()),
        }
    }

    /// Build the set selected by the `[ner]` config section.
    pub fn from_config(config: &NerConfig) -> NerResult<Self> {
        match config.backend.as_str() {
            "pattern" => Ok(Self::pattern()),
            "remote" => {
                let remote = |url: &Option<String>, model: &str| -> NerResult<Arc<dyn EntityRecognizer>> {
                    let url = url.as_ref().ok_or_else(|| NerError::MissingUrl {
                        model: model.into(),
                    })?;
                    Ok(Arc::new(RemoteRecognizer::new(url, config.timeout_secs)))
                };
                Ok(Self {
                    general: remote(&config.general_url, "general")?,
                    organizations: remote(&config.org_url, "org")?,
                    sections: remote(&config.section_url, "section")?,
                })
            }
            other => Err(NerError::UnknownBackend {
                backend: other.into(),
            }),
        }
    }
}

impl std::fmt::Debug for RecognizerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerSet")
            .field("general", &self.general.name())
            .field("organizations", &self.organizations.name())
            .field("sections", &self.sections.name())
            .finish()
    }
}
