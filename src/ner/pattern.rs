//! Pattern-based recognizers for statute references, citations and
//! organizations.
//!
//! These stand in for the trained models when no model server is
//! configured. They only find spans with a recognizable surface form:
//! - `section 5 of the Companies Act, 2013`, `sections 3(1) and 4 of the ... Act`
//! - `Salomon v. Salomon`, `State of Punjab vs. Gurdev Singh`
//! - `Tata Motors LIMITED`, `Acme Pvt. Ltd.`

use std::sync::LazyLock;

use regex::Regex;

use super::{Entity, EntityLabel, EntityRecognizer};
use crate::error::NerResult;

static RE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bsections?\s+\d+[a-z]*(?:\s*\(\s*[0-9a-z]+\s*\))*(?:\s*(?:,|and|&|to)\s*\d+[a-z]*(?:\s*\(\s*[0-9a-z]+\s*\))*)*\s+of\s+(?:[\w.,'&()-]+\s+){0,12}?act\b(?:\s*,?\s*\d{4})?",
    )
    .unwrap()
});

static RE_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][\w.&'-]*(?:\s+(?:[A-Z][\w.&'-]*|of|and|&))*\s+(?:v|vs|V|Vs|VS)\.\s+[A-Z][\w.&'-]*(?:\s+(?:of|and|&)\s+[A-Z][\w.&'-]*|\s+[A-Z][\w.&'-]*)*",
    )
    .unwrap()
});

static RE_ORGANIZATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][\w.&'()-]*(?:\s+(?:[A-Z][\w.&'()-]*|&|and|of))*?\s+(?:LIMITED|LTD|Ltd)\b\.?",
    )
    .unwrap()
});

/// A regex recognizer emitting one label.
pub struct PatternRecognizer {
    name: &'static str,
    label: EntityLabel,
    pattern: &'static LazyLock<Regex>,
}

impl PatternRecognizer {
    /// Statute references (`SECTION`).
    pub fn sections() -> Self {
        Self {
            name: "pattern:sections",
            label: EntityLabel::Section,
            pattern: &RE_SECTION,
        }
    }

    /// Case citations (`CIT`).
    pub fn citations() -> Self {
        Self {
            name: "pattern:citations",
            label: EntityLabel::Citation,
            pattern: &RE_CITATION,
        }
    }

    /// Company names (`ORG`).
    pub fn organizations() -> Self {
        Self {
            name: "pattern:organizations",
            label: EntityLabel::Organization,
            pattern: &RE_ORGANIZATION,
        }
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn recognize(&self, text: &str) -> NerResult<Vec<Entity>> {
        let mut entities: Vec<Entity> = Vec::new();
        for m in self.pattern.find_iter(text) {
            // find_iter never overlaps itself; the check guards trimmed ends.
            let trimmed = m.as_str().trim_end_matches([',', ' ']);
            let end = m.start() + trimmed.len();
            if entities.iter().any(|e| e.overlaps(m.start(), end)) {
                continue;
            }
            entities.push(Entity::new(trimmed, self.label.clone(), m.start(), end));
        }
        tracing::debug!(
            recognizer = self.name,
            count = entities.len(),
            "pattern recognition done"
        );
        Ok(entities)
    }

    fn name(&self) -> &str {
        self.name
    }
}
