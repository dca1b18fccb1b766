//! Feature-file consistency.
//!
//! A raw training file has one token per line followed by its features,
//! separated by spaces (or tabs when a line has no space). Every non-blank
//! line of a file should carry the same number of fields.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{CorpusError, CorpusResult};

/// A line whose field count differs from the expected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deviation {
    /// 1-based line number.
    pub line: usize,
    pub fields: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureReport {
    pub file: String,
    /// Field count → number of lines with that count.
    pub histogram: BTreeMap<usize, usize>,
    /// Most frequent field count; ties go to the larger count. Zero for an
    /// empty file.
    pub expected: usize,
    pub deviations: Vec<Deviation>,
}

impl FeatureReport {
    pub fn is_consistent(&self) -> bool {
        self.deviations.is_empty()
    }

    /// Build a report from file contents.
    pub fn from_content(file: &str, content: &str) -> Self {
        let counted: Vec<(usize, usize, &str)> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| (i + 1, field_count(line), line))
            .collect();

        let mut histogram = BTreeMap::new();
        for (_, fields, _) in &counted {
            *histogram.entry(*fields).or_insert(0usize) += 1;
        }

        // max_by_key keeps the last maximum, and keys ascend.
        let expected = histogram
            .iter()
            .max_by_key(|(_, lines)| **lines)
            .map(|(fields, _)| *fields)
            .unwrap_or(0);

        let deviations = counted
            .into_iter()
            .filter(|(_, fields, _)| *fields != expected)
            .map(|(line, fields, text)| Deviation {
                line,
                fields,
                text: text.to_string(),
            })
            .collect();

        Self {
            file: file.to_string(),
            histogram,
            expected,
            deviations,
        }
    }
}

fn field_count(line: &str) -> usize {
    if line.contains(' ') {
        line.split(' ').count()
    } else {
        line.split('\t').count()
    }
}

/// Check one feature file.
pub fn check_features(path: &Path) -> CorpusResult<FeatureReport> {
    let bytes = std::fs::read(path).map_err(|e| CorpusError::io(path, e))?;
    let report = FeatureReport::from_content(
        &path.display().to_string(),
        &String::from_utf8_lossy(&bytes),
    );
    if !report.is_consistent() {
        tracing::warn!(
            file = %path.display(),
            expected = report.expected,
            deviations = report.deviations.len(),
            "inconsistent feature counts"
        );
    }
    Ok(report)
}

/// Check every file in `dir`, in name order.
pub fn check_feature_dir(dir: &Path) -> CorpusResult<Vec<FeatureReport>> {
    super::file_names(dir)?
        .iter()
        .map(|name| check_features(&dir.join(name)))
        .collect()
}
