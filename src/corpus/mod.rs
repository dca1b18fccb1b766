//! Training corpus bookkeeping.
//!
//! - [`sort_outputs`]: file extraction outputs into `{model}/{tei,raw}`
//! - [`features`]: feature-file column consistency
//! - [`unpaired_files`]: raw/TEI files missing their counterpart
//! - [`archive`]: download, unpack and install a training archive

pub mod archive;
pub mod features;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::error::{CorpusError, CorpusResult};
use crate::extract::TrainingModel;

pub use archive::{InstallReport, TrainingArchive};
pub use features::{FeatureReport, check_feature_dir, check_features};

/// Files copied per model by [`sort_outputs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SortCounts {
    pub tei: usize,
    pub raw: usize,
}

/// Copy tool outputs from `input_dir` into `{output_root}/{model}/{tei,raw}`.
///
/// Directories are created for every requested model, even when no file
/// matches it.
pub fn sort_outputs(
    input_dir: &Path,
    output_root: &Path,
    models: &[TrainingModel],
) -> CorpusResult<BTreeMap<TrainingModel, SortCounts>> {
    let mut counts = BTreeMap::new();
    for &model in models {
        for sub in ["tei", "raw"] {
            let dir = output_root.join(model.as_str()).join(sub);
            std::fs::create_dir_all(&dir).map_err(|e| CorpusError::io(&dir, e))?;
        }
        counts.insert(model, SortCounts::default());
    }

    for name in file_names(input_dir)? {
        for &model in models {
            let sub = if name.ends_with(&model.tei_suffix()) {
                "tei"
            } else if name.ends_with(&model.raw_suffix()) {
                "raw"
            } else {
                continue;
            };
            let dest = output_root.join(model.as_str()).join(sub).join(&name);
            std::fs::copy(input_dir.join(&name), &dest).map_err(|e| CorpusError::io(&dest, e))?;
            if let Some(c) = counts.get_mut(&model) {
                match sub {
                    "tei" => c.tei += 1,
                    _ => c.raw += 1,
                }
            }
        }
    }

    tracing::info!(input = %input_dir.display(), output = %output_root.display(), "sorted training outputs");
    Ok(counts)
}

/// Stems present on only one side of a raw/TEI directory pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Unpaired {
    /// TEI files with no raw counterpart.
    pub tei_only: Vec<String>,
    /// Raw files with no TEI counterpart.
    pub raw_only: Vec<String>,
}

impl Unpaired {
    pub fn is_empty(&self) -> bool {
        self.tei_only.is_empty() && self.raw_only.is_empty()
    }
}

/// Compare document stems in `raw_dir` and `tei_dir` for `model`.
pub fn unpaired_files(raw_dir: &Path, tei_dir: &Path, model: TrainingModel) -> CorpusResult<Unpaired> {
    let raw = stems(raw_dir, &model.raw_suffix())?;
    let tei = stems(tei_dir, &model.tei_suffix())?;
    Ok(Unpaired {
        tei_only: tei.difference(&raw).cloned().collect(),
        raw_only: raw.difference(&tei).cloned().collect(),
    })
}

fn stems(dir: &Path, suffix: &str) -> CorpusResult<BTreeSet<String>> {
    Ok(file_names(dir)?
        .into_iter()
        .map(|name| match name.find(suffix) {
            Some(pos) => name[..pos].to_string(),
            None => name,
        })
        .collect())
}

/// Plain file names in `dir`, sorted.
pub(crate) fn file_names(dir: &Path) -> CorpusResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CorpusError::io(dir, e))? {
        let entry = entry.map_err(|e| CorpusError::io(dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| CorpusError::io(&entry.path(), e))?
            .is_file();
        if is_file {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), name).unwrap();
    }

    #[test]
    fn sort_routes_tei_and_raw() {
        let input = tempfile::TempDir::new().unwrap();
        let output = tempfile::TempDir::new().unwrap();
        touch(input.path(), "a.training.table.tei.xml");
        touch(input.path(), "a.training.table");
        touch(input.path(), "a.training.header");
        touch(input.path(), "b.training.fulltext.tei.xml");
        touch(input.path(), "notes.txt");

        let counts = sort_outputs(
            input.path(),
            output.path(),
            &[TrainingModel::Table, TrainingModel::Header, TrainingModel::Fulltext],
        )
        .unwrap();

        assert_eq!(counts[&TrainingModel::Table], SortCounts { tei: 1, raw: 1 });
        assert_eq!(counts[&TrainingModel::Header], SortCounts { tei: 0, raw: 1 });
        assert_eq!(counts[&TrainingModel::Fulltext], SortCounts { tei: 1, raw: 0 });
        assert!(output.path().join("table/tei/a.training.table.tei.xml").is_file());
        assert!(output.path().join("table/raw/a.training.table").is_file());
        assert!(output.path().join("header/tei").is_dir());
        assert!(!output.path().join("table/raw/notes.txt").exists());
    }

    #[test]
    fn unpaired_reports_both_sides() {
        let raw = tempfile::TempDir::new().unwrap();
        let tei = tempfile::TempDir::new().unwrap();
        touch(raw.path(), "one.training.header");
        touch(raw.path(), "two.training.header");
        touch(tei.path(), "two.training.header.tei.xml");
        touch(tei.path(), "three.training.header.tei.xml");

        let report = unpaired_files(raw.path(), tei.path(), TrainingModel::Header).unwrap();
        assert_eq!(report.tei_only, vec!["three"]);
        assert_eq!(report.raw_only, vec!["one"]);
        assert!(!report.is_empty());
    }

    #[test]
    fn unpaired_missing_dir_is_io_error() {
        let tei = tempfile::TempDir::new().unwrap();
        let err = unpaired_files(Path::new("/nonexistent/raw"), tei.path(), TrainingModel::Table)
            .unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
