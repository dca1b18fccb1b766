//! Training archive download and installation.
//!
//! An archive is a zip laid out as `<model>/corpus/...`. Installing it
//! replaces each model's `{dataset_root}/<model>/corpus/` contents with the
//! archive's.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::config::CorpusConfig;
use crate::error::{CorpusError, CorpusResult};
use crate::extract::TrainingModel;

/// What installation did for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelInstall {
    /// Entries cleared from the existing corpus.
    pub removed: usize,
    /// Entries moved in from the archive.
    pub installed: usize,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub models: BTreeMap<TrainingModel, ModelInstall>,
}

impl InstallReport {
    pub fn installed(&self) -> usize {
        self.models.values().map(|m| m.installed).sum()
    }
}

/// Downloads and installs training archives.
pub struct TrainingArchive {
    agent: ureq::Agent,
}

impl TrainingArchive {
    pub fn new(timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self { agent }
    }

    /// Stream `url` into `dest`. Returns the number of bytes written.
    pub fn download(&self, url: &str, dest: &Path) -> CorpusResult<u64> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(CorpusError::Download {
                    url: url.into(),
                    message: format!("HTTP {status}"),
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(CorpusError::Download {
                    url: url.into(),
                    message: transport.to_string(),
                });
            }
        };

        let mut file = fs::File::create(dest).map_err(|e| CorpusError::io(dest, e))?;
        let mut reader = response.into_reader();
        let bytes = std::io::copy(&mut reader, &mut file).map_err(|e| CorpusError::Download {
            url: url.into(),
            message: e.to_string(),
        })?;
        tracing::info!(url, bytes, "downloaded training archive");
        Ok(bytes)
    }

    /// Unpack `zip_path` into `staging`. Entries whose names would escape
    /// `staging` are skipped. Returns the number of files written.
    pub fn extract(zip_path: &Path, staging: &Path) -> CorpusResult<usize> {
        let archive_err = |message: String| CorpusError::Archive {
            path: zip_path.display().to_string(),
            message,
        };

        let file = fs::File::open(zip_path).map_err(|e| CorpusError::io(zip_path, e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;
        fs::create_dir_all(staging).map_err(|e| CorpusError::io(staging, e))?;

        let mut written = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| archive_err(e.to_string()))?;
            let Some(relative) = entry.enclosed_name() else {
                tracing::warn!(name = entry.name(), "skipping archive entry outside staging");
                continue;
            };
            let outpath = staging.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&outpath).map_err(|e| CorpusError::io(&outpath, e))?;
                continue;
            }
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(|e| CorpusError::io(parent, e))?;
            }
            let mut out = fs::File::create(&outpath).map_err(|e| CorpusError::io(&outpath, e))?;
            std::io::copy(&mut entry, &mut out).map_err(|e| CorpusError::io(&outpath, e))?;
            written += 1;
        }

        tracing::info!(archive = %zip_path.display(), files = written, "unpacked training archive");
        Ok(written)
    }

    /// Replace each model's corpus with the staged one, then delete `staging`.
    pub fn install(
        staging: &Path,
        dataset_root: &Path,
        models: &[TrainingModel],
    ) -> CorpusResult<InstallReport> {
        let mut report = InstallReport::default();

        for &model in models {
            let mut result = ModelInstall::default();
            let corpus = dataset_root.join(model.as_str()).join("corpus");

            if corpus.is_dir() {
                result.removed = clear_dir(&corpus)?;
            } else {
                result.notes.push("no existing data".into());
                fs::create_dir_all(&corpus).map_err(|e| CorpusError::io(&corpus, e))?;
            }

            let staged = staging.join(model.as_str()).join("corpus");
            if staged.is_dir() {
                for entry in fs::read_dir(&staged).map_err(|e| CorpusError::io(&staged, e))? {
                    let entry = entry.map_err(|e| CorpusError::io(&staged, e))?;
                    move_entry(&entry.path(), &corpus.join(entry.file_name()))?;
                    result.installed += 1;
                }
            } else {
                result.notes.push("not present in archive".into());
            }

            tracing::info!(
                %model,
                removed = result.removed,
                installed = result.installed,
                "installed training corpus"
            );
            report.models.insert(model, result);
        }

        remove_staging(staging)?;
        Ok(report)
    }

    /// Download `url` to a temporary file, unpack it into the configured
    /// staging directory and install it.
    pub fn install_from_url(
        &self,
        url: &str,
        corpus: &CorpusConfig,
        models: &[TrainingModel],
    ) -> CorpusResult<InstallReport> {
        let download = tempfile::Builder::new()
            .prefix("training-")
            .suffix(".zip")
            .tempfile()
            .map_err(|e| CorpusError::io(&std::env::temp_dir(), e))?;
        self.download(url, download.path())?;
        Self::install_from_zip(download.path(), corpus, models)
    }

    /// Unpack a local archive into the staging directory and install it.
    ///
    /// Staging starts empty and is removed again if either step fails, so a
    /// partial unpack never reaches the dataset.
    pub fn install_from_zip(
        zip_path: &Path,
        corpus: &CorpusConfig,
        models: &[TrainingModel],
    ) -> CorpusResult<InstallReport> {
        let staging = &corpus.staging_dir;
        remove_staging(staging)?;

        let result = Self::extract(zip_path, staging)
            .and_then(|_| Self::install(staging, &corpus.dataset_root, models));
        if result.is_err() {
            if let Err(e) = remove_staging(staging) {
                tracing::warn!(staging = %staging.display(), "failed to clear staging: {e}");
            }
        }
        result
    }
}

fn remove_staging(staging: &Path) -> CorpusResult<()> {
    if staging.exists() {
        fs::remove_dir_all(staging).map_err(|e| CorpusError::io(staging, e))?;
    }
    Ok(())
}

/// Remove every entry under `dir`, keeping `dir` itself.
fn clear_dir(dir: &Path) -> CorpusResult<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(|e| CorpusError::io(dir, e))? {
        let path = entry.map_err(|e| CorpusError::io(dir, e))?.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| CorpusError::io(&path, e))?;
        removed += 1;
    }
    Ok(removed)
}

/// Rename, falling back to copy-and-delete across filesystems.
fn move_entry(from: &Path, to: &Path) -> CorpusResult<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    copy_recursive(from, to)?;
    let result = if from.is_dir() {
        fs::remove_dir_all(from)
    } else {
        fs::remove_file(from)
    };
    result.map_err(|e| CorpusError::io(from, e))
}

fn copy_recursive(from: &Path, to: &Path) -> CorpusResult<()> {
    if from.is_dir() {
        fs::create_dir_all(to).map_err(|e| CorpusError::io(to, e))?;
        for entry in fs::read_dir(from).map_err(|e| CorpusError::io(from, e))? {
            let entry = entry.map_err(|e| CorpusError::io(from, e))?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(from, to).map(|_| ()).map_err(|e| CorpusError::io(to, e))
    }
}
