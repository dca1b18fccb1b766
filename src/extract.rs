//! Wrapper around the external PDF training-data tool.
//!
//! The tool is a Java one-jar run as an opaque subprocess:
//!
//! ```text
//! java -Xmx1G -jar <jar> -gH <home> -dIn <input> -dOut <output> -exe createTraining
//! ```
//!
//! For every PDF `<stem>.pdf` in the input directory it writes, per model,
//! `<stem>.training.<model>.tei.xml` and `<stem>.training.<model>`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult};

/// Trailing bytes of stderr kept in error reports.
const STDERR_TAIL: usize = 2048;

/// Models the tool produces training data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingModel {
    Segmentation,
    Fulltext,
    Header,
    Table,
    Figure,
}

impl TrainingModel {
    /// Models returned by `createTraining` requests.
    pub const CREATE_TRAINING: [TrainingModel; 4] = [
        Self::Segmentation,
        Self::Fulltext,
        Self::Header,
        Self::Table,
    ];

    /// Every model the trainer keeps a corpus for.
    pub const ALL: [TrainingModel; 5] = [
        Self::Fulltext,
        Self::Segmentation,
        Self::Header,
        Self::Table,
        Self::Figure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Segmentation => "segmentation",
            Self::Fulltext => "fulltext",
            Self::Header => "header",
            Self::Table => "table",
            Self::Figure => "figure",
        }
    }

    /// `<stem>.training.<model>.tei.xml`
    pub fn tei_file_name(self, stem: &str) -> String {
        format!("{stem}.training.{}.tei.xml", self.as_str())
    }

    /// `<stem>.training.<model>`
    pub fn raw_file_name(self, stem: &str) -> String {
        format!("{stem}.training.{}", self.as_str())
    }

    /// Suffix of TEI files for this model.
    pub fn tei_suffix(self) -> String {
        format!(".training.{}.tei.xml", self.as_str())
    }

    /// Suffix of raw feature files for this model.
    pub fn raw_suffix(self) -> String {
        format!(".training.{}", self.as_str())
    }
}

impl std::fmt::Display for TrainingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for TrainingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "segmentation" => Ok(Self::Segmentation),
            "fulltext" => Ok(Self::Fulltext),
            "header" => Ok(Self::Header),
            "table" => Ok(Self::Table),
            "figure" => Ok(Self::Figure),
            other => Err(format!("unknown training model: {other}")),
        }
    }
}

/// TEI and raw contents per model.
///
/// Serializes flat: `{"table_xml": "...", "table_raw": "...", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingOutputs {
    pub files: BTreeMap<TrainingModel, TrainingFiles>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingFiles {
    pub xml: String,
    pub raw: String,
}

impl TrainingOutputs {
    pub fn get(&self, model: TrainingModel) -> Option<&TrainingFiles> {
        self.files.get(&model)
    }

    /// Flattened `{model}_xml` / `{model}_raw` map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (model, files) in &self.files {
            map.insert(format!("{model}_xml"), files.xml.clone());
            map.insert(format!("{model}_raw"), files.raw.clone());
        }
        map
    }
}

impl Serialize for TrainingOutputs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Read the outputs for `stem` from `output_dir`. Missing files read as empty.
pub fn collect_outputs(
    output_dir: &Path,
    stem: &str,
    models: &[TrainingModel],
) -> ExtractResult<TrainingOutputs> {
    let mut outputs = TrainingOutputs::default();
    for &model in models {
        let files = TrainingFiles {
            xml: read_if_present(&output_dir.join(model.tei_file_name(stem)))?,
            raw: read_if_present(&output_dir.join(model.raw_file_name(stem)))?,
        };
        if files.xml.is_empty() && files.raw.is_empty() {
            tracing::debug!(%model, stem, "no training output");
        }
        outputs.files.insert(model, files);
    }
    Ok(outputs)
}

fn read_if_present(path: &Path) -> ExtractResult<String> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(ExtractError::Io { source: e }),
    }
}

/// Final path component of an uploaded file name, rejecting empty and dot names.
pub fn sanitize_file_name(name: &str) -> ExtractResult<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(ExtractError::InvalidFileName { name: name.into() });
    }
    Ok(base.to_string())
}

/// Output stem of an uploaded PDF: the file name without its `.pdf` suffix.
pub fn pdf_stem(file_name: &str) -> &str {
    let cut = file_name.len().saturating_sub(4);
    match file_name.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => &file_name[..cut],
        _ => file_name,
    }
}

/// Runs the extraction tool.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Arguments after the program name.
    pub fn create_training_args(&self, input_dir: &Path, output_dir: &Path) -> Vec<String> {
        vec![
            format!("-Xmx{}", self.config.heap),
            "-jar".into(),
            self.config.jar.display().to_string(),
            "-gH".into(),
            self.config.home.display().to_string(),
            "-dIn".into(),
            input_dir.display().to_string(),
            "-dOut".into(),
            output_dir.display().to_string(),
            "-exe".into(),
            "createTraining".into(),
        ]
    }

    /// Run `createTraining` over every PDF in `input_dir`.
    pub fn create_training(&self, input_dir: &Path, output_dir: &Path) -> ExtractResult<()> {
        let args = self.create_training_args(input_dir, output_dir);
        tracing::info!(
            program = %self.config.java,
            input = %input_dir.display(),
            output = %output_dir.display(),
            "running extraction tool"
        );

        // Spawn directly (no shell).
        let mut child = Command::new(&self.config.java)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExtractError::Spawn {
                program: self.config.java.clone(),
                source: e,
            })?;

        // Drain stderr on a thread so a chatty JVM cannot fill the pipe and stall.
        let stderr_reader = child.stderr.take().map(|mut s| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = s.read_to_end(&mut buf);
                buf
            })
        });

        let started = Instant::now();
        let deadline = started + Duration::from_secs(self.config.timeout_secs);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        tracing::warn!(
                            timeout_secs = self.config.timeout_secs,
                            "extraction tool timed out"
                        );
                        return Err(ExtractError::Timeout {
                            timeout_secs: self.config.timeout_secs,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(ExtractError::Io { source: e }),
            }
        };

        let stderr = stderr_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(ExtractError::Failed {
                code: status.code().unwrap_or(-1),
                stderr: tail(&String::from_utf8_lossy(&stderr), STDERR_TAIL),
            });
        }

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extraction tool finished"
        );
        Ok(())
    }

    /// Run the tool on a single uploaded PDF inside a throwaway directory
    /// under `scratch_parent` and collect the requested models' outputs.
    pub fn process_pdf(
        &self,
        scratch_parent: &Path,
        file_name: &str,
        pdf: &[u8],
        models: &[TrainingModel],
    ) -> ExtractResult<TrainingOutputs> {
        let file_name = sanitize_file_name(file_name)?;
        let stem = pdf_stem(&file_name).to_string();

        std::fs::create_dir_all(scratch_parent).map_err(|e| ExtractError::Io { source: e })?;
        // Removed on drop, including on the error paths below.
        let workdir = tempfile::Builder::new()
            .prefix("extract-")
            .tempdir_in(scratch_parent)
            .map_err(|e| ExtractError::Io { source: e })?;

        let (input_dir, output_dir) = work_dirs(workdir.path());
        for dir in [&input_dir, &output_dir] {
            std::fs::create_dir_all(dir).map_err(|e| ExtractError::Io { source: e })?;
        }
        std::fs::write(input_dir.join(&file_name), pdf)
            .map_err(|e| ExtractError::Io { source: e })?;

        self.create_training(&input_dir, &output_dir)?;
        collect_outputs(&output_dir, &stem, models)
    }
}

fn work_dirs(root: &Path) -> (PathBuf, PathBuf) {
    (root.join("in"), root.join("out"))
}

fn tail(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.trim().to_string();
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].trim().to_string()
}
