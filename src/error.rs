//! Rich diagnostic error types for lexlink.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so operators know what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::paths::PathError;

/// Top-level error type for lexlink.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum LexError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ner(#[from] NerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

// ---------------------------------------------------------------------------
// NER errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum NerError {
    #[error("model server request to {url} failed: {message}")]
    #[diagnostic(
        code(lexlink::ner::transport),
        help(
            "The model server could not be reached. Check that it is running \
             and that the URL in the [ner] section of the config is correct."
        )
    )]
    Transport { url: String, message: String },

    #[error("model server at {url} answered with status {status}")]
    #[diagnostic(
        code(lexlink::ner::status),
        help("The model server rejected the request. Check its logs for details.")
    )]
    Status { url: String, status: u16 },

    #[error("malformed response from model server at {url}: {message}")]
    #[diagnostic(
        code(lexlink::ner::malformed),
        help(
            "The model server must answer with JSON of the form \
             {{\"ents\": [{{\"text\", \"label\", \"start\", \"end\"}}]}}."
        )
    )]
    Malformed { url: String, message: String },

    #[error("remote NER backend selected but no URL configured for the {model} model")]
    #[diagnostic(
        code(lexlink::ner::missing_url),
        help("Set `{model}_url` in the [ner] section, or use `backend = \"pattern\"`.")
    )]
    MissingUrl { model: String },

    #[error("unknown NER backend: \"{backend}\"")]
    #[diagnostic(
        code(lexlink::ner::unknown_backend),
        help("Valid backends are \"pattern\" and \"remote\".")
    )]
    UnknownBackend { backend: String },
}

// ---------------------------------------------------------------------------
// Act dictionary errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DictionaryError {
    #[error("failed to read act table: {path}")]
    #[diagnostic(
        code(lexlink::acts::read),
        help("Ensure the file named by `act_table` in the [annotate] section exists.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse act table {path}: {message}")]
    #[diagnostic(
        code(lexlink::acts::parse),
        help("The act table must be a JSON object mapping act names to link slugs.")
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Extraction tool errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("failed to spawn extraction tool `{program}`: {source}")]
    #[diagnostic(
        code(lexlink::extract::spawn),
        help(
            "Check that a Java runtime is installed and that `java` in the \
             [extractor] section points at it."
        )
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction tool timed out after {timeout_secs}s")]
    #[diagnostic(
        code(lexlink::extract::timeout),
        help("Increase `timeout_secs` in the [extractor] section for large documents.")
    )]
    Timeout { timeout_secs: u64 },

    #[error("extraction tool exited with code {code}: {stderr}")]
    #[diagnostic(
        code(lexlink::extract::failed),
        help("Verify that `jar` and `home` in the [extractor] section are correct.")
    )]
    Failed { code: i32, stderr: String },

    #[error("invalid upload file name: \"{name}\"")]
    #[diagnostic(
        code(lexlink::extract::file_name),
        help("Upload the PDF with a plain file name such as `judgment.pdf`.")
    )]
    InvalidFileName { name: String },

    #[error("I/O error in extraction workspace: {source}")]
    #[diagnostic(
        code(lexlink::extract::io),
        help("Check that the scratch directory exists and is writable.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Corpus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("I/O error at {path}: {source}")]
    #[diagnostic(
        code(lexlink::corpus::io),
        help("A filesystem operation failed. Check file paths and permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("download of {url} failed: {message}")]
    #[diagnostic(
        code(lexlink::corpus::download),
        help("Check that the archive URL is reachable from this host.")
    )]
    Download { url: String, message: String },

    #[error("invalid training archive {path}: {message}")]
    #[diagnostic(
        code(lexlink::corpus::archive),
        help(
            "The archive must be a zip file containing `<model>/corpus/` \
             directories, e.g. `fulltext/corpus/tei/`."
        )
    )]
    Archive { path: String, message: String },
}

impl CorpusError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Convenience alias for functions returning lexlink results.
pub type LexResult<T> = std::result::Result<T, LexError>;

pub type NerResult<T> = std::result::Result<T, NerError>;

pub type DictionaryResult<T> = std::result::Result<T, DictionaryError>;

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

pub type CorpusResult<T> = std::result::Result<T, CorpusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ner_error_converts_to_lex_error() {
        let err = NerError::Status {
            url: "http://localhost:8000/ner".into(),
            status: 503,
        };
        let lex: LexError = err.into();
        assert!(matches!(lex, LexError::Ner(NerError::Status { .. })));
    }

    #[test]
    fn extract_error_display_mentions_timeout() {
        let err = ExtractError::Timeout { timeout_secs: 42 };
        assert!(format!("{err}").contains("42s"));
    }

    #[test]
    fn corpus_io_helper_keeps_path() {
        let err = CorpusError::io(
            std::path::Path::new("/tmp/corpus"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        let msg = format!("{err}");
        assert!(msg.contains("/tmp/corpus"));
    }
}
