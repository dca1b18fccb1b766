//! HTTP routes served by `lexlinkd`.
//!
//! - `GET  /`: liveness text
//! - `GET  /health`: status and version
//! - `POST /createTraining`: multipart `pdf` → training outputs for
//!   segmentation, fulltext, header and table
//! - `POST /createTableData`: multipart `pdf` → table outputs only
//! - `POST /trainmodel`: form `zip_link` → install the training archive
//! - `POST /spacy`: form `key` → linked HTML and act slugs
//! - `POST /predict`: form `key` → acts, citations, organizations, HTML
//!
//! Form fields are read from urlencoded and multipart bodies alike.
//!
//! Handlers hand blocking work (subprocess, HTTP client, filesystem) to
//! `spawn_blocking`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{StatusCode, header};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::annotate::{Annotation, Annotator, StatuteAnnotation};
use crate::config::{CorpusConfig, LexConfig};
use crate::corpus::TrainingArchive;
use crate::error::{CorpusError, ExtractError, LexResult, NerError};
use crate::extract::{Extractor, TrainingModel, TrainingOutputs};

/// Upload cap for PDFs.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

type ApiError = (StatusCode, String);

// ── Server state ──────────────────────────────────────────────────────────

pub struct ServerState {
    annotator: Annotator,
    extractor: Extractor,
    archive: TrainingArchive,
    corpus: CorpusConfig,
    scratch_dir: PathBuf,
}

impl ServerState {
    /// Build from config; per-request working directories go under `scratch_dir`.
    pub fn new(config: &LexConfig, scratch_dir: PathBuf) -> LexResult<Self> {
        Ok(Self {
            annotator: Annotator::from_config(config)?,
            extractor: Extractor::new(config.extractor.clone()),
            archive: TrainingArchive::new(config.corpus.download_timeout_secs),
            corpus: config.corpus.clone(),
            scratch_dir,
        })
    }
}

/// The full route table with permissive CORS.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        // Training data.
        .route("/createTraining", post(create_training))
        .route("/createTableData", post(create_table_data))
        .route("/trainmodel", post(train_model))
        // Annotation.
        .route("/spacy", post(spacy))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Request / response types ──────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct TableDataResponse {
    table_xml: String,
    table_raw: String,
    currentdir: String,
    /// Always empty; older clients read this misspelled key.
    currendir: String,
}

/// An uploaded file.
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn index() -> &'static str {
    "Server is up and running,  200"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn create_training(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Result<Json<TrainingOutputs>, ApiError> {
    let upload = read_upload(multipart, "pdf").await?;
    let outputs = run_extraction(state, upload, &TrainingModel::CREATE_TRAINING).await?;
    Ok(Json(outputs))
}

async fn create_table_data(
    State(state): State<Arc<ServerState>>,
    multipart: Multipart,
) -> Result<Json<TableDataResponse>, ApiError> {
    let upload = read_upload(multipart, "pdf").await?;
    let outputs = run_extraction(state, upload, &[TrainingModel::Table]).await?;
    let table = outputs.get(TrainingModel::Table).cloned().unwrap_or_default();
    let currentdir = std::env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    Ok(Json(TableDataResponse {
        table_xml: table.xml,
        table_raw: table.raw,
        currentdir,
        currendir: String::new(),
    }))
}

async fn train_model(
    State(state): State<Arc<ServerState>>,
    request: Request,
) -> Result<&'static str, ApiError> {
    let url = read_text_field(request, "zip_link").await?;
    let report = tokio::task::spawn_blocking(move || {
        state
            .archive
            .install_from_url(&url, &state.corpus, &TrainingModel::ALL)
    })
    .await
    .map_err(join_error)?
    .map_err(corpus_error)?;
    tracing::info!(installed = report.installed(), "training archive installed");
    Ok("200")
}

async fn spacy(
    State(state): State<Arc<ServerState>>,
    request: Request,
) -> Result<Json<StatuteAnnotation>, ApiError> {
    let text = read_text_field(request, "key").await?;
    let result = tokio::task::spawn_blocking(move || state.annotator.annotate_statutes(&text))
        .await
        .map_err(join_error)?
        .map_err(ner_error)?;
    Ok(Json(result))
}

async fn predict(
    State(state): State<Arc<ServerState>>,
    request: Request,
) -> Result<Json<Annotation>, ApiError> {
    let text = read_text_field(request, "key").await?;
    let result = tokio::task::spawn_blocking(move || state.annotator.annotate(&text))
        .await
        .map_err(join_error)?
        .map_err(ner_error)?;
    Ok(Json(result))
}

// ── Helpers ───────────────────────────────────────────────────────────────

async fn run_extraction(
    state: Arc<ServerState>,
    upload: Upload,
    models: &'static [TrainingModel],
) -> Result<TrainingOutputs, ApiError> {
    tokio::task::spawn_blocking(move || {
        state.extractor.process_pdf(
            &state.scratch_dir,
            &upload.file_name,
            &upload.bytes,
            models,
        )
    })
    .await
    .map_err(join_error)?
    .map_err(extract_error)
}

/// Read the file field `name` from a multipart body.
async fn read_upload(mut multipart: Multipart, name: &str) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("failed to read \"{name}\": {e}")))?;
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err((
        StatusCode::BAD_REQUEST,
        format!("missing multipart field \"{name}\""),
    ))
}

/// Read the text field `name` from a urlencoded or multipart form.
async fn read_text_field(request: Request, name: &str) -> Result<String, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"));

    let value = if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| (e.status(), e.body_text()))?;
        let mut found = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid multipart body: {e}")))?
        {
            if field.name() == Some(name) {
                let text = field.text().await.map_err(|e| {
                    (StatusCode::BAD_REQUEST, format!("failed to read \"{name}\": {e}"))
                })?;
                found = Some(text);
                break;
            }
        }
        found
    } else {
        let Form(mut fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|e| (e.status(), e.body_text()))?;
        fields.remove(name)
    };

    value.ok_or_else(|| (StatusCode::BAD_REQUEST, format!("missing form field \"{name}\"")))
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("worker task failed: {e}"),
    )
}

fn extract_error(e: ExtractError) -> ApiError {
    tracing::error!("extraction failed: {e}");
    let status = match e {
        ExtractError::InvalidFileName { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

fn corpus_error(e: CorpusError) -> ApiError {
    tracing::error!("training archive install failed: {e}");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn ner_error(e: NerError) -> ApiError {
    tracing::error!("annotation failed: {e}");
    let status = match e {
        NerError::Transport { .. } | NerError::Status { .. } | NerError::Malformed { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
