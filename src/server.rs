//! Upload-and-convert HTTP service.
//!
//! | Route | |
//! |-------|---|
//! | `GET /` | upload form |
//! | `POST /upload` | multipart field `md_file` → `result.zip` |
//!
//! Every upload is converted inside its own [`tempfile::TempDir`] (prefix
//! `md_upload_`). The directory is dropped, and therefore deleted, on every
//! exit path of the request: success, conversion error or panic unwinding.
//! Requests share nothing but the read-only configuration.

use crate::archive;
use crate::config::ConversionConfig;
use crate::convert::convert_bytes;
use crate::error::BlogPressError;
use crate::pipeline::input::InputFormat;
use crate::template::UPLOAD_FORM;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Multipart field carrying the source document.
pub const FILE_FIELD: &str = "md_file";

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Prefix of the per-request working directory.
pub const WORKDIR_PREFIX: &str = "md_upload_";

#[derive(Clone)]
struct AppState {
    config: Arc<ConversionConfig>,
}

/// Build the service router.
pub fn router(config: ConversionConfig) -> Router {
    Router::new()
        .route("/", get(upload_form))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(AppState {
            config: Arc::new(config),
        })
}

async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

type HandlerError = (StatusCode, String);

fn bad_request(message: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, message.into())
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, HandlerError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        bad_request(format!("failed to read upload: {e}"))
    })? {
        if field.name() != Some(FILE_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let data = field.bytes().await.map_err(|e| {
            error!("Failed to read file data: {}", e);
            bad_request(format!("failed to read upload: {e}"))
        })?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| bad_request("no file was uploaded"))?;
    if filename.is_empty() {
        return Err(bad_request("filename is empty"));
    }
    if let Err(e) = InputFormat::from_name(&filename) {
        return Err(bad_request(e.to_string()));
    }

    info!("Received '{}' ({} bytes)", filename, data.len());
    match convert_upload(&state.config, &filename, &data).await {
        Ok(zip) => Ok((
            [
                (header::CONTENT_TYPE, "application/zip"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"result.zip\""),
            ],
            zip,
        )
            .into_response()),
        Err(e) => {
            error!("Conversion of '{}' failed: {:?}", filename, e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("conversion failed: {e}")))
        }
    }
}

/// Convert inside a fresh working directory and return the zipped result.
async fn convert_upload(
    config: &ConversionConfig,
    filename: &str,
    data: &[u8],
) -> Result<Vec<u8>, BlogPressError> {
    let workdir = tempfile::Builder::new()
        .prefix(WORKDIR_PREFIX)
        .tempdir()
        .map_err(|e| BlogPressError::Internal(format!("Failed to create working directory: {e}")))?;
    debug!("Working directory {}", workdir.path().display());

    let output = convert_bytes(data, filename, workdir.path(), config).await?;
    let zip = archive::zip_dir(workdir.path()).await?;
    info!(
        "Converted '{}': {} media file(s), {} byte archive",
        filename, output.stats.media_downloaded, zip.len()
    );
    Ok(zip)
}
