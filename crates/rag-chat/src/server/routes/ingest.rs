//! Document ingestion endpoint

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::path::Path;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::ingestion::StagedFile;
use crate::server::state::AppState;
use crate::types::IngestResponse;

/// Multipart field carrying uploaded files
const FILES_FIELD: &str = "files";

/// POST /ingest - Upload and index files
///
/// Uploads are staged in a request-scoped directory that is removed once the
/// request completes, whether or not ingestion succeeded.
pub async fn ingest_files(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestResponse>> {
    let mut multipart = multipart.map_err(|e| Error::invalid_request(e.body_text()))?;
    let start = Instant::now();

    let upload_root = &state.config().server.upload_dir;
    tokio::fs::create_dir_all(upload_root).await?;
    let staging = tempfile::Builder::new()
        .prefix("ingest-")
        .tempdir_in(upload_root)?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_request(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let source = sanitize_filename(field.file_name(), files.len());
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_request(format!("Failed to read '{}': {}", source, e)))?;

        tracing::info!("Received file: {} ({} bytes)", source, data.len());

        // Index prefix keeps same-named uploads apart
        let path = staging.path().join(format!("{}-{}", files.len(), source));
        tokio::fs::write(&path, &data).await?;
        files.push(StagedFile { path, source });
    }

    if files.is_empty() {
        return Err(Error::invalid_request(format!(
            "No files uploaded; expected one or more '{}' fields",
            FILES_FIELD
        )));
    }

    let file_count = files.len();
    let result = state.ingest_pipeline().ingest(files).await;

    let staging_path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        tracing::warn!("Failed to remove upload directory {}: {}", staging_path.display(), e);
    }

    let chunks_indexed = result?;
    tracing::info!(
        "Ingest complete: {} files, {} chunks in {}ms",
        file_count,
        chunks_indexed,
        start.elapsed().as_millis()
    );

    Ok(Json(IngestResponse::ok(chunks_indexed)))
}

/// Final path component of the client filename, or `upload-{n}` if none
fn sanitize_filename(file_name: Option<&str>, position: usize) -> String {
    file_name
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("upload-{}", position))
}
