use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use unicode_normalization::UnicodeNormalization;

use crate::errors::ApiError;

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub size: usize,
    pub content_type: Option<String>,
}

/// POST /api/analysis/upload-repo
///
/// Reports what was uploaded in the `files` field. Nothing is stored.
pub async fn upload_repo(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::BadRequest("No files provided".into()))?;

    let mut saw_files = false;
    let mut uploaded = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        if field.name() != Some("files") {
            continue;
        }
        saw_files = true;

        // Parts without a filename are empty file inputs.
        let Some(raw_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        uploaded.push(UploadedFile {
            filename: secure_filename(&raw_name),
            size: content.len(),
            content_type,
        });
    }

    if !saw_files {
        return Err(ApiError::BadRequest("No files provided".into()));
    }
    info!(count = uploaded.len(), "received repository upload");
    Ok(Json(json!({ "uploaded": uploaded, "count": uploaded.len() })))
}

/// GET /api/analysis/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "analysis-routes" }))
}

/// GET /health
pub async fn service_health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "Code Architect API" }))
}

/// Reduces an uploaded filename to a safe base name.
///
/// Directories are dropped and whitespace runs become `_`. Accented letters are
/// decomposed (NFKD) so `ï` keeps its `i`; after that only ASCII letters,
/// digits, `.`, `_` and `-` survive.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let joined = base.split_whitespace().collect::<Vec<_>>().join("_");
    joined
        .nfkd()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
