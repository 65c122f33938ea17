use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::server::AppState;
use crate::utils::names;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub token: String,
}

/// GET /d/:id/:name?token= - the name segment is cosmetic, lookup is by id
pub async fn handle_download(
    State(state): State<Arc<AppState>>,
    Path((id, _name)): Path<(String, String)>,
    Query(query): Query<DownloadQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    if !state.signer.verify(&id, &query.token) {
        debug!(id = %id, "Rejected download token");
        state.metrics.record_denied_download();
        return Err(ApiError::Unauthorized);
    }

    let object = state.store.load(&id).await.ok_or(ApiError::NotFound)?;
    let blob_path = state.store.blob_path(&object);
    if !tokio::fs::try_exists(&blob_path).await.unwrap_or(false) {
        warn!(id = %id, "Metadata present but blob is missing");
        return Err(ApiError::NotFound);
    }

    let ext = names::extension(&object.original_name);
    let mime = mime_guess::from_ext(ext.trim_start_matches('.')).first_or_octet_stream();
    let safe_name = names::sanitize(&object.original_name);
    let disposition = if names::is_inline_image(&ext) {
        format!("inline; filename=\"{}\"", safe_name)
    } else {
        format!("attachment; filename=\"{}\"", safe_name)
    };
    let disposition = HeaderValue::from_str(&disposition).map_err(|_| ApiError::Internal)?;

    debug!(id = %id, name = %object.original_name, "Serving download");

    // ServeFile handles Range, If-Modified-Since and friends.
    let mut response = match ServeFile::new_with_mime(&blob_path, &mime).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(err) => {
            warn!(id = %id, "Failed to serve blob: {}", err);
            return Err(ApiError::Internal);
        }
    };

    if response.status().is_success() {
        let served = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        state.metrics.record_download(served);
    }

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    Ok(response.into_response())
}
