use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::response::Redirect;
use axum::Json;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::StreamReader;
use tracing::{debug, error, info};

use crate::api::ApiError;
use crate::content::validate;
use crate::server::AppState;
use crate::storage::StoredObject;
use crate::token::ObjectId;
use crate::utils::io::{BodyReadError, ReplayReader};
use crate::utils::limits::SNIFF_LEN;
use crate::utils::names;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /upload - browser form, answered with a 303 to the download link
pub async fn handle_form_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ApiError> {
    let link = receive(&state, multipart).await?;
    Ok(Redirect::to(&link))
}

/// POST /api/upload - programmatic callers get `{"url": ...}`
pub async fn handle_api_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let url = receive(&state, multipart).await?;
    Ok(Json(UploadResponse { url }))
}

async fn receive(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, ApiError> {
    let result = match multipart {
        Ok(multipart) => accept_upload(state, multipart).await,
        Err(rejection) => {
            debug!("Multipart rejected: {}", rejection);
            Err(rejection.into())
        }
    };

    match result {
        Ok(object) => {
            state.metrics.record_upload(object.size_bytes);
            Ok(state.link_for(&object))
        }
        Err(err) => {
            state.metrics.record_rejected_upload();
            Err(err)
        }
    }
}

async fn accept_upload(state: &AppState, mut multipart: Multipart) -> Result<StoredObject, ApiError> {
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            debug!("Multipart read failed: {}", e);
            ApiError::RequestTooLarge
        })?;
        match field {
            Some(field) if field.name() == Some(FILE_FIELD) && has_file_name(&field) => {
                return store_field(state, field).await;
            }
            Some(_) => continue,
            None => return Err(ApiError::MissingFile),
        }
    }
}

/// Parts without a filename are plain form values, even when named `file`.
fn has_file_name(field: &Field<'_>) -> bool {
    field.file_name().is_some_and(|name| !name.is_empty())
}

async fn store_field(state: &AppState, field: Field<'_>) -> Result<StoredObject, ApiError> {
    let original_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or(ApiError::MissingFile)?;

    let ext = names::extension(&original_name);
    if !state.allowed.contains(&ext) {
        debug!(name = %original_name, "Extension {:?} not allowed", ext);
        return Err(ApiError::ExtensionNotAllowed);
    }

    let stream = Box::pin(field.map_err(BodyReadError::into_io));
    let mut body = ReplayReader::fill(StreamReader::new(stream), SNIFF_LEN)
        .await
        .map_err(|e| {
            debug!("Upload body read failed: {}", e);
            ApiError::RequestTooLarge
        })?;

    if let Err(mismatch) = validate(body.head(), &ext) {
        debug!(
            name = %original_name,
            claimed = %mismatch.claimed,
            sniffed = mismatch.sniffed,
            "Rejected upload: content does not match extension"
        );
        return Err(mismatch.into());
    }

    let id = ObjectId::generate();
    match state.store.save(&id, &original_name, &mut body).await {
        Ok(object) => {
            info!(id = %object.id, size = object.size_bytes, name = %original_name, "Stored upload");
            Ok(object)
        }
        Err(err) if BodyReadError::is_cause_of(&err) => {
            debug!(name = %original_name, "Upload aborted while streaming: {:#}", err);
            Err(ApiError::RequestTooLarge)
        }
        Err(err) => {
            error!(id = %id, name = %original_name, "Failed to store upload: {:#}", err);
            Err(ApiError::StorageWriteFailure)
        }
    }
}
