use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::api::ApiError;
use crate::server::AppState;
use crate::storage::StoredObject;
use crate::utils::names;

/// One entry of GET /api/files.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub uploaded_at: String,
    pub url: String,
    pub is_image: bool,
}

impl FileEntry {
    pub fn new(object: &StoredObject, url: String) -> Self {
        Self {
            id: object.id.clone(),
            name: object.original_name.clone(),
            size: object.size_bytes,
            uploaded_at: object.uploaded_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            url,
            is_image: names::is_inline_image(&names::extension(&object.original_name)),
        }
    }
}

/// GET /api/files - every stored object with a freshly signed link
pub async fn handle_list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileEntry>>, ApiError> {
    let objects = state.store.list().await.map_err(|e| {
        error!("Failed to list objects: {:#}", e);
        ApiError::ListingFailure
    })?;

    let entries = objects
        .iter()
        .map(|object| FileEntry::new(object, state.link_for(object)))
        .collect();
    Ok(Json(entries))
}
