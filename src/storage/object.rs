use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

pub const BLOB_FILE: &str = "blob";
pub const META_FILE: &str = "meta.json";

/// Metadata record kept next to each blob as `meta.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: String,
    /// Filename as sent by the client. Untrusted.
    #[serde(rename = "orig_name")]
    pub original_name: String,
    /// Blob location relative to the object directory.
    pub stored_path: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredObject {
    pub fn new(id: String, original_name: String, size_bytes: u64) -> Self {
        Self {
            id,
            original_name,
            stored_path: BLOB_FILE.to_string(),
            size_bytes,
            uploaded_at: Utc::now().trunc_subsecs(0),
        }
    }

    /// Metadata that could have come from `new` for the directory `dir_name`.
    pub fn is_consistent_with(&self, dir_name: &str) -> bool {
        self.id == dir_name && is_plain_file_name(&self.stored_path)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(&['/', '\\'][..])
}
