use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::storage::StoredObject;
use crate::token::ObjectId;

/// Reader handed to [`ObjectStore::save`].
pub type UploadStream<'a> = &'a mut (dyn AsyncRead + Send + Unpin);

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `stream` and its metadata under `id`. Nothing is left behind
    /// when this fails.
    async fn save(
        &self,
        id: &ObjectId,
        original_name: &str,
        stream: UploadStream<'_>,
    ) -> anyhow::Result<StoredObject>;

    /// Metadata for `id`, or `None` when it is missing or unreadable.
    async fn load(&self, id: &str) -> Option<StoredObject>;

    /// Every object with valid metadata, in directory order.
    async fn list(&self) -> anyhow::Result<Vec<StoredObject>>;

    fn blob_path(&self, object: &StoredObject) -> PathBuf;
}
