use std::fs::ReadDir;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::storage::{ObjectStore, StoredObject, UploadStream, BLOB_FILE, META_FILE};
use crate::token::{is_valid_id, ObjectId};

/// Object store on the local filesystem:
/// `{root}/{id}/blob` and `{root}/{id}/meta.json`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Lazy iterator over stored objects. Each call re-reads the directory.
    pub fn objects(&self) -> anyhow::Result<Objects> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read directory {:?}", self.root))?;
        Ok(Objects { entries })
    }

    async fn write_object(
        &self,
        dir: &Path,
        id: &ObjectId,
        original_name: &str,
        stream: UploadStream<'_>,
    ) -> anyhow::Result<StoredObject> {
        let blob_path = dir.join(BLOB_FILE);
        let mut blob = fs::File::create(&blob_path)
            .await
            .with_context(|| format!("failed to create {:?}", blob_path))?;
        let size = tokio::io::copy(stream, &mut blob)
            .await
            .with_context(|| format!("failed to write {:?}", blob_path))?;
        blob.flush().await?;
        blob.sync_all().await?;
        drop(blob);

        let object = StoredObject::new(id.to_string(), original_name.to_string(), size);
        let meta = serde_json::to_vec_pretty(&object)?;

        // Readers must never observe a partially written record.
        let tmp_path = dir.join(format!("{}.tmp", META_FILE));
        fs::write(&tmp_path, meta)
            .await
            .with_context(|| format!("failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, dir.join(META_FILE)).await?;

        Ok(object)
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalStorage {
    async fn save(
        &self,
        id: &ObjectId,
        original_name: &str,
        stream: UploadStream<'_>,
    ) -> anyhow::Result<StoredObject> {
        let dir = self.object_dir(id.as_str());
        fs::create_dir_all(&self.root).await?;
        fs::create_dir(&dir)
            .await
            .with_context(|| format!("failed to create object directory {:?}", dir))?;

        match self.write_object(&dir, id, original_name, stream).await {
            Ok(object) => {
                debug!(id = %id, size = object.size_bytes, "object stored");
                Ok(object)
            }
            Err(err) => {
                if let Err(cleanup) = fs::remove_dir_all(&dir).await {
                    warn!(id = %id, "failed to remove partial object: {}", cleanup);
                }
                Err(err)
            }
        }
    }

    async fn load(&self, id: &str) -> Option<StoredObject> {
        let id = ObjectId::parse(id)?;
        let bytes = fs::read(self.object_dir(id.as_str()).join(META_FILE)).await.ok()?;
        parse_meta(id.as_str(), &bytes)
    }

    async fn list(&self) -> anyhow::Result<Vec<StoredObject>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<StoredObject>> {
            Ok(store.objects()?.collect())
        })
        .await?
    }

    fn blob_path(&self, object: &StoredObject) -> PathBuf {
        self.object_dir(&object.id).join(&object.stored_path)
    }
}

fn parse_meta(dir_name: &str, bytes: &[u8]) -> Option<StoredObject> {
    match serde_json::from_slice::<StoredObject>(bytes) {
        Ok(object) if object.is_consistent_with(dir_name) => Some(object),
        Ok(_) => {
            warn!(id = dir_name, "metadata does not match its directory");
            None
        }
        Err(e) => {
            warn!(id = dir_name, "unparsable metadata: {}", e);
            None
        }
    }
}

/// Iterator returned by [`LocalStorage::objects`]. Entries without valid
/// metadata are skipped.
#[derive(Debug)]
pub struct Objects {
    entries: ReadDir,
}

impl Iterator for Objects {
    type Item = StoredObject;

    fn next(&mut self) -> Option<StoredObject> {
        for entry in self.entries.by_ref().flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(id) = name.to_str() else { continue };
            if !is_valid_id(id) {
                continue;
            }
            let Ok(bytes) = std::fs::read(entry.path().join(META_FILE)) else {
                continue;
            };
            if let Some(object) = parse_meta(id, &bytes) {
                return Some(object);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn save_bytes(store: &LocalStorage, name: &str, data: &[u8]) -> StoredObject {
        let id = ObjectId::generate();
        let mut reader = data;
        store.save(&id, name, &mut reader).await.unwrap()
    }

    #[tokio::test]
    async fn save_writes_blob_and_metadata() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());

        let object = save_bytes(&store, "notes.txt", b"hello world").await;
        assert_eq!(object.size_bytes, 11);
        assert_eq!(object.stored_path, "blob");

        let object_dir = dir.path().join(&object.id);
        assert_eq!(std::fs::read(object_dir.join("blob")).unwrap(), b"hello world");
        assert!(object_dir.join("meta.json").exists());
        assert!(!object_dir.join("meta.json.tmp").exists());

        let loaded = store.load(&object.id).await.unwrap();
        assert_eq!(loaded, object);
        assert_eq!(store.blob_path(&loaded), object_dir.join("blob"));
    }

    #[tokio::test]
    async fn load_rejects_unknown_and_malformed_ids() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());

        assert!(store.load(ObjectId::generate().as_str()).await.is_none());
        assert!(store.load("..").await.is_none());
        assert!(store.load("../etc").await.is_none());
    }

    #[tokio::test]
    async fn load_treats_corrupt_metadata_as_missing() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());
        let object = save_bytes(&store, "a.txt", b"a").await;

        std::fs::write(dir.path().join(&object.id).join("meta.json"), b"{not json").unwrap();
        assert!(store.load(&object.id).await.is_none());
    }

    #[tokio::test]
    async fn list_skips_entries_without_valid_metadata() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());

        let a = save_bytes(&store, "a.txt", b"a").await;
        let b = save_bytes(&store, "b.pdf", b"%PDF-").await;

        std::fs::create_dir(dir.path().join(ObjectId::generate().as_str())).unwrap();
        std::fs::create_dir(dir.path().join("not-an-id")).unwrap();
        std::fs::write(dir.path().join("stray-file"), b"x").unwrap();

        let mut ids: Vec<String> = store.list().await.unwrap().into_iter().map(|o| o.id).collect();
        ids.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(ids, expected);

        // Restartable: a second pass sees the same objects.
        assert_eq!(store.objects().unwrap().count(), 2);
    }

    #[tokio::test]
    async fn list_fails_when_root_is_missing() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path().join("nope"));
        assert!(store.list().await.is_err());
    }

    #[tokio::test]
    async fn failed_save_leaves_nothing_behind() {
        struct Failing;
        impl tokio::io::AsyncRead for Failing {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::other("connection reset")))
            }
        }

        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());
        let id = ObjectId::generate();

        assert!(store.save(&id, "x.txt", &mut Failing).await.is_err());
        assert!(!dir.path().join(id.as_str()).exists());
    }
}
