use std::path::{Path, PathBuf};
use tracing::{info, warn};
use anyhow::{Context, Result};
use serde::Serialize;

use crate::storage::{StoredObject, META_FILE};
use crate::token::is_valid_id;

/// Findings of a read-only pass over the data directory.
#[derive(Debug, Default, Serialize)]
pub struct StoreReport {
    pub objects: usize,
    pub bytes: u64,
    /// Object directories without usable metadata, e.g. interrupted uploads.
    pub incomplete: Vec<String>,
    /// Objects whose metadata survives but whose blob does not.
    pub missing_blobs: Vec<String>,
    /// Top-level entries that are not object directories.
    pub foreign_entries: Vec<String>,
}

impl StoreReport {
    pub fn is_clean(&self) -> bool {
        self.incomplete.is_empty() && self.missing_blobs.is_empty()
    }
}

pub struct StartupValidator {
    root: PathBuf,
}

impl StartupValidator {
    pub fn new(data_path: impl AsRef<Path>) -> Self {
        Self {
            root: data_path.as_ref().to_path_buf(),
        }
    }

    pub fn validate_and_start(&self) -> Result<StoreReport> {
        info!("🔍 Auditing store at {:?}", self.root);

        if !self.root.exists() {
            info!("No data directory - starting fresh");
            return Ok(StoreReport::default());
        }

        let report = self.scan()?;
        for id in &report.incomplete {
            warn!(id = %id, "Object directory has no valid metadata");
        }
        for id in &report.missing_blobs {
            warn!(id = %id, "Object blob is missing");
        }

        info!(
            "✅ Found {} objects ({} bytes), {} incomplete, {} missing blobs",
            report.objects,
            report.bytes,
            report.incomplete.len(),
            report.missing_blobs.len()
        );
        Ok(report)
    }

    fn scan(&self) -> Result<StoreReport> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read directory {:?}", self.root))?;
        let mut report = StoreReport::default();

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir || !is_valid_id(&name) {
                report.foreign_entries.push(name);
                continue;
            }

            let dir = entry.path();
            let object = std::fs::read(dir.join(META_FILE))
                .ok()
                .and_then(|bytes| serde_json::from_slice::<StoredObject>(&bytes).ok())
                .filter(|object| object.is_consistent_with(&name));

            match object {
                Some(object) if dir.join(&object.stored_path).is_file() => {
                    report.objects += 1;
                    report.bytes += object.size_bytes;
                }
                Some(_) => report.missing_blobs.push(name),
                None => report.incomplete.push(name),
            }
        }

        report.incomplete.sort();
        report.missing_blobs.sort();
        report.foreign_entries.sort();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, ObjectStore, BLOB_FILE};
    use crate::token::ObjectId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reports_incomplete_and_missing_blobs() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());

        let mut data: &[u8] = b"content";
        let good = store.save(&ObjectId::generate(), "a.txt", &mut data).await.unwrap();
        let mut data: &[u8] = b"gone";
        let orphan = store.save(&ObjectId::generate(), "b.txt", &mut data).await.unwrap();
        std::fs::remove_file(dir.path().join(&orphan.id).join(BLOB_FILE)).unwrap();

        let half = ObjectId::generate();
        std::fs::create_dir(dir.path().join(half.as_str())).unwrap();
        std::fs::write(dir.path().join(half.as_str()).join(BLOB_FILE), b"x").unwrap();
        std::fs::write(dir.path().join("README"), b"notes").unwrap();

        let report = StartupValidator::new(dir.path()).validate_and_start().unwrap();
        assert_eq!(report.objects, 1);
        assert_eq!(report.bytes, good.size_bytes);
        assert_eq!(report.missing_blobs, vec![orphan.id]);
        assert_eq!(report.incomplete, vec![half.to_string()]);
        assert_eq!(report.foreign_entries, vec!["README".to_string()]);
        assert!(!report.is_clean());
    }

    #[test]
    fn missing_root_is_a_fresh_start() {
        let dir = TempDir::new().unwrap();
        let report = StartupValidator::new(dir.path().join("absent"))
            .validate_and_start()
            .unwrap();
        assert_eq!(report.objects, 0);
        assert!(report.is_clean());
    }
}
