//! Tiered local-filesystem content store.
//!
//! Layout: `<tier root>/<document id>/<resource name>`. A document's
//! resources live in exactly one tier at a time; `move_resources_to_tier`
//! relocates them wholesale.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use docvault_core::config::storage::StorageConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::content::{ByteStream, ContentStore};
use docvault_core::types::id::DocumentId;

/// Local-filesystem content store spread across numbered tiers.
#[derive(Debug, Clone)]
pub struct TieredContentStore {
    /// Tier new content is written to when the document has no tier yet.
    write_tier: i32,
    /// Tier id to root directory, in configuration order.
    tiers: Vec<(i32, PathBuf)>,
}

impl TieredContentStore {
    /// Create a store from configuration, creating every tier root.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let mut tiers = Vec::with_capacity(config.tiers.len());
        for tier in &config.tiers {
            let root = PathBuf::from(&tier.root_path);
            fs::create_dir_all(&root).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create tier root: {}", root.display()),
                    e,
                )
            })?;
            tiers.push((tier.id, root));
        }
        if tiers.is_empty() {
            return Err(AppError::configuration("No storage tiers configured"));
        }
        Ok(Self {
            write_tier: config.write_tier,
            tiers,
        })
    }

    fn tier_root(&self, tier: i32) -> Option<&PathBuf> {
        self.tiers.iter().find(|(id, _)| *id == tier).map(|(_, r)| r)
    }

    /// The tier currently holding the document's resources, if any.
    async fn current_tier(&self, doc_id: DocumentId) -> Option<i32> {
        for (id, root) in &self.tiers {
            if fs::metadata(root.join(doc_id.to_string())).await.is_ok() {
                return Some(*id);
            }
        }
        None
    }

    /// Find the full path of an existing resource, searching all tiers.
    async fn locate(&self, doc_id: DocumentId, resource: &str) -> Option<PathBuf> {
        for (_, root) in &self.tiers {
            let path = root.join(doc_id.to_string()).join(resource);
            if fs::metadata(&path).await.is_ok() {
                return Some(path);
            }
        }
        None
    }

    /// Directory the next write for this document should land in.
    async fn write_dir(&self, doc_id: DocumentId) -> AppResult<PathBuf> {
        let tier = self.current_tier(doc_id).await.unwrap_or(self.write_tier);
        let root = self.tier_root(tier).ok_or_else(|| {
            AppError::configuration(format!("Storage tier {tier} is not configured"))
        })?;
        Ok(root.join(doc_id.to_string()))
    }

    async fn ensure_dir(path: &Path) -> AppResult<()> {
        fs::create_dir_all(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", path.display()),
                e,
            )
        })
    }
}

#[async_trait]
impl ContentStore for TieredContentStore {
    async fn store(&self, doc_id: DocumentId, resource: &str, data: Bytes) -> AppResult<()> {
        let dir = self.write_dir(doc_id).await?;
        Self::ensure_dir(&dir).await?;
        let path = dir.join(resource);
        let mut file = fs::File::create(&path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create resource: {}", path.display()),
                e,
            )
        })?;
        file.write_all(&data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write resource: {}", path.display()),
                e,
            )
        })?;
        file.flush().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to flush resource: {}", path.display()),
                e,
            )
        })?;
        debug!(doc_id = %doc_id, resource, bytes = data.len(), "Stored resource");
        Ok(())
    }

    async fn read(&self, doc_id: DocumentId, resource: &str) -> AppResult<ByteStream> {
        let path = self.locate(doc_id, resource).await.ok_or_else(|| {
            AppError::not_found(format!("Resource {resource} of document {doc_id} not found"))
        })?;
        let file = fs::File::open(&path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to open resource: {}", path.display()),
                e,
            )
        })?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn read_bytes(&self, doc_id: DocumentId, resource: &str) -> AppResult<Bytes> {
        let path = self.locate(doc_id, resource).await.ok_or_else(|| {
            AppError::not_found(format!("Resource {resource} of document {doc_id} not found"))
        })?;
        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read resource: {}", path.display()),
                    e,
                )
            })
    }

    async fn delete(&self, doc_id: DocumentId, resource: Option<&str>) -> AppResult<()> {
        match resource {
            Some(resource) => {
                if let Some(path) = self.locate(doc_id, resource).await {
                    fs::remove_file(&path).await.map_err(|e| {
                        AppError::with_source(
                            ErrorKind::Storage,
                            format!("Failed to delete resource: {}", path.display()),
                            e,
                        )
                    })?;
                }
            }
            None => {
                for (_, root) in &self.tiers {
                    let dir = root.join(doc_id.to_string());
                    if fs::metadata(&dir).await.is_ok() {
                        fs::remove_dir_all(&dir).await.map_err(|e| {
                            AppError::with_source(
                                ErrorKind::Storage,
                                format!("Failed to delete document directory: {}", dir.display()),
                                e,
                            )
                        })?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn list_resources(
        &self,
        doc_id: DocumentId,
        file_version: &str,
    ) -> AppResult<Vec<String>> {
        let ancillary_prefix = format!("{file_version}-");
        let mut names = Vec::new();
        for (_, root) in &self.tiers {
            let dir = root.join(doc_id.to_string());
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to list resources", e)
            })? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name == file_version || name.starts_with(&ancillary_prefix) {
                    names.push(name);
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn exists(&self, doc_id: DocumentId, resource: &str) -> AppResult<bool> {
        Ok(self.locate(doc_id, resource).await.is_some())
    }

    async fn move_resources_to_tier(&self, doc_id: DocumentId, tier: i32) -> AppResult<u32> {
        let target_root = self.tier_root(tier).ok_or_else(|| {
            AppError::configuration(format!("Storage tier {tier} is not configured"))
        })?;
        let target_dir = target_root.join(doc_id.to_string());

        let mut moved = 0u32;
        for (id, root) in &self.tiers {
            if *id == tier {
                continue;
            }
            let source_dir = root.join(doc_id.to_string());
            let mut entries = match fs::read_dir(&source_dir).await {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            Self::ensure_dir(&target_dir).await?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to list resources", e)
            })? {
                let name = entry.file_name();
                let destination = target_dir.join(&name);
                fs::copy(entry.path(), &destination).await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to copy resource to tier {tier}"),
                        e,
                    )
                })?;
                fs::remove_file(entry.path()).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to remove moved resource", e)
                })?;
                moved += 1;
            }
            let _ = fs::remove_dir(&source_dir).await;
        }

        if moved > 0 {
            debug!(doc_id = %doc_id, tier, moved, "Moved resources between tiers");
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::config::storage::TierConfig;
    use futures::StreamExt;

    async fn store_with_tiers(dir: &Path, ids: &[i32]) -> TieredContentStore {
        let config = StorageConfig {
            write_tier: ids[0],
            tiers: ids
                .iter()
                .map(|id| TierConfig {
                    id: *id,
                    root_path: dir.join(format!("tier{id}")).to_string_lossy().into_owned(),
                })
                .collect(),
        };
        TieredContentStore::new(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_store_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tiers(dir.path(), &[1]).await;
        let doc = DocumentId::new();

        store
            .store(doc, "1.0", Bytes::from("hello world"))
            .await
            .unwrap();
        assert!(store.exists(doc, "1.0").await.unwrap());
        assert_eq!(store.read_bytes(doc, "1.0").await.unwrap(), "hello world");

        store.delete(doc, Some("1.0")).await.unwrap();
        assert!(!store.exists(doc, "1.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_streams_full_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tiers(dir.path(), &[1]).await;
        let doc = DocumentId::new();

        store
            .store(doc, "1.0", Bytes::from(vec![7u8; 4096]))
            .await
            .unwrap();

        let mut stream = store.read(doc, "1.0").await.unwrap();
        let mut total = 0;
        while let Some(chunk) = stream.next().await {
            total += chunk.unwrap().len();
        }
        assert_eq!(total, 4096);
    }

    #[tokio::test]
    async fn test_list_resources_filters_by_file_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tiers(dir.path(), &[1]).await;
        let doc = DocumentId::new();

        store.store(doc, "1.0", Bytes::from("a")).await.unwrap();
        store
            .store(doc, "1.0-conversion.pdf", Bytes::from("b"))
            .await
            .unwrap();
        store.store(doc, "2.0", Bytes::from("c")).await.unwrap();

        let resources = store.list_resources(doc, "1.0").await.unwrap();
        assert_eq!(resources, vec!["1.0", "1.0-conversion.pdf"]);
    }

    #[tokio::test]
    async fn test_move_resources_between_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tiers(dir.path(), &[1, 2]).await;
        let doc = DocumentId::new();

        store.store(doc, "1.0", Bytes::from("a")).await.unwrap();
        store.store(doc, "1.1", Bytes::from("b")).await.unwrap();

        let moved = store.move_resources_to_tier(doc, 2).await.unwrap();
        assert_eq!(moved, 2);

        // Still readable, and subsequent writes follow the document.
        assert_eq!(store.read_bytes(doc, "1.0").await.unwrap(), "a");
        store.store(doc, "1.2", Bytes::from("c")).await.unwrap();
        assert_eq!(store.current_tier(doc).await, Some(2));
    }

    #[tokio::test]
    async fn test_resource_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tiers(dir.path(), &[1]).await;
        assert_eq!(store.resource_name("1.0", None), "1.0");
        assert_eq!(
            store.resource_name("1.0", Some("conversion.pdf")),
            "1.0-conversion.pdf"
        );
    }
}
