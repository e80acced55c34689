//! In-memory collaborator implementations shared by the integration
//! tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::StreamExt;
use uuid::Uuid;

use docvault_core::config::lifecycle::LifecycleConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::content::{ByteStream, ContentStore};
use docvault_core::traits::parser::{ContentParser, ParseRequest};
use docvault_core::types::id::{DocumentId, FolderId, TenantId, UserId, VersionId};
use docvault_entity::document::status::STATUS_ARCHIVED;
use docvault_entity::document::{Document, DocumentLink, DocumentNote, IndexingState};
use docvault_entity::folder::Folder;
use docvault_entity::history::HistoryEntry;
use docvault_entity::version::Version;
use docvault_lifecycle::traits::{
    AccessControl, FullTextIndex, HistorySink, LifecycleListener, Permission, RecordStore,
};
use docvault_lifecycle::{Actor, AuditContext, LifecycleCoordinator};

// -- Record store --

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    pub documents: DashMap<DocumentId, Document>,
    pub versions: DashMap<VersionId, Version>,
    pub folders: DashMap<FolderId, Folder>,
    pub notes: DashMap<Uuid, DocumentNote>,
    pub links: DashMap<Uuid, DocumentLink>,
}

impl MemoryRecordStore {
    pub fn live_versions(&self, doc_id: DocumentId) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .versions
            .iter()
            .filter(|v| v.doc_id == doc_id && !v.deleted)
            .map(|v| v.clone())
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        versions
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_document(&self, id: DocumentId) -> AppResult<Option<Document>> {
        Ok(self
            .documents
            .get(&id)
            .map(|d| d.clone())
            .filter(|d| !d.deleted))
    }

    async fn find_by_custom_id(
        &self,
        custom_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Option<Document>> {
        Ok(self
            .documents
            .iter()
            .find(|d| {
                !d.deleted && d.tenant_id == tenant_id && d.custom_id.as_deref() == Some(custom_id)
            })
            .map(|d| d.clone()))
    }

    async fn find_documents_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .filter(|d| !d.deleted && d.folder_id == folder_id)
            .map(|d| d.clone())
            .collect())
    }

    async fn find_aliases(&self, doc_ref: DocumentId) -> AppResult<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .filter(|d| !d.deleted && d.doc_ref == Some(doc_ref) && d.id != doc_ref)
            .map(|d| d.clone())
            .collect())
    }

    async fn store_document(&self, document: &Document) -> AppResult<()> {
        self.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn soft_delete_document(&self, id: DocumentId) -> AppResult<bool> {
        match self.documents.get_mut(&id) {
            Some(mut doc) => {
                doc.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn document_exists(&self, id: DocumentId) -> AppResult<bool> {
        Ok(self.documents.get(&id).map(|d| !d.deleted).unwrap_or(false))
    }

    async fn mark_indexed(&self, id: DocumentId, state: IndexingState) -> AppResult<u64> {
        match self.documents.get_mut(&id) {
            Some(mut doc) => {
                doc.indexed = state;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn mark_aliases_to_index(&self, doc_ref: DocumentId) -> AppResult<u64> {
        let mut affected = 0;
        for mut doc in self.documents.iter_mut() {
            if !doc.deleted && doc.doc_ref == Some(doc_ref) && doc.id != doc_ref {
                doc.indexed = IndexingState::ToIndex;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn archive_document(&self, id: DocumentId) -> AppResult<()> {
        if let Some(mut doc) = self.documents.get_mut(&id) {
            doc.status = STATUS_ARCHIVED;
            doc.lock_user_id = None;
            doc.lock_user_name = None;
        }
        Ok(())
    }

    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.folders.get(&id).map(|f| f.clone()))
    }

    async fn find_folder_parents(&self, id: FolderId) -> AppResult<Vec<Folder>> {
        let mut parents = Vec::new();
        let mut cursor = self.folders.get(&id).and_then(|f| f.parent_id);
        while let Some(parent_id) = cursor {
            let Some(parent) = self.folders.get(&parent_id).map(|f| f.clone()) else {
                break;
            };
            cursor = parent.parent_id;
            parents.push(parent);
        }
        Ok(parents)
    }

    async fn folder_path(&self, id: FolderId) -> AppResult<String> {
        let folder = self
            .folders
            .get(&id)
            .map(|f| f.clone())
            .ok_or_else(|| AppError::not_found(format!("Unexisting folder {id}")))?;
        let mut segments: Vec<String> = self
            .find_folder_parents(id)
            .await?
            .into_iter()
            .map(|f| f.name)
            .collect();
        segments.reverse();
        segments.push(folder.name);
        Ok(format!("/{}", segments.join("/")))
    }

    async fn find_folder_ids_in_tree(&self, root: FolderId) -> AppResult<Vec<FolderId>> {
        let mut result = vec![root];
        let mut frontier = vec![root];
        while let Some(parent) = frontier.pop() {
            for folder in self.folders.iter() {
                if folder.parent_id == Some(parent) {
                    result.push(folder.id);
                    frontier.push(folder.id);
                }
            }
        }
        Ok(result)
    }

    async fn find_version(&self, id: VersionId) -> AppResult<Option<Version>> {
        Ok(self
            .versions
            .get(&id)
            .map(|v| v.clone())
            .filter(|v| !v.deleted))
    }

    async fn find_version_by_spec(
        &self,
        doc_id: DocumentId,
        version: &str,
    ) -> AppResult<Option<Version>> {
        Ok(self
            .versions
            .iter()
            .find(|v| !v.deleted && v.doc_id == doc_id && v.version == version)
            .map(|v| v.clone()))
    }

    async fn find_versions_by_doc(&self, doc_id: DocumentId) -> AppResult<Vec<Version>> {
        Ok(self.live_versions(doc_id))
    }

    async fn store_version(&self, version: &Version) -> AppResult<()> {
        self.versions.insert(version.id, version.clone());
        Ok(())
    }

    async fn soft_delete_version(&self, id: VersionId) -> AppResult<bool> {
        match self.versions.get_mut(&id) {
            Some(mut version) => {
                version.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_notes(
        &self,
        doc_id: DocumentId,
        file_version: Option<&str>,
    ) -> AppResult<Vec<DocumentNote>> {
        Ok(self
            .notes
            .iter()
            .filter(|n| n.doc_id == doc_id)
            .filter(|n| match file_version {
                Some(fv) => n.file_version.is_none() || n.file_version.as_deref() == Some(fv),
                None => true,
            })
            .map(|n| n.clone())
            .collect())
    }

    async fn store_note(&self, note: &DocumentNote) -> AppResult<()> {
        self.notes.insert(note.id, note.clone());
        Ok(())
    }

    async fn copy_annotations(
        &self,
        doc_id: DocumentId,
        from_file_version: &str,
        to_file_version: &str,
    ) -> AppResult<u64> {
        let copies: Vec<DocumentNote> = self
            .notes
            .iter()
            .filter(|n| n.doc_id == doc_id && n.file_version.as_deref() == Some(from_file_version))
            .map(|n| {
                let mut copy = n.clone();
                copy.id = Uuid::new_v4();
                copy.file_version = Some(to_file_version.to_string());
                copy
            })
            .collect();
        let count = copies.len() as u64;
        for copy in copies {
            self.notes.insert(copy.id, copy);
        }
        Ok(count)
    }

    async fn find_links(&self, doc_id: DocumentId) -> AppResult<Vec<DocumentLink>> {
        Ok(self
            .links
            .iter()
            .filter(|l| l.doc1 == doc_id || l.doc2 == doc_id)
            .map(|l| l.clone())
            .collect())
    }

    async fn store_link(&self, link: &DocumentLink) -> AppResult<()> {
        self.links.insert(link.id, link.clone());
        Ok(())
    }

    async fn purge_versions(&self, doc_id: DocumentId) -> AppResult<u64> {
        let before = self.versions.len();
        self.versions.retain(|_, v| v.doc_id != doc_id);
        Ok((before - self.versions.len()) as u64)
    }

    async fn purge_aliases(&self, doc_id: DocumentId) -> AppResult<u64> {
        let before = self.documents.len();
        self.documents
            .retain(|id, d| d.doc_ref != Some(doc_id) || *id == doc_id);
        Ok((before - self.documents.len()) as u64)
    }

    async fn purge_links(&self, doc_id: DocumentId) -> AppResult<u64> {
        let before = self.links.len();
        self.links.retain(|_, l| l.doc1 != doc_id && l.doc2 != doc_id);
        Ok((before - self.links.len()) as u64)
    }

    async fn purge_notes(&self, doc_id: DocumentId) -> AppResult<u64> {
        let before = self.notes.len();
        self.notes.retain(|_, n| n.doc_id != doc_id);
        Ok((before - self.notes.len()) as u64)
    }

    async fn purge_bookmarks(&self, _doc_id: DocumentId) -> AppResult<u64> {
        Ok(0)
    }

    async fn purge_tickets(&self, _doc_id: DocumentId) -> AppResult<u64> {
        Ok(0)
    }

    async fn purge_history(&self, _doc_id: DocumentId) -> AppResult<u64> {
        Ok(0)
    }

    async fn purge_document(&self, id: DocumentId) -> AppResult<u64> {
        Ok(self.documents.remove(&id).map(|_| 1).unwrap_or(0))
    }
}

// -- Content store --

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    pub blobs: DashMap<(DocumentId, String), Bytes>,
    pub tiers: DashMap<DocumentId, i32>,
    fail_store: AtomicBool,
}

impl MemoryContentStore {
    pub fn fail_next_store(&self) {
        self.fail_store.store(true, Ordering::SeqCst);
    }

    pub fn resources_of(&self, doc_id: DocumentId) -> Vec<String> {
        self.blobs
            .iter()
            .filter(|entry| entry.key().0 == doc_id)
            .map(|entry| entry.key().1.clone())
            .collect()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(&self, doc_id: DocumentId, resource: &str, data: Bytes) -> AppResult<()> {
        if self.fail_store.swap(false, Ordering::SeqCst) {
            return Err(AppError::storage("content store unavailable"));
        }
        self.blobs.insert((doc_id, resource.to_string()), data);
        Ok(())
    }

    async fn read(&self, doc_id: DocumentId, resource: &str) -> AppResult<ByteStream> {
        let data = self.read_bytes(doc_id, resource).await?;
        Ok(Box::pin(futures::stream::iter([Ok::<_, std::io::Error>(
            data,
        )])))
    }

    async fn read_bytes(&self, doc_id: DocumentId, resource: &str) -> AppResult<Bytes> {
        self.blobs
            .get(&(doc_id, resource.to_string()))
            .map(|b| b.clone())
            .ok_or_else(|| {
                AppError::not_found(format!("Resource {resource} of document {doc_id} not found"))
            })
    }

    async fn delete(&self, doc_id: DocumentId, resource: Option<&str>) -> AppResult<()> {
        match resource {
            Some(resource) => {
                self.blobs.remove(&(doc_id, resource.to_string()));
            }
            None => {
                self.blobs.retain(|key, _| key.0 != doc_id);
            }
        }
        Ok(())
    }

    async fn list_resources(
        &self,
        doc_id: DocumentId,
        file_version: &str,
    ) -> AppResult<Vec<String>> {
        let prefix = format!("{file_version}-");
        let mut names: Vec<String> = self
            .blobs
            .iter()
            .filter(|entry| entry.key().0 == doc_id)
            .map(|entry| entry.key().1.clone())
            .filter(|name| name == file_version || name.starts_with(&prefix))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn exists(&self, doc_id: DocumentId, resource: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(&(doc_id, resource.to_string())))
    }

    async fn move_resources_to_tier(&self, doc_id: DocumentId, tier: i32) -> AppResult<u32> {
        let previous = self.tiers.insert(doc_id, tier);
        if previous == Some(tier) {
            return Ok(0);
        }
        Ok(self.resources_of(doc_id).len() as u32)
    }
}

// -- Full-text index --

#[derive(Debug, Default)]
pub struct MemoryIndex {
    pub hits: DashMap<DocumentId, String>,
}

#[async_trait]
impl FullTextIndex for MemoryIndex {
    async fn add_hit(&self, document: &Document, content: &str) -> AppResult<()> {
        self.hits.insert(document.id, content.to_string());
        Ok(())
    }

    async fn delete_hit(&self, doc_id: DocumentId) -> AppResult<()> {
        self.hits.remove(&doc_id);
        Ok(())
    }

    async fn delete_hits(&self, doc_ids: &[DocumentId]) -> AppResult<()> {
        for doc_id in doc_ids {
            self.hits.remove(doc_id);
        }
        Ok(())
    }

    async fn hit_content(&self, doc_id: DocumentId) -> AppResult<Option<String>> {
        Ok(self.hits.get(&doc_id).map(|c| c.clone()))
    }
}

// -- Parser --

#[derive(Debug, Default)]
pub struct MemoryParser {
    pub fail: AtomicBool,
    pub parse_calls: AtomicUsize,
}

impl MemoryParser {
    pub fn fail_parsing(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn parse_count(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentParser for MemoryParser {
    async fn parse(&self, mut stream: ByteStream, request: &ParseRequest) -> AppResult<String> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::parsing(format!(
                "No parser available for {}",
                request.file_name
            )));
        }
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    async fn count_pages(&self, data: Bytes, _file_name: &str) -> AppResult<i32> {
        Ok((data.len() as i32 / 1000).max(1))
    }
}

// -- History sink --

#[derive(Debug, Default)]
pub struct MemoryHistory {
    pub entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistory {
    pub fn entries_for(&self, event: &str) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .expect("history mutex poisoned")
            .iter()
            .filter(|e| e.event == event)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistorySink for MemoryHistory {
    async fn store(&self, entry: &HistoryEntry) -> AppResult<()> {
        self.entries
            .lock()
            .expect("history mutex poisoned")
            .push(entry.clone());
        Ok(())
    }
}

// -- Access control --

#[derive(Debug, Default)]
pub struct MemoryAccessControl {
    pub allow_all: AtomicBool,
    pub folder_grants: DashMap<(UserId, FolderId), Vec<Permission>>,
    pub destroyers: DashMap<UserId, ()>,
}

impl MemoryAccessControl {
    pub fn permissive() -> Self {
        let access = Self::default();
        access.allow_all.store(true, Ordering::SeqCst);
        access
    }

    pub fn grant(&self, user_id: UserId, folder_id: FolderId, permission: Permission) {
        self.folder_grants
            .entry((user_id, folder_id))
            .or_default()
            .push(permission);
    }

    pub fn allow_destroy(&self, user_id: UserId) {
        self.destroyers.insert(user_id, ());
    }
}

#[async_trait]
impl AccessControl for MemoryAccessControl {
    async fn is_allowed(
        &self,
        user_id: UserId,
        folder_id: FolderId,
        permission: Permission,
    ) -> AppResult<bool> {
        if self.allow_all.load(Ordering::SeqCst) {
            return Ok(true);
        }
        Ok(self
            .folder_grants
            .get(&(user_id, folder_id))
            .map(|perms| perms.contains(&permission))
            .unwrap_or(false))
    }

    async fn can_destroy(&self, user_id: UserId) -> AppResult<bool> {
        if self.allow_all.load(Ordering::SeqCst) {
            return Ok(true);
        }
        Ok(self.destroyers.contains_key(&user_id))
    }
}

// -- Harness --

pub struct TestHarness {
    pub records: Arc<MemoryRecordStore>,
    pub content: Arc<MemoryContentStore>,
    pub index: Arc<MemoryIndex>,
    pub parser: Arc<MemoryParser>,
    pub history: Arc<MemoryHistory>,
    pub access: Arc<MemoryAccessControl>,
    pub coordinator: Arc<LifecycleCoordinator>,
    pub tenant: TenantId,
    pub folder: Folder,
}

pub fn test_config() -> LifecycleConfig {
    LifecycleConfig {
        start_version: "1.0".to_string(),
        version_write_max_attempts: 100,
        version_write_interval_ms: 10,
        index_skip_on_error: false,
        default_tier: 1,
    }
}

pub fn harness() -> TestHarness {
    build_harness(test_config(), MemoryAccessControl::permissive(), Vec::new())
}

pub fn harness_with_config(config: LifecycleConfig) -> TestHarness {
    build_harness(config, MemoryAccessControl::permissive(), Vec::new())
}

pub fn harness_with_access(access: MemoryAccessControl) -> TestHarness {
    build_harness(test_config(), access, Vec::new())
}

pub fn build_harness(
    config: LifecycleConfig,
    access: MemoryAccessControl,
    listeners: Vec<Arc<dyn LifecycleListener>>,
) -> TestHarness {
    let records = Arc::new(MemoryRecordStore::default());
    let content = Arc::new(MemoryContentStore::default());
    let index = Arc::new(MemoryIndex::default());
    let parser = Arc::new(MemoryParser::default());
    let history = Arc::new(MemoryHistory::default());
    let access = Arc::new(access);

    let tenant = TenantId::new();
    let folder = Folder::root(tenant, "workspace");
    records.folders.insert(folder.id, folder.clone());

    let mut coordinator = LifecycleCoordinator::new(
        Arc::clone(&records) as Arc<dyn RecordStore>,
        Arc::clone(&content) as Arc<dyn ContentStore>,
        Arc::clone(&index) as Arc<dyn FullTextIndex>,
        Arc::clone(&parser) as Arc<dyn ContentParser>,
        Arc::clone(&history) as Arc<dyn HistorySink>,
        Arc::clone(&access) as Arc<dyn AccessControl>,
        config,
    );
    for listener in listeners {
        coordinator.add_listener(listener);
    }

    TestHarness {
        records,
        content,
        index,
        parser,
        history,
        access,
        coordinator: Arc::new(coordinator),
        tenant,
        folder,
    }
}

impl TestHarness {
    /// Create a document through the coordinator and wait for its initial
    /// version to land.
    pub async fn seed_document(&self, file_name: &str, content: &str, actor: &Actor) -> Document {
        let doc = Document::new(self.tenant, self.folder.id, file_name);
        let created = self
            .coordinator
            .create(
                Bytes::from(content.to_string()),
                doc,
                &AuditContext::new(actor.clone()),
            )
            .await
            .expect("create failed");
        self.wait_for_version_count(created.id, 1).await;
        created
    }

    /// Poll until the document has at least `count` live versions.
    pub async fn wait_for_version_count(&self, doc_id: DocumentId, count: usize) {
        for _ in 0..200 {
            if self.records.live_versions(doc_id).len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected at least {count} versions for document {doc_id}, found {}",
            self.records.live_versions(doc_id).len()
        );
    }

    pub fn document(&self, id: DocumentId) -> Document {
        self.records
            .documents
            .get(&id)
            .map(|d| d.clone())
            .expect("document not found")
    }
}

pub fn audit(actor: &Actor) -> AuditContext {
    AuditContext::new(actor.clone())
}
