//! PostgreSQL record store.

use async_trait::async_trait;
use sqlx::PgPool;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::types::id::{DocumentId, FolderId, TenantId, VersionId};
use docvault_entity::document::status::STATUS_ARCHIVED;
use docvault_entity::document::{Document, DocumentLink, DocumentNote, IndexingState};
use docvault_entity::folder::Folder;
use docvault_entity::version::Version;
use docvault_lifecycle::traits::RecordStore;

/// Record store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Create a new record store on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_document(&self, id: DocumentId) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND NOT deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find document", e))
    }

    async fn find_by_custom_id(
        &self,
        custom_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE custom_id = $1 AND tenant_id = $2 AND NOT deleted",
        )
        .bind(custom_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find document by custom id", e)
        })
    }

    async fn find_documents_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE folder_id = $1 AND NOT deleted ORDER BY file_name ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list documents", e))
    }

    async fn find_aliases(&self, doc_ref: DocumentId) -> AppResult<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE doc_ref = $1 AND id <> $1 AND NOT deleted",
        )
        .bind(doc_ref)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list aliases", e))
    }

    async fn store_document(&self, document: &Document) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO documents (id, tenant_id, folder_id, file_name, file_type, version, \
             file_version, file_size, digest, page_count, status, lock_user_id, lock_user_name, \
             immutable, indexed, doc_ref, doc_ref_type, custom_id, template_id, tags, locale, \
             publisher, publisher_id, creator, creator_id, comment, ext_res_id, stamped, signed, \
             ocr_processed, barcode_processed, deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34) \
             ON CONFLICT (id) DO UPDATE SET \
             folder_id = EXCLUDED.folder_id, file_name = EXCLUDED.file_name, \
             file_type = EXCLUDED.file_type, version = EXCLUDED.version, \
             file_version = EXCLUDED.file_version, file_size = EXCLUDED.file_size, \
             digest = EXCLUDED.digest, page_count = EXCLUDED.page_count, \
             status = EXCLUDED.status, lock_user_id = EXCLUDED.lock_user_id, \
             lock_user_name = EXCLUDED.lock_user_name, immutable = EXCLUDED.immutable, \
             indexed = EXCLUDED.indexed, doc_ref = EXCLUDED.doc_ref, \
             doc_ref_type = EXCLUDED.doc_ref_type, custom_id = EXCLUDED.custom_id, \
             template_id = EXCLUDED.template_id, tags = EXCLUDED.tags, \
             locale = EXCLUDED.locale, publisher = EXCLUDED.publisher, \
             publisher_id = EXCLUDED.publisher_id, creator = EXCLUDED.creator, \
             creator_id = EXCLUDED.creator_id, comment = EXCLUDED.comment, \
             ext_res_id = EXCLUDED.ext_res_id, stamped = EXCLUDED.stamped, \
             signed = EXCLUDED.signed, ocr_processed = EXCLUDED.ocr_processed, \
             barcode_processed = EXCLUDED.barcode_processed, deleted = EXCLUDED.deleted, \
             updated_at = NOW()",
        )
        .bind(document.id)
        .bind(document.tenant_id)
        .bind(document.folder_id)
        .bind(&document.file_name)
        .bind(&document.file_type)
        .bind(&document.version)
        .bind(&document.file_version)
        .bind(document.file_size)
        .bind(&document.digest)
        .bind(document.page_count)
        .bind(document.status)
        .bind(document.lock_user_id)
        .bind(&document.lock_user_name)
        .bind(document.immutable)
        .bind(document.indexed)
        .bind(document.doc_ref)
        .bind(&document.doc_ref_type)
        .bind(&document.custom_id)
        .bind(document.template_id)
        .bind(&document.tags)
        .bind(&document.locale)
        .bind(&document.publisher)
        .bind(document.publisher_id)
        .bind(&document.creator)
        .bind(document.creator_id)
        .bind(&document.comment)
        .bind(&document.ext_res_id)
        .bind(document.stamped)
        .bind(document.signed)
        .bind(document.ocr_processed)
        .bind(document.barcode_processed)
        .bind(document.deleted)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("documents_custom_id_key") =>
            {
                AppError::conflict("Duplicated custom identifier")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to store document", e),
        })?;
        Ok(())
    }

    async fn soft_delete_document(&self, id: DocumentId) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE documents SET deleted = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete document", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    async fn document_exists(&self, id: DocumentId) -> AppResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE id = $1 AND NOT deleted")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to check document", e)
                })?;
        Ok(count > 0)
    }

    async fn mark_indexed(&self, id: DocumentId, state: IndexingState) -> AppResult<u64> {
        let result = sqlx::query("UPDATE documents SET indexed = $2 WHERE id = $1")
            .bind(id)
            .bind(state)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to set indexing state", e)
            })?;
        Ok(result.rows_affected())
    }

    async fn mark_aliases_to_index(&self, doc_ref: DocumentId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE documents SET indexed = $2 WHERE doc_ref = $1 AND id <> $1 AND NOT deleted",
        )
        .bind(doc_ref)
        .bind(IndexingState::ToIndex)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark aliases", e))?;
        Ok(result.rows_affected())
    }

    async fn archive_document(&self, id: DocumentId) -> AppResult<()> {
        sqlx::query(
            "UPDATE documents SET status = $2, lock_user_id = NULL, lock_user_name = NULL, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(STATUS_ARCHIVED)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to archive document", e))?;
        Ok(())
    }

    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    async fn find_folder_parents(&self, id: FolderId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "WITH RECURSIVE ancestry AS ( \
                 SELECT f.*, 0 AS depth FROM folders f \
                 WHERE f.id = (SELECT parent_id FROM folders WHERE id = $1) \
                 UNION ALL \
                 SELECT f.*, a.depth + 1 FROM folders f \
                 JOIN ancestry a ON f.id = a.parent_id \
             ) \
             SELECT id, tenant_id, parent_id, name, store_tier FROM ancestry ORDER BY depth ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to resolve folder ancestry", e)
        })
    }

    async fn folder_path(&self, id: FolderId) -> AppResult<String> {
        let folder = self
            .find_folder(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Unexisting folder {id}")))?;
        let mut segments: Vec<String> = self
            .find_folder_parents(id)
            .await?
            .into_iter()
            .map(|parent| parent.name)
            .collect();
        segments.reverse();
        segments.push(folder.name);
        Ok(format!("/{}", segments.join("/")))
    }

    async fn find_folder_ids_in_tree(&self, root: FolderId) -> AppResult<Vec<FolderId>> {
        sqlx::query_scalar::<_, FolderId>(
            "WITH RECURSIVE tree AS ( \
                 SELECT id FROM folders WHERE id = $1 \
                 UNION ALL \
                 SELECT f.id FROM folders f JOIN tree t ON f.parent_id = t.id \
             ) \
             SELECT id FROM tree",
        )
        .bind(root)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to walk the folder tree", e)
        })
    }

    async fn find_version(&self, id: VersionId) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM document_versions WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find version", e))
    }

    async fn find_version_by_spec(
        &self,
        doc_id: DocumentId,
        version: &str,
    ) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM document_versions \
             WHERE doc_id = $1 AND version = $2 AND NOT deleted",
        )
        .bind(doc_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find version", e))
    }

    async fn find_versions_by_doc(&self, doc_id: DocumentId) -> AppResult<Vec<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM document_versions \
             WHERE doc_id = $1 AND NOT deleted ORDER BY created_at DESC",
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list versions", e))
    }

    async fn store_version(&self, version: &Version) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO document_versions (id, doc_id, version, file_version, file_size, digest, \
             event, comment, file_name, template_id, tags, custom_id, user_id, username, deleted, \
             created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (id) DO UPDATE SET \
             file_size = EXCLUDED.file_size, digest = EXCLUDED.digest, \
             comment = EXCLUDED.comment, deleted = EXCLUDED.deleted",
        )
        .bind(version.id)
        .bind(version.doc_id)
        .bind(&version.version)
        .bind(&version.file_version)
        .bind(version.file_size)
        .bind(&version.digest)
        .bind(&version.event)
        .bind(&version.comment)
        .bind(&version.file_name)
        .bind(version.template_id)
        .bind(&version.tags)
        .bind(&version.custom_id)
        .bind(version.user_id)
        .bind(&version.username)
        .bind(version.deleted)
        .bind(version.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store version", e))?;
        Ok(())
    }

    async fn soft_delete_version(&self, id: VersionId) -> AppResult<bool> {
        let result = sqlx::query("UPDATE document_versions SET deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete version", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_notes(
        &self,
        doc_id: DocumentId,
        file_version: Option<&str>,
    ) -> AppResult<Vec<DocumentNote>> {
        let query = match file_version {
            Some(_) => {
                "SELECT * FROM document_notes \
                 WHERE doc_id = $1 AND (file_version IS NULL OR file_version = $2) \
                 ORDER BY created_at ASC"
            }
            None => "SELECT * FROM document_notes WHERE doc_id = $1 ORDER BY created_at ASC",
        };
        let mut q = sqlx::query_as::<_, DocumentNote>(query).bind(doc_id);
        if let Some(file_version) = file_version {
            q = q.bind(file_version);
        }
        q.fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notes", e))
    }

    async fn store_note(&self, note: &DocumentNote) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO document_notes (id, doc_id, file_version, user_id, username, message, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(note.id)
        .bind(note.doc_id)
        .bind(&note.file_version)
        .bind(note.user_id)
        .bind(&note.username)
        .bind(&note.message)
        .bind(note.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store note", e))?;
        Ok(())
    }

    async fn copy_annotations(
        &self,
        doc_id: DocumentId,
        from_file_version: &str,
        to_file_version: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "INSERT INTO document_notes (id, doc_id, file_version, user_id, username, message, \
             created_at) \
             SELECT gen_random_uuid(), doc_id, $3, user_id, username, message, created_at \
             FROM document_notes WHERE doc_id = $1 AND file_version = $2",
        )
        .bind(doc_id)
        .bind(from_file_version)
        .bind(to_file_version)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to copy annotations", e))?;
        Ok(result.rows_affected())
    }

    async fn find_links(&self, doc_id: DocumentId) -> AppResult<Vec<DocumentLink>> {
        sqlx::query_as::<_, DocumentLink>(
            "SELECT * FROM document_links WHERE doc1 = $1 OR doc2 = $1",
        )
        .bind(doc_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list links", e))
    }

    async fn store_link(&self, link: &DocumentLink) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO document_links (id, tenant_id, doc1, doc2, link_type) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(link.id)
        .bind(link.tenant_id)
        .bind(link.doc1)
        .bind(link.doc2)
        .bind(&link.link_type)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store link", e))?;
        Ok(())
    }

    async fn purge_versions(&self, doc_id: DocumentId) -> AppResult<u64> {
        self.purge("DELETE FROM document_versions WHERE doc_id = $1", doc_id)
            .await
    }

    async fn purge_aliases(&self, doc_id: DocumentId) -> AppResult<u64> {
        self.purge(
            "DELETE FROM documents WHERE doc_ref = $1 AND id <> $1",
            doc_id,
        )
        .await
    }

    async fn purge_links(&self, doc_id: DocumentId) -> AppResult<u64> {
        self.purge(
            "DELETE FROM document_links WHERE doc1 = $1 OR doc2 = $1",
            doc_id,
        )
        .await
    }

    async fn purge_notes(&self, doc_id: DocumentId) -> AppResult<u64> {
        self.purge("DELETE FROM document_notes WHERE doc_id = $1", doc_id)
            .await
    }

    async fn purge_bookmarks(&self, doc_id: DocumentId) -> AppResult<u64> {
        self.purge("DELETE FROM bookmarks WHERE doc_id = $1", doc_id)
            .await
    }

    async fn purge_tickets(&self, doc_id: DocumentId) -> AppResult<u64> {
        self.purge("DELETE FROM tickets WHERE doc_id = $1", doc_id)
            .await
    }

    async fn purge_history(&self, doc_id: DocumentId) -> AppResult<u64> {
        self.purge("DELETE FROM document_history WHERE doc_id = $1", doc_id)
            .await
    }

    async fn purge_document(&self, id: DocumentId) -> AppResult<u64> {
        self.purge("DELETE FROM documents WHERE id = $1", id).await
    }
}

impl PgRecordStore {
    async fn purge(&self, statement: &str, id: DocumentId) -> AppResult<u64> {
        let result = sqlx::query(statement)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Purge statement failed", e))?;
        Ok(result.rows_affected())
    }
}
