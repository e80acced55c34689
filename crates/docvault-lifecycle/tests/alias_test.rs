//! Alias creation and materialization tests.

mod support;

use chrono::Utc;
use uuid::Uuid;

use docvault_core::error::ErrorKind;
use docvault_core::traits::content::ContentStore;
use docvault_entity::document::{DocumentLink, DocumentNote};
use docvault_lifecycle::Actor;
use docvault_lifecycle::traits::{Permission, RecordStore};

use support::{MemoryAccessControl, audit, harness, harness_with_access};

#[tokio::test]
async fn test_create_alias_points_at_the_document() {
    let h = harness();
    let actor = Actor::new("marco");
    let doc = h.seed_document("origin.txt", "body", &actor).await;

    let alias = h
        .coordinator
        .create_alias(&doc, &h.folder, None, &audit(&actor))
        .await
        .unwrap();

    assert_eq!(alias.doc_ref, Some(doc.id));
    assert_eq!(alias.file_name, "origin.txt");
    assert_eq!(alias.version, doc.version);
    assert_eq!(h.history.entries_for("shortcut_stored").len(), 1);
}

#[tokio::test]
async fn test_alias_of_alias_never_nests() {
    let h = harness();
    let actor = Actor::new("marco");
    let doc = h.seed_document("origin.txt", "body", &actor).await;

    let first = h
        .coordinator
        .create_alias(&doc, &h.folder, None, &audit(&actor))
        .await
        .unwrap();
    let second = h
        .coordinator
        .create_alias(&first, &h.folder, None, &audit(&actor))
        .await
        .unwrap();

    // The chain is flattened: both aliases reference the concrete document.
    assert_eq!(second.doc_ref, Some(doc.id));
}

#[tokio::test]
async fn test_alias_type_overrides_the_extension() {
    let h = harness();
    let actor = Actor::new("marco");
    let doc = h.seed_document("drawing.dwg", "cad data", &actor).await;

    let alias = h
        .coordinator
        .create_alias(&doc, &h.folder, Some("pdf"), &audit(&actor))
        .await
        .unwrap();

    assert_eq!(alias.file_name, "drawing.pdf");
    assert_eq!(alias.file_type, "pdf");
    assert_eq!(alias.doc_ref_type.as_deref(), Some("pdf"));
}

#[tokio::test]
async fn test_replace_alias_materializes_a_copy() {
    let h = harness();
    let actor = Actor::new("marco");
    let doc = h.seed_document("contract.pdf", "the contract body", &actor).await;

    let note = DocumentNote {
        id: Uuid::new_v4(),
        doc_id: doc.id,
        file_version: None,
        user_id: actor.id,
        username: actor.username.clone(),
        message: "signed by legal".to_string(),
        created_at: Utc::now(),
    };
    h.records.notes.insert(note.id, note);

    let other = h.seed_document("annex.pdf", "annex", &actor).await;
    let link = DocumentLink {
        id: Uuid::new_v4(),
        tenant_id: h.tenant,
        doc1: doc.id,
        doc2: other.id,
        link_type: "default".to_string(),
    };
    h.records.links.insert(link.id, link);

    let alias = h
        .coordinator
        .create_alias(&doc, &h.folder, None, &audit(&actor))
        .await
        .unwrap();

    let copy = h
        .coordinator
        .replace_alias(alias.id, &audit(&actor))
        .await
        .unwrap();

    // The alias row is gone, the copy is a real document with content.
    assert!(h.records.find_document(alias.id).await.unwrap().is_none());
    assert!(copy.doc_ref.is_none());
    assert_eq!(copy.folder_id, h.folder.id);
    assert_eq!(
        h.content.read_bytes(copy.id, "1.0").await.unwrap(),
        "the contract body"
    );

    let copied_notes: Vec<_> = h
        .records
        .notes
        .iter()
        .filter(|n| n.doc_id == copy.id)
        .map(|n| n.message.clone())
        .collect();
    assert_eq!(copied_notes, vec!["signed by legal".to_string()]);

    let copied_links = h.records.find_links(copy.id).await.unwrap();
    assert_eq!(copied_links.len(), 1);
    assert_eq!(copied_links[0].doc2, other.id);
}

#[tokio::test]
async fn test_replace_alias_requires_write_permission() {
    let access = MemoryAccessControl::default();
    let h = harness_with_access(access);
    let actor = Actor::new("marco");
    let doc = h.seed_document("guarded.txt", "body", &actor).await;
    let alias = h
        .coordinator
        .create_alias(&doc, &h.folder, None, &audit(&actor))
        .await
        .unwrap();

    let err = h
        .coordinator
        .replace_alias(alias.id, &audit(&actor))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    h.access.grant(actor.id, h.folder.id, Permission::Write);
    h.coordinator
        .replace_alias(alias.id, &audit(&actor))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_replace_alias_on_regular_document_fails() {
    let h = harness();
    let actor = Actor::new("marco");
    let doc = h.seed_document("plain.txt", "body", &actor).await;

    let err = h
        .coordinator
        .replace_alias(doc.id, &audit(&actor))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
