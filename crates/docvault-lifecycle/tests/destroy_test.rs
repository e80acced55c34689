//! Destroy cascade tests.

mod support;

use chrono::Utc;
use uuid::Uuid;

use docvault_core::error::ErrorKind;
use docvault_entity::document::{DocumentLink, DocumentNote};
use docvault_lifecycle::Actor;
use docvault_lifecycle::traits::RecordStore;

use support::{MemoryAccessControl, audit, harness, harness_with_access};

#[tokio::test]
async fn test_destroy_cascades_through_every_store() {
    let h = harness();
    let actor = Actor::new("marco");
    let doc = h.seed_document("doomed.txt", "body", &actor).await;

    let alias = h
        .coordinator
        .create_alias(&doc, &h.folder, None, &audit(&actor))
        .await
        .unwrap();
    let note = DocumentNote {
        id: Uuid::new_v4(),
        doc_id: doc.id,
        file_version: None,
        user_id: actor.id,
        username: actor.username.clone(),
        message: "gone soon".to_string(),
        created_at: Utc::now(),
    };
    h.records.notes.insert(note.id, note);
    let link = DocumentLink {
        id: Uuid::new_v4(),
        tenant_id: h.tenant,
        doc1: doc.id,
        doc2: alias.id,
        link_type: "default".to_string(),
    };
    h.records.links.insert(link.id, link);
    h.coordinator.index(doc.id, None, &audit(&actor)).await.unwrap();

    h.coordinator
        .destroy_document(doc.id, &audit(&actor))
        .await
        .unwrap();

    assert!(!h.records.documents.contains_key(&doc.id));
    assert!(!h.records.documents.contains_key(&alias.id));
    assert!(h.records.live_versions(doc.id).is_empty());
    assert!(h.records.find_links(doc.id).await.unwrap().is_empty());
    assert!(
        h.records
            .notes
            .iter()
            .all(|n| n.doc_id != doc.id)
    );
    assert!(!h.index.hits.contains_key(&doc.id));
    assert!(h.content.resources_of(doc.id).is_empty());
    assert_eq!(h.history.entries_for("destroyed").len(), 1);
}

#[tokio::test]
async fn test_destroy_requires_the_capability() {
    let access = MemoryAccessControl::default();
    let h = harness_with_access(access);
    let actor = Actor::new("marco");
    let doc = h.seed_document("protected.txt", "body", &actor).await;

    let err = h
        .coordinator
        .destroy_document(doc.id, &audit(&actor))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert!(h.records.documents.contains_key(&doc.id));

    h.access.allow_destroy(actor.id);
    h.coordinator
        .destroy_document(doc.id, &audit(&actor))
        .await
        .unwrap();
    assert!(!h.records.documents.contains_key(&doc.id));
}
