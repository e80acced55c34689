//! Checkin listener hooks.

use std::collections::HashMap;

use async_trait::async_trait;

use docvault_core::result::AppResult;
use docvault_entity::document::Document;

use crate::context::AuditContext;

/// Mutable side channel shared by the listeners of one checkin. Whatever
/// the before-hooks put here is visible to the after-hooks.
pub type SideChannel = HashMap<String, serde_json::Value>;

/// Hooks invoked synchronously around checkin. Any error propagates and
/// fails the operation.
#[async_trait]
pub trait LifecycleListener: Send + Sync + 'static {
    /// Invoked after validation, before the new content is committed.
    async fn before_checkin(
        &self,
        document: &mut Document,
        audit: &AuditContext,
        side_channel: &mut SideChannel,
    ) -> AppResult<()>;

    /// Invoked after the new content has been committed.
    async fn after_checkin(
        &self,
        document: &mut Document,
        audit: &AuditContext,
        side_channel: &mut SideChannel,
    ) -> AppResult<()>;
}
