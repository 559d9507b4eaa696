//! Storage backends
//!
//! Every backend exposes the same contract: list, insert, update, and delete
//! for categories and snippets, scoped to one owner per call.
//!
//! ## Architecture
//!
//! - **Local**: one JSON document per owner under the data directory
//! - **Remote**: hosted PostgREST endpoint, one row per record
//! - **Memory**: in-process store for tests, with failure injection
//!
//! A write is confirmed only when the backend call returns Ok. Callers keep
//! their in-memory state untouched until then.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Category, Snippet, UserId};

pub mod error;
pub mod local;
pub mod memory;
pub mod remote;

pub use error::{BackendError, BackendResult};
pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use remote::RemoteBackend;

/// Fields of a category that can change after creation
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    /// New display name
    pub name: Option<String>,
    /// New display position
    pub sort_order: Option<i64>,
}

impl CategoryPatch {
    /// Patch that only renames
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            sort_order: None,
        }
    }

    /// Patch that only repositions
    pub fn reposition(sort_order: i64) -> Self {
        Self {
            name: None,
            sort_order: Some(sort_order),
        }
    }
}

/// Fields of a snippet that can change after creation
///
/// `category_id` is deliberately absent: snippets never move between
/// categories.
#[derive(Debug, Clone, Default)]
pub struct SnippetPatch {
    /// New label
    pub label: Option<String>,
    /// New content
    pub content: Option<String>,
    /// Edit timestamp recorded alongside the change
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating one snippet
#[derive(Debug, Clone)]
pub struct NewSnippet {
    /// Category the snippet belongs to
    pub category_id: Uuid,
    /// Display label
    pub label: String,
    /// Snippet text
    pub content: String,
}

/// Uniform storage contract for categories and snippets
///
/// Implementations assign ids, timestamps, and sort positions on insert and
/// return the stored records so callers never guess at server-side values.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs ("local", "remote", "memory")
    fn kind(&self) -> &'static str;

    /// Fetch all categories for one owner
    ///
    /// Ordered by sort position with missing positions last, then by
    /// creation time.
    async fn list_categories(&self, owner: UserId) -> BackendResult<Vec<Category>>;

    /// Create several categories in one call, in the given order
    ///
    /// Assigns consecutive sort positions after the owner's current maximum.
    /// Returns the stored records in insertion order.
    async fn insert_categories(
        &self,
        owner: UserId,
        names: &[String],
    ) -> BackendResult<Vec<Category>>;

    /// Apply a patch to one category and return the stored record
    async fn update_category(
        &self,
        owner: UserId,
        id: Uuid,
        patch: CategoryPatch,
    ) -> BackendResult<Category>;

    /// Delete one category row
    ///
    /// Does not touch the category's snippets; callers delete those first.
    async fn delete_category(&self, owner: UserId, id: Uuid) -> BackendResult<()>;

    /// Persist new sort positions for two categories as one operation
    ///
    /// Backends that cannot write both rows atomically report a stop partway
    /// as [`BackendError::PartialWrite`], with earlier rows already persisted.
    async fn reorder_categories(
        &self,
        owner: UserId,
        positions: [(Uuid, i64); 2],
    ) -> BackendResult<()>;

    /// Fetch all snippets for one owner, across all categories
    async fn list_snippets(&self, owner: UserId) -> BackendResult<Vec<Snippet>>;

    /// Create one snippet and return the stored record
    async fn insert_snippet(&self, owner: UserId, new: NewSnippet) -> BackendResult<Snippet>;

    /// Apply a patch to one snippet and return the stored record
    async fn update_snippet(
        &self,
        owner: UserId,
        id: Uuid,
        patch: SnippetPatch,
    ) -> BackendResult<Snippet>;

    /// Delete one snippet
    async fn delete_snippet(&self, owner: UserId, id: Uuid) -> BackendResult<()>;
}
