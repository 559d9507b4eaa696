//! In-memory backend
//!
//! Keeps every owner's records in process memory. Used by tests and available
//! anywhere a throwaway store is useful. Supports single-shot failure
//! injection so callers can exercise their error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::{Backend, CategoryPatch, NewSnippet, SnippetPatch};
use crate::models::{Category, Snippet, UserId};

#[derive(Debug, Default)]
struct OwnerState {
    categories: Vec<Category>,
    snippets: Vec<Snippet>,
}

/// Backend that stores everything in memory
///
/// Fault flags are single-shot: they trip the next matching operation and
/// clear themselves. `set_unprovisioned` is persistent until unset.
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<HashMap<UserId, OwnerState>>,
    fail_next_read: AtomicBool,
    fail_next_write: AtomicBool,
    partial_reorder: AtomicBool,
    unprovisioned: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next read operation fail
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Make the next write operation fail
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Make the next reorder persist its first row, then fail
    pub fn fail_reorder_partially(&self) {
        self.partial_reorder.store(true, Ordering::SeqCst);
    }

    /// Make every operation report missing storage until turned off
    pub fn set_unprovisioned(&self, on: bool) {
        self.unprovisioned.store(on, Ordering::SeqCst);
    }

    fn check_provisioned(&self) -> BackendResult<()> {
        if self.unprovisioned.load(Ordering::SeqCst) {
            return Err(BackendError::NotProvisioned {
                detail: "memory store marked unprovisioned".to_string(),
            });
        }
        Ok(())
    }

    fn check_read(&self) -> BackendResult<()> {
        self.check_provisioned()?;
        if self.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }

    fn check_write(&self) -> BackendResult<()> {
        self.check_provisioned()?;
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

fn injected_failure() -> BackendError {
    BackendError::Http {
        status: 500,
        message: "injected failure".to_string(),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn list_categories(&self, owner: UserId) -> BackendResult<Vec<Category>> {
        self.check_read()?;
        let state = self.state.read().unwrap();
        let mut categories = state
            .get(&owner)
            .map(|s| s.categories.clone())
            .unwrap_or_default();
        categories.sort_by_key(Category::display_key);
        Ok(categories)
    }

    async fn insert_categories(
        &self,
        owner: UserId,
        names: &[String],
    ) -> BackendResult<Vec<Category>> {
        self.check_write()?;
        let mut state = self.state.write().unwrap();
        let owner_state = state.entry(owner).or_default();

        let start = owner_state
            .categories
            .iter()
            .filter_map(|c| c.sort_order)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);

        let created: Vec<Category> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Category::new(Some(owner), name.clone()).with_sort_order(start + i as i64)
            })
            .collect();

        owner_state.categories.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_category(
        &self,
        owner: UserId,
        id: Uuid,
        patch: CategoryPatch,
    ) -> BackendResult<Category> {
        self.check_write()?;
        let mut state = self.state.write().unwrap();
        let owner_state = state.entry(owner).or_default();

        let category = owner_state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(BackendError::NotFound {
                entity: "category",
                id,
            })?;

        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(sort_order) = patch.sort_order {
            category.sort_order = Some(sort_order);
        }
        Ok(category.clone())
    }

    async fn delete_category(&self, owner: UserId, id: Uuid) -> BackendResult<()> {
        self.check_write()?;
        let mut state = self.state.write().unwrap();
        let owner_state = state.entry(owner).or_default();

        let before = owner_state.categories.len();
        owner_state.categories.retain(|c| c.id != id);
        if owner_state.categories.len() == before {
            return Err(BackendError::NotFound {
                entity: "category",
                id,
            });
        }
        Ok(())
    }

    async fn reorder_categories(
        &self,
        owner: UserId,
        positions: [(Uuid, i64); 2],
    ) -> BackendResult<()> {
        self.check_write()?;
        let partial = self.partial_reorder.swap(false, Ordering::SeqCst);

        let mut state = self.state.write().unwrap();
        let owner_state = state.entry(owner).or_default();

        for (applied, (id, sort_order)) in positions.into_iter().enumerate() {
            if partial && applied == 1 {
                return Err(BackendError::PartialWrite {
                    completed: applied,
                    total: 2,
                });
            }
            let category = owner_state
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(BackendError::NotFound {
                    entity: "category",
                    id,
                })?;
            category.sort_order = Some(sort_order);
        }
        Ok(())
    }

    async fn list_snippets(&self, owner: UserId) -> BackendResult<Vec<Snippet>> {
        self.check_read()?;
        let state = self.state.read().unwrap();
        Ok(state
            .get(&owner)
            .map(|s| s.snippets.clone())
            .unwrap_or_default())
    }

    async fn insert_snippet(&self, owner: UserId, new: NewSnippet) -> BackendResult<Snippet> {
        self.check_write()?;
        let mut state = self.state.write().unwrap();
        let owner_state = state.entry(owner).or_default();

        let snippet = Snippet::new(Some(owner), new.category_id, new.label, new.content);
        owner_state.snippets.push(snippet.clone());
        Ok(snippet)
    }

    async fn update_snippet(
        &self,
        owner: UserId,
        id: Uuid,
        patch: SnippetPatch,
    ) -> BackendResult<Snippet> {
        self.check_write()?;
        let mut state = self.state.write().unwrap();
        let owner_state = state.entry(owner).or_default();

        let snippet = owner_state
            .snippets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(BackendError::NotFound {
                entity: "snippet",
                id,
            })?;

        if let Some(label) = patch.label {
            snippet.label = label;
        }
        if let Some(content) = patch.content {
            snippet.content = content;
        }
        snippet.updated_at = patch.updated_at.unwrap_or_else(Utc::now);
        Ok(snippet.clone())
    }

    async fn delete_snippet(&self, owner: UserId, id: Uuid) -> BackendResult<()> {
        self.check_write()?;
        let mut state = self.state.write().unwrap();
        let owner_state = state.entry(owner).or_default();

        let before = owner_state.snippets.len();
        owner_state.snippets.retain(|s| s.id != id);
        if owner_state.snippets.len() == before {
            return Err(BackendError::NotFound {
                entity: "snippet",
                id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let backend = MemoryBackend::new();
        let owner = UserId::generate();

        let created = backend
            .insert_categories(owner, &names(&["Greetings", "Payment"]))
            .await
            .unwrap();
        assert_eq!(created[0].sort_order, Some(0));
        assert_eq!(created[1].sort_order, Some(1));

        let listed = backend.list_categories(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_next_write_is_single_shot() {
        let backend = MemoryBackend::new();
        let owner = UserId::generate();

        backend.fail_next_write();
        let result = backend.insert_categories(owner, &names(&["A"])).await;
        assert!(result.is_err());

        // Flag cleared, next write succeeds
        backend.insert_categories(owner, &names(&["A"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_fail_next_read() {
        let backend = MemoryBackend::new();
        let owner = UserId::generate();

        backend.fail_next_read();
        assert!(backend.list_categories(owner).await.is_err());
        assert!(backend.list_categories(owner).await.is_ok());
    }

    #[tokio::test]
    async fn test_partial_reorder_keeps_first_row() {
        let backend = MemoryBackend::new();
        let owner = UserId::generate();
        let created = backend
            .insert_categories(owner, &names(&["A", "B"]))
            .await
            .unwrap();

        backend.fail_reorder_partially();
        let result = backend
            .reorder_categories(owner, [(created[0].id, 1), (created[1].id, 0)])
            .await;
        assert!(matches!(
            result,
            Err(BackendError::PartialWrite {
                completed: 1,
                total: 2
            })
        ));

        // First row persisted, second untouched at its insert-time position
        let listed = backend.list_categories(owner).await.unwrap();
        let a = listed.iter().find(|c| c.name == "A").unwrap();
        let b = listed.iter().find(|c| c.name == "B").unwrap();
        assert_eq!(a.sort_order, Some(1));
        assert_eq!(b.sort_order, Some(1));
    }

    #[tokio::test]
    async fn test_unprovisioned_mode() {
        let backend = MemoryBackend::new();
        let owner = UserId::generate();

        backend.set_unprovisioned(true);
        let err = backend.list_categories(owner).await.unwrap_err();
        assert!(err.is_provisioning());

        backend.set_unprovisioned(false);
        assert!(backend.list_categories(owner).await.is_ok());
    }

    #[tokio::test]
    async fn test_snippet_update_bumps_timestamp() {
        let backend = MemoryBackend::new();
        let owner = UserId::generate();
        let created = backend
            .insert_categories(owner, &names(&["A"]))
            .await
            .unwrap();

        let snippet = backend
            .insert_snippet(
                owner,
                NewSnippet {
                    category_id: created[0].id,
                    label: "Hello".to_string(),
                    content: "Hi".to_string(),
                },
            )
            .await
            .unwrap();

        let later = Utc::now() + chrono::Duration::seconds(5);
        let updated = backend
            .update_snippet(
                owner,
                snippet.id,
                SnippetPatch {
                    content: Some("Hey".to_string()),
                    updated_at: Some(later),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.updated_at, later);
        assert!(updated.updated_at > snippet.updated_at);
    }
}
