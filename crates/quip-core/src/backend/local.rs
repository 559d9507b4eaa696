//! Local filesystem backend
//!
//! Stores one JSON document per owner under `{data_dir}/store/{owner}.json`.
//! Writes are atomic (write to temp file, then rename) so a document is never
//! left half-written.
//!
//! Records in local documents carry no `owner_id`; the filename scopes them.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::{Backend, CategoryPatch, NewSnippet, SnippetPatch};
use crate::config::Config;
use crate::models::{Category, Snippet, UserId};

/// All records belonging to one owner
#[derive(Debug, Default, Serialize, Deserialize)]
struct OwnerDocument {
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    snippets: Vec<Snippet>,
}

/// Backend that keeps each owner's records in one JSON file
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the backend at the configured store directory
    ///
    /// Creates the directory if needed. Failure to create it is reported as a
    /// provisioning error so callers can show setup instructions.
    pub fn open(config: &Config) -> BackendResult<Self> {
        let root = config.store_dir();
        fs::create_dir_all(&root).map_err(|e| BackendError::NotProvisioned {
            detail: format!("cannot create store directory {:?}: {}", root, e),
        })?;
        Ok(Self::new(root))
    }

    /// Path of one owner's document
    fn document_path(&self, owner: UserId) -> PathBuf {
        self.root.join(format!("{}.json", owner))
    }

    /// Read one owner's document, or an empty one if none exists yet
    fn load_document(&self, owner: UserId) -> BackendResult<OwnerDocument> {
        let path = self.document_path(owner);
        if !path.exists() {
            return Ok(OwnerDocument::default());
        }

        let content =
            fs::read_to_string(&path).map_err(|e| BackendError::read(path.clone(), e))?;
        serde_json::from_str(&content).map_err(|e| BackendError::InvalidDocument {
            path,
            detail: e.to_string(),
        })
    }

    /// Write one owner's document atomically
    fn save_document(&self, owner: UserId, doc: &OwnerDocument) -> BackendResult<()> {
        let path = self.document_path(owner);
        let content = serde_json::to_vec_pretty(doc)?;
        atomic_write(&path, &content)
    }

    /// Next free sort position in a document
    fn next_sort_order(doc: &OwnerDocument) -> i64 {
        doc.categories
            .iter()
            .filter_map(|c| c.sort_order)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn list_categories(&self, owner: UserId) -> BackendResult<Vec<Category>> {
        let mut categories = self.load_document(owner)?.categories;
        categories.sort_by_key(Category::display_key);
        Ok(categories)
    }

    async fn insert_categories(
        &self,
        owner: UserId,
        names: &[String],
    ) -> BackendResult<Vec<Category>> {
        let mut doc = self.load_document(owner)?;
        let start = Self::next_sort_order(&doc);

        let created: Vec<Category> = names
            .iter()
            .enumerate()
            .map(|(i, name)| Category::new(None, name.clone()).with_sort_order(start + i as i64))
            .collect();

        doc.categories.extend(created.iter().cloned());
        self.save_document(owner, &doc)?;
        Ok(created)
    }

    async fn update_category(
        &self,
        owner: UserId,
        id: Uuid,
        patch: CategoryPatch,
    ) -> BackendResult<Category> {
        let mut doc = self.load_document(owner)?;
        let category = doc
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
        let updated = category.clone();

        self.save_document(owner, &doc)?;
        Ok(updated)
    }

    async fn delete_category(&self, owner: UserId, id: Uuid) -> BackendResult<()> {
        let mut doc = self.load_document(owner)?;
        let before = doc.categories.len();
        doc.categories.retain(|c| c.id != id);
        if doc.categories.len() == before {
            return Err(BackendError::NotFound {
                entity: "category",
                id,
            });
        }
        self.save_document(owner, &doc)
    }

    async fn reorder_categories(
        &self,
        owner: UserId,
        positions: [(Uuid, i64); 2],
    ) -> BackendResult<()> {
        let mut doc = self.load_document(owner)?;
        for (id, sort_order) in positions {
            let category = doc
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(BackendError::NotFound {
                    entity: "category",
                    id,
                })?;
            category.sort_order = Some(sort_order);
        }
        // One write covers both rows, so a reorder never lands half-applied
        self.save_document(owner, &doc)
    }

    async fn list_snippets(&self, owner: UserId) -> BackendResult<Vec<Snippet>> {
        Ok(self.load_document(owner)?.snippets)
    }

    async fn insert_snippet(&self, owner: UserId, new: NewSnippet) -> BackendResult<Snippet> {
        let mut doc = self.load_document(owner)?;
        let snippet = Snippet::new(None, new.category_id, new.label, new.content);
        doc.snippets.push(snippet.clone());
        self.save_document(owner, &doc)?;
        Ok(snippet)
    }

    async fn update_snippet(
        &self,
        owner: UserId,
        id: Uuid,
        patch: SnippetPatch,
    ) -> BackendResult<Snippet> {
        let mut doc = self.load_document(owner)?;
        let snippet = doc
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
        let updated = snippet.clone();

        self.save_document(owner, &doc)?;
        Ok(updated)
    }

    async fn delete_snippet(&self, owner: UserId, id: Uuid) -> BackendResult<()> {
        let mut doc = self.load_document(owner)?;
        let before = doc.snippets.len();
        doc.snippets.retain(|s| s.id != id);
        if doc.snippets.len() == before {
            return Err(BackendError::NotFound {
                entity: "snippet",
                id,
            });
        }
        self.save_document(owner, &doc)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> BackendResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BackendError::write(parent, e))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| BackendError::write(temp_path.clone(), e))?;
    file.write_all(data)
        .map_err(|e| BackendError::write(temp_path.clone(), e))?;
    file.sync_all()
        .map_err(|e| BackendError::write(temp_path.clone(), e))?;

    fs::rename(&temp_path, path).map_err(|e| BackendError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_backend(temp_dir: &TempDir) -> LocalBackend {
        LocalBackend::new(temp_dir.path())
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        assert!(backend.list_categories(owner).await.unwrap().is_empty());
        assert!(backend.list_snippets(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_categories_assigns_consecutive_positions() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        let names: Vec<String> = ["Greetings", "Payment"].iter().map(|s| s.to_string()).collect();
        let created = backend.insert_categories(owner, &names).await.unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].sort_order, Some(0));
        assert_eq!(created[1].sort_order, Some(1));

        // Later inserts continue after the current maximum
        let more = backend
            .insert_categories(owner, &["Closing".to_string()])
            .await
            .unwrap();
        assert_eq!(more[0].sort_order, Some(2));
    }

    #[tokio::test]
    async fn test_records_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let owner = UserId::generate();

        {
            let backend = test_backend(&temp_dir);
            backend
                .insert_categories(owner, &["Greetings".to_string()])
                .await
                .unwrap();
        }

        let backend = test_backend(&temp_dir);
        let categories = backend.list_categories(owner).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Greetings");
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let alice = UserId::generate();
        let bob = UserId::generate();

        backend
            .insert_categories(alice, &["Greetings".to_string()])
            .await
            .unwrap();

        assert_eq!(backend.list_categories(alice).await.unwrap().len(), 1);
        assert!(backend.list_categories(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_category() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        let created = backend
            .insert_categories(owner, &["Old".to_string()])
            .await
            .unwrap();

        let updated = backend
            .update_category(owner, created[0].id, CategoryPatch::rename("New"))
            .await
            .unwrap();
        assert_eq!(updated.name, "New");

        let listed = backend.list_categories(owner).await.unwrap();
        assert_eq!(listed[0].name, "New");
    }

    #[tokio::test]
    async fn test_update_missing_category() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        let result = backend
            .update_category(owner, Uuid::new_v4(), CategoryPatch::rename("X"))
            .await;
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_category_leaves_snippets() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        let created = backend
            .insert_categories(owner, &["Greetings".to_string()])
            .await
            .unwrap();
        backend
            .insert_snippet(
                owner,
                NewSnippet {
                    category_id: created[0].id,
                    label: "Hello".to_string(),
                    content: "Hi there!".to_string(),
                },
            )
            .await
            .unwrap();

        // Row deletes are independent; orphan cleanup is the caller's job
        backend.delete_category(owner, created[0].id).await.unwrap();
        assert!(backend.list_categories(owner).await.unwrap().is_empty());
        assert_eq!(backend.list_snippets(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reorder_categories() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        let names: Vec<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
        let created = backend.insert_categories(owner, &names).await.unwrap();

        backend
            .reorder_categories(owner, [(created[0].id, 1), (created[1].id, 0)])
            .await
            .unwrap();

        let listed = backend.list_categories(owner).await.unwrap();
        // list_categories returns display order, so B now comes first
        assert_eq!(listed[0].name, "B");
        assert_eq!(listed[0].sort_order, Some(0));
        assert_eq!(listed[1].name, "A");
        assert_eq!(listed[1].sort_order, Some(1));
    }

    #[tokio::test]
    async fn test_snippet_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        let created = backend
            .insert_categories(owner, &["Greetings".to_string()])
            .await
            .unwrap();

        let snippet = backend
            .insert_snippet(
                owner,
                NewSnippet {
                    category_id: created[0].id,
                    label: "Hello".to_string(),
                    content: "Hi there!".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(snippet.label, "Hello");

        let updated = backend
            .update_snippet(
                owner,
                snippet.id,
                SnippetPatch {
                    content: Some("Hi!".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "Hi!");
        assert_eq!(updated.label, "Hello");

        backend.delete_snippet(owner, snippet.id).await.unwrap();
        assert!(backend.list_snippets(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_reported() {
        let temp_dir = TempDir::new().unwrap();
        let backend = test_backend(&temp_dir);
        let owner = UserId::generate();

        fs::write(backend.document_path(owner), "not json").unwrap();

        let result = backend.list_categories(owner).await;
        assert!(matches!(result, Err(BackendError::InvalidDocument { .. })));
    }

    #[tokio::test]
    async fn test_open_creates_store_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        let backend = LocalBackend::open(&config).unwrap();
        assert!(config.store_dir().exists());

        let owner = UserId::generate();
        backend
            .insert_categories(owner, &["Greetings".to_string()])
            .await
            .unwrap();
        assert!(config.store_dir().join(format!("{}.json", owner)).exists());
    }
}
