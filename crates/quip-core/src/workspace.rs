//! Collection state management
//!
//! The `Workspace` owns the in-memory categories and snippets for exactly one
//! signed-in user and coordinates between:
//! - the backend (source of truth across sessions)
//! - the selection and query state driving the visible snippet list
//!
//! ## Write discipline
//!
//! Every mutation goes to the backend first and is applied in memory only
//! after the backend confirms it. A failed write leaves the collections
//! exactly as they were; the error is queued as a notice and the user can
//! retry. The one exception is a partially-applied reorder, where memory
//! keeps the swapped order because the server holds half of it (see
//! [`Workspace::move_category`]).
//!
//! ## Usage
//!
//! ```ignore
//! let mut workspace = Workspace::new(backend);
//! workspace.load_for_user(user).await?;   // Bootstraps first-time users
//!
//! workspace.add_snippet(Some("Welcome"), "Hi there!").await?;
//! let visible = workspace.visible_snippets();
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{Backend, BackendError, CategoryPatch, NewSnippet, SnippetPatch};
use crate::bootstrap;
use crate::identity::SessionUser;
use crate::models::{Category, Snippet, UserId};
use crate::notify::Notice;
use crate::search;

/// Errors returned by workspace commands
///
/// Backend failures are wrapped, never swallowed; validation failures never
/// reach the backend.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Input rejected before any backend call
    #[error("{0}")]
    Validation(String),

    /// No user is signed in
    #[error("No user is signed in")]
    NoSession,

    /// The command needs an active category and none is selected
    #[error("No category is selected")]
    NoActiveCategory,

    /// Referenced category is not in the loaded collection
    #[error("Category not found: {0}")]
    UnknownCategory(Uuid),

    /// Referenced snippet is not in the loaded collection
    #[error("Snippet not found: {0}")]
    UnknownSnippet(Uuid),

    /// The backend rejected or failed the write
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Which way to move a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// What a finished load did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Collections now reflect the backend
    Loaded {
        /// Whether default data was created for a first-time user
        bootstrapped: bool,
    },
    /// A newer session transition superseded this load; nothing was applied
    Superseded,
    /// The session ended and the collections were cleared
    Unloaded,
}

/// Token for an in-flight load
///
/// Produced by [`Workspace::begin_load`] and consumed by
/// [`Workspace::commit_load`]. Carries the load generation so results from a
/// superseded load are discarded instead of clobbering newer state.
#[derive(Debug)]
pub struct PendingLoad {
    generation: u64,
    user: SessionUser,
}

impl PendingLoad {
    /// The user this load is fetching for
    pub fn user(&self) -> &SessionUser {
        &self.user
    }
}

/// Collections fetched from the backend, ready to commit
#[derive(Debug, Default)]
pub struct LoadedCollections {
    pub categories: Vec<Category>,
    pub snippets: Vec<Snippet>,
    /// Whether the fetch created default data for a first-time user
    pub bootstrapped: bool,
}

/// Fetch one user's full collections, seeding defaults on first use
///
/// A user with zero categories gets the bootstrap set; the created records
/// are returned directly so no second fetch is needed.
pub async fn fetch_collections(
    backend: &dyn Backend,
    user: &SessionUser,
) -> Result<LoadedCollections, BackendError> {
    let categories = backend.list_categories(user.id).await?;
    if categories.is_empty() {
        info!(user = %user.email, "no categories found, seeding defaults");
        let (categories, snippets) = bootstrap::seed(backend, user.id).await?;
        return Ok(LoadedCollections {
            categories,
            snippets,
            bootstrapped: true,
        });
    }

    let snippets = backend.list_snippets(user.id).await?;
    Ok(LoadedCollections {
        categories,
        snippets,
        bootstrapped: false,
    })
}

/// In-memory collection state for one user at a time
///
/// Commands take `&mut self`, so mutations are serialized by construction.
/// Shells that overlap loads (a second sign-in while a fetch is in flight)
/// use the `begin_load`/`commit_load` pair; the generation guard drops the
/// stale result.
pub struct Workspace {
    backend: Arc<dyn Backend>,
    session: Option<SessionUser>,
    categories: Vec<Category>,
    snippets: Vec<Snippet>,
    selected: Option<Uuid>,
    query: String,
    notices: Vec<Notice>,
    load_generation: u64,
}

impl Workspace {
    /// Create an empty workspace on the given backend
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            session: None,
            categories: Vec::new(),
            snippets: Vec::new(),
            selected: None,
            query: String::new(),
            notices: Vec::new(),
            load_generation: 0,
        }
    }

    // ==================== Session Lifecycle ====================

    /// Start a load for a user, clearing current state
    ///
    /// Returns a token that [`commit_load`](Self::commit_load) checks against
    /// the current generation. Any later `begin_load` or `unload` supersedes
    /// this token.
    pub fn begin_load(&mut self, user: SessionUser) -> PendingLoad {
        self.load_generation += 1;
        self.session = Some(user.clone());
        self.categories.clear();
        self.snippets.clear();
        self.selected = None;
        self.query.clear();
        debug!(generation = self.load_generation, user = %user.email, "load started");
        PendingLoad {
            generation: self.load_generation,
            user,
        }
    }

    /// Adopt fetched collections if the load is still current
    ///
    /// Returns false (and changes nothing) when a newer session transition
    /// superseded the pending load. On success the ordering is normalized and
    /// the first category becomes the selection.
    pub fn commit_load(&mut self, pending: PendingLoad, loaded: LoadedCollections) -> bool {
        if pending.generation != self.load_generation {
            debug!(
                stale = pending.generation,
                current = self.load_generation,
                "discarding superseded load"
            );
            return false;
        }

        self.categories = loaded.categories;
        self.snippets = loaded.snippets;
        normalize_order(&mut self.categories);
        self.selected = self.categories.first().map(|c| c.id);
        info!(
            categories = self.categories.len(),
            snippets = self.snippets.len(),
            "collections loaded"
        );
        true
    }

    /// Load (or bootstrap) one user's collections
    ///
    /// On any fetch error the collections stay empty and an error notice is
    /// queued; the caller can retry by loading again.
    pub async fn load_for_user(&mut self, user: SessionUser) -> Result<LoadOutcome, BackendError> {
        let pending = self.begin_load(user);
        let result = fetch_collections(self.backend.as_ref(), pending.user()).await;
        match result {
            Ok(loaded) => {
                let bootstrapped = loaded.bootstrapped;
                if self.commit_load(pending, loaded) {
                    if bootstrapped {
                        self.notices
                            .push(Notice::info("Created your starter categories"));
                    }
                    Ok(LoadOutcome::Loaded { bootstrapped })
                } else {
                    Ok(LoadOutcome::Superseded)
                }
            }
            Err(err) => {
                warn!(%err, "load failed");
                if err.is_provisioning() {
                    self.notices.push(Notice::error(err.to_string()));
                } else {
                    self.notices
                        .push(Notice::error(format!("Could not load your snippets: {}", err)));
                }
                Err(err)
            }
        }
    }

    /// Clear all session state
    ///
    /// Supersedes any in-flight load. Safe to call when already empty.
    pub fn unload(&mut self) {
        self.load_generation += 1;
        self.session = None;
        self.categories.clear();
        self.snippets.clear();
        self.selected = None;
        self.query.clear();
        self.notices.clear();
        debug!("workspace unloaded");
    }

    /// React to a session change from the identity provider
    pub async fn session_changed(
        &mut self,
        session: Option<SessionUser>,
    ) -> Result<LoadOutcome, BackendError> {
        match session {
            Some(user) => self.load_for_user(user).await,
            None => {
                self.unload();
                Ok(LoadOutcome::Unloaded)
            }
        }
    }

    // ==================== Views ====================

    /// The signed-in user this workspace holds data for
    pub fn session(&self) -> Option<&SessionUser> {
        self.session.as_ref()
    }

    /// All categories, in display order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// All snippets, across categories
    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    /// The active category, if any
    pub fn selected_category(&self) -> Option<&Category> {
        self.selected.and_then(|id| self.find_category(id))
    }

    /// Make a category the active selection
    pub fn select_category(&mut self, id: Uuid) -> Result<(), CommandError> {
        if self.find_category(id).is_none() {
            return Err(CommandError::UnknownCategory(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    /// The current search query
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Set the search query
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Snippets in the active category matching the current query
    pub fn visible_snippets(&self) -> Vec<&Snippet> {
        search::filter_snippets(&self.snippets, self.selected, &self.query)
    }

    /// Look up a category by id
    pub fn find_category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Look up a snippet by id
    pub fn find_snippet(&self, id: Uuid) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    /// Drain queued notices for the presentation layer
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ==================== Category Commands ====================

    /// Add a category and make it the active selection
    pub async fn add_category(&mut self, name: &str) -> Result<Category, CommandError> {
        let owner = self.require_session()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(self.rejected("Category name cannot be empty"));
        }

        let names = vec![name.to_string()];
        let result = self.backend.insert_categories(owner, &names).await;
        let mut created = match result {
            Ok(rows) => rows,
            Err(err) => return Err(self.backend_failure("add category", err)),
        };
        let Some(category) = created.pop() else {
            return Err(self.backend_failure(
                "add category",
                BackendError::Unexpected {
                    detail: "insert returned no rows".to_string(),
                },
            ));
        };

        self.categories.push(category.clone());
        self.selected = Some(category.id);
        self.notices
            .push(Notice::success(format!("Added category '{}'", category.name)));
        Ok(category)
    }

    /// Rename a category
    pub async fn rename_category(
        &mut self,
        id: Uuid,
        name: &str,
    ) -> Result<Category, CommandError> {
        let owner = self.require_session()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(self.rejected("Category name cannot be empty"));
        }
        let index = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(CommandError::UnknownCategory(id))?;

        let result = self
            .backend
            .update_category(owner, id, CategoryPatch::rename(name))
            .await;
        let stored = match result {
            Ok(row) => row,
            Err(err) => return Err(self.backend_failure("rename category", err)),
        };

        self.categories[index] = stored.clone();
        self.notices
            .push(Notice::success(format!("Renamed category to '{}'", stored.name)));
        Ok(stored)
    }

    /// Delete a category and every snippet in it
    ///
    /// The backend holds no cascade; snippets are deleted row by row first,
    /// then the category. Memory is only touched after all deletes succeed,
    /// so a mid-cascade failure leaves the loaded collections intact (some
    /// backend rows may already be gone; a reload reconciles).
    pub async fn delete_category(&mut self, id: Uuid) -> Result<(), CommandError> {
        let owner = self.require_session()?;
        let category = self
            .find_category(id)
            .ok_or(CommandError::UnknownCategory(id))?;
        let name = category.name.clone();
        let snippet_ids: Vec<Uuid> = self
            .snippets
            .iter()
            .filter(|s| s.category_id == id)
            .map(|s| s.id)
            .collect();

        for snippet_id in &snippet_ids {
            let result = self.backend.delete_snippet(owner, *snippet_id).await;
            if let Err(err) = result {
                return Err(self.backend_failure("delete category", err));
            }
        }
        let result = self.backend.delete_category(owner, id).await;
        if let Err(err) = result {
            return Err(self.backend_failure("delete category", err));
        }

        self.snippets.retain(|s| s.category_id != id);
        self.categories.retain(|c| c.id != id);
        if self.selected == Some(id) {
            self.selected = self.categories.first().map(|c| c.id);
        }
        info!(category = %name, snippets = snippet_ids.len(), "category deleted");
        self.notices
            .push(Notice::success(format!("Deleted category '{}'", name)));
        Ok(())
    }

    /// Swap a category with its neighbor in the given direction
    ///
    /// Returns false without touching anything when the category is already
    /// at that end of the list. On a confirmed swap both positions are
    /// applied in memory. When the backend reports a partial write the swap
    /// is kept in memory too, because the server already holds half of it;
    /// an error notice tells the user the stored order may differ.
    pub async fn move_category(
        &mut self,
        id: Uuid,
        direction: Direction,
    ) -> Result<bool, CommandError> {
        let owner = self.require_session()?;
        let index = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(CommandError::UnknownCategory(id))?;

        let neighbor = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => (index + 1 < self.categories.len()).then_some(index + 1),
        };
        let Some(neighbor) = neighbor else {
            return Ok(false);
        };

        let moving = &self.categories[index];
        let other = &self.categories[neighbor];
        // Normalization on load guarantees positions; index is the safety net
        let moving_pos = moving.sort_order.unwrap_or(index as i64);
        let other_pos = other.sort_order.unwrap_or(neighbor as i64);
        let swap = [(moving.id, other_pos), (other.id, moving_pos)];
        let name = moving.name.clone();

        let result = self.backend.reorder_categories(owner, swap).await;
        match result {
            Ok(()) => {
                self.apply_swap(index, neighbor, moving_pos, other_pos);
                self.notices
                    .push(Notice::success(format!("Moved '{}' {}", name, direction)));
                Ok(true)
            }
            Err(err @ BackendError::PartialWrite { .. }) => {
                // The server holds the first row; memory keeps the swapped
                // order so what the user sees matches what mostly happened
                self.apply_swap(index, neighbor, moving_pos, other_pos);
                warn!(%err, category = %name, "reorder partially persisted");
                self.notices.push(Notice::error(
                    "Category order was only partially saved; it may differ after a reload",
                ));
                Err(CommandError::Backend(err))
            }
            Err(err) => Err(self.backend_failure("move category", err)),
        }
    }

    /// Swap two adjacent categories' positions in memory
    fn apply_swap(&mut self, index: usize, neighbor: usize, moving_pos: i64, other_pos: i64) {
        self.categories[index].sort_order = Some(other_pos);
        self.categories[neighbor].sort_order = Some(moving_pos);
        self.categories.swap(index, neighbor);
    }

    // ==================== Snippet Commands ====================

    /// Add a snippet to the active category
    ///
    /// A missing or blank label is derived from the first line of the
    /// content, so stored labels are never empty.
    pub async fn add_snippet(
        &mut self,
        label: Option<&str>,
        content: &str,
    ) -> Result<Snippet, CommandError> {
        let owner = self.require_session()?;
        if content.trim().is_empty() {
            return Err(self.rejected("Snippet content cannot be empty"));
        }
        let category_id = self.selected.ok_or(CommandError::NoActiveCategory)?;

        let label = match label.map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => Snippet::derive_label(content),
        };

        let result = self
            .backend
            .insert_snippet(
                owner,
                NewSnippet {
                    category_id,
                    label,
                    content: content.to_string(),
                },
            )
            .await;
        let stored = match result {
            Ok(row) => row,
            Err(err) => return Err(self.backend_failure("add snippet", err)),
        };

        self.snippets.push(stored.clone());
        self.notices
            .push(Notice::success(format!("Added '{}'", stored.label)));
        Ok(stored)
    }

    /// Edit a snippet's label and/or content
    ///
    /// Never moves the snippet between categories.
    pub async fn edit_snippet(
        &mut self,
        id: Uuid,
        label: Option<&str>,
        content: Option<&str>,
    ) -> Result<Snippet, CommandError> {
        let owner = self.require_session()?;
        let index = self
            .snippets
            .iter()
            .position(|s| s.id == id)
            .ok_or(CommandError::UnknownSnippet(id))?;

        if label.is_none() && content.is_none() {
            return Err(self.rejected("Nothing to change"));
        }
        if let Some(content) = content {
            if content.trim().is_empty() {
                return Err(self.rejected("Snippet content cannot be empty"));
            }
        }
        let label = label.map(|l| {
            let l = l.trim();
            if l.is_empty() {
                // A cleared label falls back to the effective content
                Snippet::derive_label(content.unwrap_or(&self.snippets[index].content))
            } else {
                l.to_string()
            }
        });

        let result = self
            .backend
            .update_snippet(
                owner,
                id,
                SnippetPatch {
                    label,
                    content: content.map(str::to_string),
                    updated_at: Some(chrono::Utc::now()),
                },
            )
            .await;
        let stored = match result {
            Ok(row) => row,
            Err(err) => return Err(self.backend_failure("edit snippet", err)),
        };

        self.snippets[index] = stored.clone();
        self.notices
            .push(Notice::success(format!("Updated '{}'", stored.label)));
        Ok(stored)
    }

    /// Delete a snippet
    pub async fn delete_snippet(&mut self, id: Uuid) -> Result<(), CommandError> {
        let owner = self.require_session()?;
        let snippet = self
            .find_snippet(id)
            .ok_or(CommandError::UnknownSnippet(id))?;
        let label = snippet.label.clone();

        let result = self.backend.delete_snippet(owner, id).await;
        if let Err(err) = result {
            return Err(self.backend_failure("delete snippet", err));
        }

        self.snippets.retain(|s| s.id != id);
        self.notices
            .push(Notice::success(format!("Deleted '{}'", label)));
        Ok(())
    }

    /// Create a copy of a snippet in the same category
    ///
    /// The copy gets a new id, identical content, and the original label
    /// with a copy marker. The original is untouched.
    pub async fn duplicate_snippet(&mut self, id: Uuid) -> Result<Snippet, CommandError> {
        let owner = self.require_session()?;
        let original = self
            .find_snippet(id)
            .ok_or(CommandError::UnknownSnippet(id))?;
        let new = NewSnippet {
            category_id: original.category_id,
            label: original.copy_label(),
            content: original.content.clone(),
        };

        let result = self.backend.insert_snippet(owner, new).await;
        let stored = match result {
            Ok(row) => row,
            Err(err) => return Err(self.backend_failure("duplicate snippet", err)),
        };

        self.snippets.push(stored.clone());
        self.notices
            .push(Notice::success(format!("Duplicated '{}'", stored.label)));
        Ok(stored)
    }

    // ==================== Internals ====================

    /// Owner id of the signed-in user, or `NoSession`
    fn require_session(&self) -> Result<UserId, CommandError> {
        self.session
            .as_ref()
            .map(|u| u.id)
            .ok_or(CommandError::NoSession)
    }

    /// Queue a validation failure notice and build the error
    fn rejected(&mut self, message: &str) -> CommandError {
        self.notices.push(Notice::error(message));
        CommandError::Validation(message.to_string())
    }

    /// Queue a backend failure notice and wrap the error
    fn backend_failure(&mut self, action: &str, err: BackendError) -> CommandError {
        warn!(%err, action, "backend write failed");
        self.notices
            .push(Notice::error(format!("Could not {}: {}", action, err)));
        CommandError::Backend(err)
    }
}

/// Normalize category ordering after a load
///
/// Sorts by explicit position (missing positions last, then creation time;
/// the sort is stable so load order breaks full ties) and assigns the
/// missing positions past the current maximum. In-memory only; positions
/// reach the backend on the next explicit reorder.
fn normalize_order(categories: &mut [Category]) {
    categories.sort_by_key(Category::display_key);
    let mut next = categories
        .iter()
        .filter_map(|c| c.sort_order)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0);
    for category in categories.iter_mut() {
        if category.sort_order.is_none() {
            category.sort_order = Some(next);
            next += 1;
        }
    }
}
