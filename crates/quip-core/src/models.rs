//! Data models for QUIP
//!
//! Defines the core data structures: Category, Snippet, and UserId.
//! Records are fixed-shape; fields that only exist on some backends
//! (`owner_id`, `sort_order`) are explicitly optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suffix appended to the label of a duplicated snippet
pub const COPY_SUFFIX: &str = " (copy)";

/// Maximum length of a label derived from snippet content
const DERIVED_LABEL_LEN: usize = 40;

/// Stable identifier for one user; every category and snippet is scoped to one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random user id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A named group of snippets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user; absent when the backend scopes storage per owner implicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    /// Display name
    pub name: String,
    /// Explicit display position, unique per owner; absent in older stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    /// When this category was created (stable ordering tie-break)
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category with the given name
    pub fn new(owner_id: Option<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            sort_order: None,
            created_at: Utc::now(),
        }
    }

    /// Set the display position
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Update the display name
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sort key for display ordering
    ///
    /// Orders by explicit position with missing positions last, then by
    /// creation time. Stable sorts preserve load order for full ties.
    pub fn display_key(&self) -> (bool, i64, DateTime<Utc>) {
        (
            self.sort_order.is_none(),
            self.sort_order.unwrap_or(0),
            self.created_at,
        )
    }
}

/// A reusable block of text belonging to one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user; absent when the backend scopes storage per owner implicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    /// Category this snippet belongs to
    pub category_id: Uuid,
    /// Short display string (truncated in presentation, never in storage)
    pub label: String,
    /// The text copied to the clipboard
    pub content: String,
    /// When this snippet was created
    pub created_at: DateTime<Utc>,
    /// When this snippet was last edited
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// Create a new snippet in the given category
    pub fn new(
        owner_id: Option<UserId>,
        category_id: Uuid,
        label: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            category_id,
            label: label.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the label
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
        self.updated_at = Utc::now();
    }

    /// Update the content
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.updated_at = Utc::now();
    }

    /// Label for a duplicate of this snippet
    pub fn copy_label(&self) -> String {
        format!("{}{}", self.label, COPY_SUFFIX)
    }

    /// Derive a label from content, for snippets saved without one
    ///
    /// Takes the first non-blank line (content may start with blank lines),
    /// truncated on a character boundary. The input is expected to hold some
    /// text (blank content is rejected before this point).
    pub fn derive_label(content: &str) -> String {
        let line = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");
        line.chars().take(DERIVED_LABEL_LEN).collect()
    }
}
