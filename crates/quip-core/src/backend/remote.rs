//! Remote PostgREST backend
//!
//! Talks to a hosted PostgREST endpoint with two tables, `categories` and
//! `snippets`, both carrying an `owner_id` column. Every request filters on
//! the owner; writes ask for `return=representation` so the stored rows come
//! back in the response.
//!
//! The endpoint answering with error code `42P01` (undefined table) or
//! `PGRST205` means the tables were never created. That is surfaced as
//! [`BackendError::NotProvisioned`] so the caller can print setup SQL instead
//! of a raw HTTP failure.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::{Backend, CategoryPatch, NewSnippet, SnippetPatch};
use crate::config::RemoteConfig;
use crate::models::{Category, Snippet, UserId};

/// Request timeout in seconds
const REQUEST_TIMEOUT: u64 = 10;

/// User agent sent with every request
const USER_AGENT: &str = concat!("quip/", env!("CARGO_PKG_VERSION"));

/// PostgREST error codes meaning the table does not exist
const UNDEFINED_TABLE_CODES: &[&str] = &["42P01", "PGRST205"];

/// Backend that stores records behind a PostgREST endpoint
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Error body shape returned by PostgREST
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Projection used when asking for the highest sort position
#[derive(Debug, Deserialize)]
struct SortOrderRow {
    sort_order: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CategoryPatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_order: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SnippetPatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    updated_at: chrono::DateTime<Utc>,
}

impl RemoteBackend {
    /// Create a backend for the given endpoint
    pub fn new(config: &RemoteConfig) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Build a table URL with a query string
    fn table_url(&self, table: &str, query: &str) -> String {
        format!("{}/{}?{}", self.base_url, table, query)
    }

    /// Attach authentication headers to a request
    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Return the response if it succeeded, otherwise classify the error body
    async fn expect_success(response: reqwest::Response) -> BackendResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_error_body(status.as_u16(), &body))
    }

    /// PATCH one category row and return the stored record
    async fn patch_category(
        &self,
        owner: UserId,
        id: Uuid,
        body: &CategoryPatchBody<'_>,
    ) -> BackendResult<Category> {
        let url = self.table_url("categories", &owner_and_id_filter(owner, id));
        let response = self
            .authed(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let rows: Vec<Category> = Self::expect_success(response).await?.json().await?;
        rows.into_iter().next().ok_or(BackendError::NotFound {
            entity: "category",
            id,
        })
    }

    /// Highest sort position currently stored for an owner
    async fn max_sort_order(&self, owner: UserId) -> BackendResult<Option<i64>> {
        let url = self.table_url(
            "categories",
            &format!(
                "owner_id=eq.{}&select=sort_order&order=sort_order.desc.nullslast&limit=1",
                owner
            ),
        );
        let response = self.authed(self.client.get(&url)).send().await?;
        let rows: Vec<SortOrderRow> = Self::expect_success(response).await?.json().await?;
        Ok(rows.into_iter().next().and_then(|r| r.sort_order))
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn kind(&self) -> &'static str {
        "remote"
    }

    async fn list_categories(&self, owner: UserId) -> BackendResult<Vec<Category>> {
        let url = self.table_url(
            "categories",
            &format!(
                "owner_id=eq.{}&select=*&order=sort_order.asc.nullslast,created_at.asc",
                owner
            ),
        );
        let response = self.authed(self.client.get(&url)).send().await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn insert_categories(
        &self,
        owner: UserId,
        names: &[String],
    ) -> BackendResult<Vec<Category>> {
        // Positions continue after the current maximum. A concurrent writer
        // could race this read, but the store is single-writer per owner.
        let start = self.max_sort_order(owner).await?.map_or(0, |max| max + 1);

        let rows: Vec<Category> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Category::new(Some(owner), name.clone()).with_sort_order(start + i as i64)
            })
            .collect();

        let url = self.table_url("categories", "select=*");
        let response = self
            .authed(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        let stored: Vec<Category> = Self::expect_success(response).await?.json().await?;

        if stored.len() != names.len() {
            return Err(BackendError::Unexpected {
                detail: format!("inserted {} categories, got {} back", names.len(), stored.len()),
            });
        }
        Ok(stored)
    }

    async fn update_category(
        &self,
        owner: UserId,
        id: Uuid,
        patch: CategoryPatch,
    ) -> BackendResult<Category> {
        let body = CategoryPatchBody {
            name: patch.name.as_deref(),
            sort_order: patch.sort_order,
        };
        self.patch_category(owner, id, &body).await
    }

    async fn delete_category(&self, owner: UserId, id: Uuid) -> BackendResult<()> {
        let url = self.table_url("categories", &owner_and_id_filter(owner, id));
        let response = self
            .authed(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Category> = Self::expect_success(response).await?.json().await?;
        if rows.is_empty() {
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
        let total = positions.len();
        for (completed, (id, sort_order)) in positions.into_iter().enumerate() {
            let body = CategoryPatchBody {
                name: None,
                sort_order: Some(sort_order),
            };
            if let Err(err) = self.patch_category(owner, id, &body).await {
                if completed == 0 {
                    return Err(err);
                }
                // The first row is already on the server; report how far we got
                tracing::warn!(%id, %err, "category reorder stopped partway");
                return Err(BackendError::PartialWrite { completed, total });
            }
        }
        Ok(())
    }

    async fn list_snippets(&self, owner: UserId) -> BackendResult<Vec<Snippet>> {
        let url = self.table_url("snippets", &format!("owner_id=eq.{}&select=*", owner));
        let response = self.authed(self.client.get(&url)).send().await?;
        Ok(Self::expect_success(response).await?.json().await?)
    }

    async fn insert_snippet(&self, owner: UserId, new: NewSnippet) -> BackendResult<Snippet> {
        let row = Snippet::new(Some(owner), new.category_id, new.label, new.content);

        let url = self.table_url("snippets", "select=*");
        let response = self
            .authed(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        let stored: Vec<Snippet> = Self::expect_success(response).await?.json().await?;
        stored.into_iter().next().ok_or(BackendError::Unexpected {
            detail: "insert returned no rows".to_string(),
        })
    }

    async fn update_snippet(
        &self,
        owner: UserId,
        id: Uuid,
        patch: SnippetPatch,
    ) -> BackendResult<Snippet> {
        let body = SnippetPatchBody {
            label: patch.label.as_deref(),
            content: patch.content.as_deref(),
            updated_at: patch.updated_at.unwrap_or_else(Utc::now),
        };

        let url = self.table_url("snippets", &owner_and_id_filter(owner, id));
        let response = self
            .authed(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let rows: Vec<Snippet> = Self::expect_success(response).await?.json().await?;
        rows.into_iter().next().ok_or(BackendError::NotFound {
            entity: "snippet",
            id,
        })
    }

    async fn delete_snippet(&self, owner: UserId, id: Uuid) -> BackendResult<()> {
        let url = self.table_url("snippets", &owner_and_id_filter(owner, id));
        let response = self
            .authed(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<Snippet> = Self::expect_success(response).await?.json().await?;
        if rows.is_empty() {
            return Err(BackendError::NotFound {
                entity: "snippet",
                id,
            });
        }
        Ok(())
    }
}

/// Row filter matching one record for one owner
fn owner_and_id_filter(owner: UserId, id: Uuid) -> String {
    format!("owner_id=eq.{}&id=eq.{}", owner, id)
}

/// Turn a failed response into a typed error
///
/// PostgREST reports errors as JSON with `code` and `message` fields. An
/// undefined-table code means the storage was never provisioned.
fn classify_error_body(status: u16, body: &str) -> BackendError {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let message = parsed.message.unwrap_or_else(|| body.trim().to_string());
        if let Some(code) = parsed.code {
            if UNDEFINED_TABLE_CODES.contains(&code.as_str()) {
                return BackendError::NotProvisioned { detail: message };
            }
        }
        return BackendError::Http { status, message };
    }

    BackendError::Http {
        status,
        message: body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_backend() -> RemoteBackend {
        RemoteBackend::new(&RemoteConfig {
            base_url: "https://api.example.com/rest/v1/".to_string(),
            api_key: "anon".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let backend = test_backend();
        let url = backend.table_url("categories", "select=*");
        assert_eq!(url, "https://api.example.com/rest/v1/categories?select=*");
    }

    #[test]
    fn test_owner_and_id_filter() {
        let owner = UserId::generate();
        let id = Uuid::new_v4();
        let filter = owner_and_id_filter(owner, id);
        assert_eq!(filter, format!("owner_id=eq.{}&id=eq.{}", owner, id));
    }

    #[test]
    fn test_classify_undefined_table() {
        let body = r#"{"code":"42P01","message":"relation \"public.categories\" does not exist"}"#;
        let err = classify_error_body(404, body);
        assert!(err.is_provisioning());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_classify_missing_schema_cache_entry() {
        let body = r#"{"code":"PGRST205","message":"Could not find the table 'public.categories' in the schema cache"}"#;
        let err = classify_error_body(404, body);
        assert!(err.is_provisioning());
    }

    #[test]
    fn test_classify_other_code_is_http() {
        let body = r#"{"code":"23505","message":"duplicate key value"}"#;
        let err = classify_error_body(409, body);
        assert!(!err.is_provisioning());
        assert!(matches!(err, BackendError::Http { status: 409, .. }));
    }

    #[test]
    fn test_classify_non_json_body() {
        let err = classify_error_body(502, "Bad Gateway");
        match err {
            BackendError::Http { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn test_category_patch_body_skips_absent_fields() {
        let body = CategoryPatchBody {
            name: Some("New"),
            sort_order: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"name":"New"}"#);
    }

    #[test]
    fn test_snippet_patch_body_always_carries_timestamp() {
        let body = SnippetPatchBody {
            label: None,
            content: Some("updated"),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("updated_at"));
        assert!(!json.contains("label"));
    }
}
