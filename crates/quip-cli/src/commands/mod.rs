//! Command handlers
//!
//! One module per command group. Handlers run against a loaded
//! [`Workspace`] and leave their outcome in its notice queue; `main`
//! drains and prints the notices after dispatch.

use std::io::{self, Write};

use anyhow::{bail, Result};
use uuid::Uuid;

use quip_core::Workspace;

pub mod auth;
pub mod category;
pub mod config;
pub mod snippet;
pub mod status;

/// Resolve a category reference: full UUID, exact name, or ID prefix
///
/// Names are matched case-insensitively and tried before ID prefixes, so
/// a hex-looking name still resolves to the category the user sees.
pub(crate) fn resolve_category(workspace: &Workspace, reference: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(reference) {
        return Ok(uuid);
    }

    let named: Vec<_> = workspace
        .categories()
        .iter()
        .filter(|c| c.name.eq_ignore_ascii_case(reference))
        .collect();
    match named.len() {
        0 => {}
        1 => return Ok(named[0].id),
        _ => {
            eprintln!("Multiple categories named '{}':", reference);
            for category in &named {
                eprintln!("  {} - {}", category.id, category.name);
            }
            bail!("Ambiguous name. Use the ID instead.");
        }
    }

    let matches: Vec<_> = workspace
        .categories()
        .iter()
        .filter(|c| c.id.to_string().starts_with(reference))
        .collect();
    match matches.len() {
        0 => bail!("No category found matching: {}", reference),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple categories match '{}':", reference);
            for category in &matches {
                eprintln!("  {} - {}", category.id, category.name);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Resolve a snippet reference: full UUID, exact label, or ID prefix
pub(crate) fn resolve_snippet(workspace: &Workspace, reference: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(reference) {
        return Ok(uuid);
    }

    let labeled: Vec<_> = workspace
        .snippets()
        .iter()
        .filter(|s| s.label.eq_ignore_ascii_case(reference))
        .collect();
    match labeled.len() {
        0 => {}
        1 => return Ok(labeled[0].id),
        _ => {
            eprintln!("Multiple snippets labeled '{}':", reference);
            for snippet in &labeled {
                eprintln!("  {} - {}", &snippet.id.to_string()[..8], snippet.label);
            }
            bail!("Ambiguous label. Use the ID instead.");
        }
    }

    let matches: Vec<_> = workspace
        .snippets()
        .iter()
        .filter(|s| s.id.to_string().starts_with(reference))
        .collect();
    match matches.len() {
        0 => bail!("No snippet found matching: {}", reference),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple snippets match '{}':", reference);
            for snippet in &matches {
                eprintln!("  {} - {}", &snippet.id.to_string()[..8], snippet.label);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use quip_core::{MemoryBackend, SessionUser, UserId, Workspace};

    async fn loaded_workspace() -> Workspace {
        let backend = Arc::new(MemoryBackend::new());
        let mut workspace = Workspace::new(backend);
        let user = SessionUser {
            id: UserId::generate(),
            email: "dev@example.com".to_string(),
        };
        workspace
            .load_for_user(user)
            .await
            .unwrap_or_else(|err| panic!("load failed: {err}"));
        workspace.take_notices();
        workspace
    }

    #[tokio::test]
    async fn test_resolve_category_full_uuid_passes_through() {
        let workspace = loaded_workspace().await;
        let id = Uuid::new_v4();
        assert_eq!(resolve_category(&workspace, &id.to_string()).unwrap(), id);
    }

    #[tokio::test]
    async fn test_resolve_category_by_name() {
        let workspace = loaded_workspace().await;
        let expected = workspace.categories()[0].id;
        let name = workspace.categories()[0].name.clone();

        assert_eq!(resolve_category(&workspace, &name).unwrap(), expected);
        assert_eq!(
            resolve_category(&workspace, &name.to_uppercase()).unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn test_resolve_category_by_prefix() {
        let workspace = loaded_workspace().await;
        let expected = workspace.categories()[0].id;
        let prefix = expected.to_string()[..12].to_string();

        assert_eq!(resolve_category(&workspace, &prefix).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_resolve_category_ambiguous_name() {
        let mut workspace = loaded_workspace().await;
        workspace.add_category("Alpha").await.unwrap();
        workspace.add_category("Alpha").await.unwrap();

        let err = resolve_category(&workspace, "Alpha").unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
    }

    #[tokio::test]
    async fn test_resolve_category_not_found() {
        let workspace = loaded_workspace().await;
        let err = resolve_category(&workspace, "no-such-category").unwrap_err();
        assert!(err.to_string().contains("No category found"));
    }

    #[tokio::test]
    async fn test_resolve_snippet_by_label() {
        let workspace = loaded_workspace().await;
        let snippet = &workspace.snippets()[0];

        assert_eq!(
            resolve_snippet(&workspace, &snippet.label).unwrap(),
            snippet.id
        );
    }

    #[tokio::test]
    async fn test_resolve_snippet_by_prefix() {
        let workspace = loaded_workspace().await;
        let expected = workspace.snippets()[0].id;
        let prefix = expected.to_string()[..12].to_string();

        assert_eq!(resolve_snippet(&workspace, &prefix).unwrap(), expected);
    }

    #[tokio::test]
    async fn test_resolve_snippet_ambiguous_label() {
        let mut workspace = loaded_workspace().await;
        workspace.add_snippet(Some("Same"), "first").await.unwrap();
        workspace.add_snippet(Some("Same"), "second").await.unwrap();

        let err = resolve_snippet(&workspace, "Same").unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
    }

    #[tokio::test]
    async fn test_resolve_snippet_not_found() {
        let workspace = loaded_workspace().await;
        let err = resolve_snippet(&workspace, "zzz").unwrap_err();
        assert!(err.to_string().contains("No snippet found"));
    }
}
