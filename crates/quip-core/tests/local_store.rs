//! End-to-end tests for the local store through the public API.
//!
//! These run a real `Workspace` over a `LocalBackend` rooted in a temp
//! directory, covering what the unit tests cannot: durability across a
//! process restart (modeled as dropping and reopening the workspace) and
//! the first-run bootstrap path against real files.

use std::sync::Arc;

use tempfile::TempDir;

use quip_core::{
    Config, Direction, LoadOutcome, LocalBackend, SessionUser, UserId, Workspace,
};

fn test_user() -> SessionUser {
    SessionUser {
        id: UserId::generate(),
        email: "dev@example.com".to_string(),
    }
}

fn workspace_at(dir: &TempDir) -> Workspace {
    Workspace::new(Arc::new(LocalBackend::new(dir.path())))
}

#[tokio::test]
async fn first_load_bootstraps_defaults() {
    let dir = TempDir::new().unwrap();
    let mut workspace = workspace_at(&dir);

    let outcome = workspace.load_for_user(test_user()).await.unwrap();

    assert_eq!(outcome, LoadOutcome::Loaded { bootstrapped: true });
    assert_eq!(workspace.categories().len(), 4);
    assert!(!workspace.snippets().is_empty());
    assert_eq!(
        workspace.selected_category().map(|c| c.name.as_str()),
        Some("Greetings")
    );
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let user = test_user();

    let mut first = workspace_at(&dir);
    first.load_for_user(user.clone()).await.unwrap();
    let category = first.add_category("Escalations").await.unwrap();
    let snippet = first
        .add_snippet(Some("Handoff"), "Passing this to our specialist team.")
        .await
        .unwrap();
    drop(first);

    let mut second = workspace_at(&dir);
    let outcome = second.load_for_user(user).await.unwrap();

    assert_eq!(outcome, LoadOutcome::Loaded { bootstrapped: false });
    assert!(second.find_category(category.id).is_some());
    let reloaded = second.find_snippet(snippet.id).unwrap();
    assert_eq!(reloaded.content, "Passing this to our specialist team.");
    assert_eq!(reloaded.category_id, category.id);
    // The new category took the last display position
    assert_eq!(second.categories().last().unwrap().id, category.id);
}

#[tokio::test]
async fn reorder_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let user = test_user();

    let mut first = workspace_at(&dir);
    first.load_for_user(user.clone()).await.unwrap();
    let second_id = first.categories()[1].id;
    assert!(first
        .move_category(second_id, Direction::Up)
        .await
        .unwrap());
    let order: Vec<_> = first.categories().iter().map(|c| c.id).collect();
    drop(first);

    let mut reopened = workspace_at(&dir);
    reopened.load_for_user(user).await.unwrap();
    let reloaded: Vec<_> = reopened.categories().iter().map(|c| c.id).collect();

    assert_eq!(reloaded, order);
    assert_eq!(reopened.categories()[0].id, second_id);
}

#[tokio::test]
async fn cascade_delete_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let user = test_user();

    let mut first = workspace_at(&dir);
    first.load_for_user(user.clone()).await.unwrap();
    let doomed = first.categories()[0].id;
    assert!(first.snippets().iter().any(|s| s.category_id == doomed));
    first.delete_category(doomed).await.unwrap();
    drop(first);

    let mut reopened = workspace_at(&dir);
    reopened.load_for_user(user).await.unwrap();

    assert!(reopened.find_category(doomed).is_none());
    assert_eq!(reopened.categories().len(), 3);
    assert!(reopened.snippets().iter().all(|s| s.category_id != doomed));
}

#[tokio::test]
async fn owners_do_not_share_data() {
    let dir = TempDir::new().unwrap();
    let alice = test_user();
    let bob = SessionUser {
        id: UserId::generate(),
        email: "bob@example.com".to_string(),
    };

    let mut workspace = workspace_at(&dir);
    workspace.load_for_user(alice.clone()).await.unwrap();
    workspace.add_category("Alice only").await.unwrap();

    workspace.load_for_user(bob).await.unwrap();
    assert!(workspace.categories().iter().all(|c| c.name != "Alice only"));

    workspace.load_for_user(alice).await.unwrap();
    assert!(workspace.categories().iter().any(|c| c.name == "Alice only"));
}

#[tokio::test]
async fn corrupt_document_fails_load_and_leaves_workspace_empty() {
    let dir = TempDir::new().unwrap();
    let user = test_user();

    let mut workspace = workspace_at(&dir);
    workspace.load_for_user(user.clone()).await.unwrap();
    drop(workspace);

    let document = dir.path().join(format!("{}.json", user.id));
    std::fs::write(&document, "{not json").unwrap();

    let mut reopened = workspace_at(&dir);
    assert!(reopened.load_for_user(user).await.is_err());
    assert!(reopened.categories().is_empty());
    assert!(reopened.snippets().is_empty());
    assert!(reopened.selected_category().is_none());
}

#[tokio::test]
async fn unusable_store_dir_reports_not_provisioned() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = dir.path().join("data");

    // Occupy the store path with a plain file so the directory cannot exist
    std::fs::create_dir_all(&config.data_dir).unwrap();
    std::fs::write(config.store_dir(), b"not a directory").unwrap();

    let err = LocalBackend::open(&config).unwrap_err();
    assert!(err.is_provisioning());
}
