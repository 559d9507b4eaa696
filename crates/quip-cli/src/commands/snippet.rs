//! Snippet command handlers

use anyhow::{anyhow, Result};

use quip_core::Workspace;

use crate::clipboard;
use crate::commands::{confirm, resolve_category, resolve_snippet};
use crate::output::Output;

/// List snippets in the active category, optionally filtered
pub fn list(
    workspace: &mut Workspace,
    category: Option<String>,
    search: Option<String>,
    all: bool,
    output: &Output,
) -> Result<()> {
    if all {
        let everything: Vec<_> = workspace.snippets().iter().collect();
        output.print_snippets(&everything);
        return Ok(());
    }

    if let Some(reference) = category {
        let category_id = resolve_category(workspace, &reference)?;
        workspace.select_category(category_id)?;
    }
    if let Some(query) = search {
        workspace.set_query(query);
    }

    output.print_snippets(&workspace.visible_snippets());
    Ok(())
}

/// Search snippets by label or content within the active category
pub fn search(
    workspace: &mut Workspace,
    query: String,
    category: Option<String>,
    output: &Output,
) -> Result<()> {
    if let Some(reference) = category {
        let category_id = resolve_category(workspace, &reference)?;
        workspace.select_category(category_id)?;
    }
    workspace.set_query(query);

    output.print_snippets(&workspace.visible_snippets());
    Ok(())
}

/// Create a new snippet
///
/// Goes into the active category unless --category says otherwise. The
/// label is derived from the first content line when omitted.
pub async fn create(
    workspace: &mut Workspace,
    content: String,
    label: Option<String>,
    category: Option<String>,
    output: &Output,
) -> Result<()> {
    if let Some(reference) = category {
        let category_id = resolve_category(workspace, &reference)?;
        workspace.select_category(category_id)?;
    }

    let snippet = workspace.add_snippet(label.as_deref(), &content).await?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&snippet).unwrap());
    } else if output.is_quiet() {
        println!("{}", snippet.id);
    }
    Ok(())
}

/// Edit a snippet's label or content
pub async fn edit(
    workspace: &mut Workspace,
    id: String,
    label: Option<String>,
    content: Option<String>,
    output: &Output,
) -> Result<()> {
    let snippet_id = resolve_snippet(workspace, &id)?;
    let snippet = workspace
        .edit_snippet(snippet_id, label.as_deref(), content.as_deref())
        .await?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&snippet).unwrap());
    }
    Ok(())
}

/// Show a snippet in full
pub fn show(workspace: &Workspace, id: String, output: &Output) -> Result<()> {
    let snippet_id = resolve_snippet(workspace, &id)?;
    let snippet = workspace
        .find_snippet(snippet_id)
        .ok_or_else(|| anyhow!("Snippet not found: {}", id))?;

    output.print_snippet(snippet, workspace.find_category(snippet.category_id));
    Ok(())
}

/// Delete a snippet
pub async fn delete(workspace: &mut Workspace, id: String, output: &Output) -> Result<()> {
    let snippet_id = resolve_snippet(workspace, &id)?;
    let snippet = workspace
        .find_snippet(snippet_id)
        .ok_or_else(|| anyhow!("Snippet not found: {}", id))?;

    if output.should_prompt() {
        println!(
            "Delete snippet: {} - {}",
            &snippet.id.to_string()[..8],
            snippet.label
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    workspace.delete_snippet(snippet_id).await?;
    Ok(())
}

/// Duplicate a snippet within its category
pub async fn duplicate(workspace: &mut Workspace, id: String, output: &Output) -> Result<()> {
    let snippet_id = resolve_snippet(workspace, &id)?;
    let copy = workspace.duplicate_snippet(snippet_id).await?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&copy).unwrap());
    } else if output.is_quiet() {
        println!("{}", copy.id);
    }
    Ok(())
}

/// Copy a snippet's content to the system clipboard
///
/// Falls back to printing the content when no clipboard tool is found,
/// so the command still works over SSH or in containers.
pub fn copy(workspace: &Workspace, id: String, output: &Output) -> Result<()> {
    let snippet_id = resolve_snippet(workspace, &id)?;
    let snippet = workspace
        .find_snippet(snippet_id)
        .ok_or_else(|| anyhow!("Snippet not found: {}", id))?;

    if clipboard::copy(&snippet.content) {
        output.success(&format!("Copied '{}' to clipboard", snippet.label));
    } else {
        println!("{}", snippet.content);
        if !output.is_quiet() {
            eprintln!("⚠ No clipboard tool available; printed the content instead.");
        }
    }
    Ok(())
}
