//! Category command handlers

use anyhow::{anyhow, Result};

use quip_core::{Direction, Workspace};

use crate::commands::{confirm, resolve_category};
use crate::output::Output;

/// List categories in display order
pub fn list(workspace: &Workspace, output: &Output) -> Result<()> {
    let rows: Vec<_> = workspace
        .categories()
        .iter()
        .map(|category| {
            let count = workspace
                .snippets()
                .iter()
                .filter(|s| s.category_id == category.id)
                .count();
            (category, count)
        })
        .collect();

    output.print_categories(&rows, workspace.selected_category().map(|c| c.id));
    Ok(())
}

/// Create a new category
pub async fn create(workspace: &mut Workspace, name: String, output: &Output) -> Result<()> {
    let category = workspace.add_category(&name).await?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&category).unwrap());
    } else if output.is_quiet() {
        println!("{}", category.id);
    }
    Ok(())
}

/// Rename a category
pub async fn rename(
    workspace: &mut Workspace,
    id: String,
    name: String,
    output: &Output,
) -> Result<()> {
    let category_id = resolve_category(workspace, &id)?;
    let category = workspace.rename_category(category_id, &name).await?;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&category).unwrap());
    }
    Ok(())
}

/// Delete a category and every snippet in it
pub async fn delete(workspace: &mut Workspace, id: String, output: &Output) -> Result<()> {
    let category_id = resolve_category(workspace, &id)?;
    let category = workspace
        .find_category(category_id)
        .ok_or_else(|| anyhow!("Category not found: {}", id))?;

    if output.should_prompt() {
        let count = workspace
            .snippets()
            .iter()
            .filter(|s| s.category_id == category_id)
            .count();
        println!(
            "Delete category '{}' and its {} snippet(s)?",
            category.name, count
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    workspace.delete_category(category_id).await?;
    Ok(())
}

/// Move a category one step up or down in display order
pub async fn mv(
    workspace: &mut Workspace,
    id: String,
    direction: Direction,
    output: &Output,
) -> Result<()> {
    let category_id = resolve_category(workspace, &id)?;
    let moved = workspace.move_category(category_id, direction).await?;

    if !moved {
        output.message("Already at the edge; nothing to move.");
    }
    Ok(())
}
