//! Status command handler

use anyhow::Result;

use quip_core::{BackendKind, Config, Workspace};

use crate::output::{Output, OutputFormat};

/// Show backend, session, and content counts
pub fn show(config: &Config, workspace: &Workspace, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": config.backend.to_string(),
                    "data_dir": config.data_dir,
                    "remote_url": config.remote.as_ref().map(|r| r.base_url.clone()),
                    "user": workspace.session().map(|u| {
                        serde_json::json!({"id": u.id, "email": u.email})
                    }),
                    "selected_category": workspace.selected_category().map(|c| c.id),
                    "counts": {
                        "categories": workspace.categories().len(),
                        "snippets": workspace.snippets().len()
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.backend);
        }
        OutputFormat::Human => {
            println!("Quip Status");
            println!("===========");
            println!();
            println!("Backend:");
            println!("  Kind:     {}", config.backend);
            if config.backend == BackendKind::Remote {
                if let Some(ref remote) = config.remote {
                    println!("  URL:      {}", remote.base_url);
                }
            }
            println!("  Data dir: {}", config.data_dir.display());
            println!();
            if let Some(user) = workspace.session() {
                println!("Signed in as: {} ({})", user.email, user.id);
            }
            println!();
            println!("Contents:");
            println!("  Categories: {}", workspace.categories().len());
            println!("  Snippets:   {}", workspace.snippets().len());
            if let Some(category) = workspace.selected_category() {
                println!("  Active:     {}", category.name);
            }
        }
    }

    Ok(())
}
