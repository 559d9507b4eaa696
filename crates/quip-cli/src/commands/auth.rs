//! Auth command handlers
//!
//! Sessions are plain email sign-ins against the local user registry.
//! No workspace is loaded for these, so they run before backend setup.

use anyhow::{bail, Context, Result};

use quip_core::{Config, Identity};

use crate::output::{Output, OutputFormat};

/// Sign in with an email address
///
/// Unknown addresses are registered on the spot.
pub fn login(email: String, output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let identity = Identity::with_config(config);
    let user = identity.sign_in(&email)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"id": user.id, "email": user.email})
            );
        }
        OutputFormat::Quiet => {
            println!("{}", user.id);
        }
        OutputFormat::Human => {
            output.success(&format!("Signed in as {}", user.email));
        }
    }

    Ok(())
}

/// Sign out and clear the saved session
pub fn logout(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let identity = Identity::with_config(config);

    if identity.current_user().is_none() {
        output.message("Not signed in.");
        return Ok(());
    }

    identity.sign_out()?;
    output.success("Signed out");
    Ok(())
}

/// Show the signed-in user
pub fn whoami(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let identity = Identity::with_config(config);

    let Some(user) = identity.current_user() else {
        bail!("Not signed in. Run `quip auth login <email>` first.");
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"id": user.id, "email": user.email})
            );
        }
        OutputFormat::Quiet => {
            println!("{}", user.email);
        }
        OutputFormat::Human => {
            println!("Signed in as: {} ({})", user.email, user.id);
        }
    }

    Ok(())
}
