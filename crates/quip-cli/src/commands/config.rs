//! Config command handlers

use anyhow::{bail, Context, Result};

use quip_core::{Config, RemoteConfig};

use crate::output::{Output, OutputFormat};

/// Show current configuration
///
/// The API key is never printed, only whether one is set.
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "backend": config.backend.to_string(),
                    "remote_url": config.remote.as_ref().map(|r| r.base_url.clone()),
                    "remote_key_set": config.remote.as_ref().map_or(false, |r| !r.api_key.is_empty())
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:   {}", config.data_dir.display());
            println!("  backend:    {}", config.backend);
            println!(
                "  remote_url: {}",
                config
                    .remote
                    .as_ref()
                    .map(|r| r.base_url.as_str())
                    .unwrap_or("(not set)")
            );
            println!(
                "  remote_key: {}",
                match config.remote.as_ref() {
                    Some(r) if !r.api_key.is_empty() => "(set)",
                    _ => "(not set)",
                }
            );
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "backend" => {
            config.backend = value.parse().map_err(anyhow::Error::msg)?;
        }
        "remote_url" => {
            if value.is_empty() || value == "none" {
                config.remote = None;
            } else {
                match config.remote.as_mut() {
                    Some(remote) => remote.base_url = value.clone(),
                    None => {
                        config.remote = Some(RemoteConfig {
                            base_url: value.clone(),
                            api_key: String::new(),
                        });
                    }
                }
            }
        }
        "remote_key" => match config.remote.as_mut() {
            Some(remote) => remote.api_key = value.clone(),
            None => {
                config.remote = Some(RemoteConfig {
                    base_url: String::new(),
                    api_key: value.clone(),
                });
            }
        },
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, backend, remote_url, remote_key",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;

    if key == "remote_key" {
        output.success("Set remote_key = (hidden)");
    } else {
        output.success(&format!("Set {} = {}", key, value));
    }

    Ok(())
}
