//! Identity and session management
//!
//! Users are identified by email against a local registry (users.json).
//! Signing in with an unknown email registers it. The active session is
//! persisted (session.json) so the user stays signed in across runs, and
//! session changes are broadcast over a watch channel so state holders can
//! react by loading or unloading collections.
//!
//! Passwords and auth forms are the presentation layer's concern; the
//! registry only maps emails to stable user ids.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::models::UserId;

/// One signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
}

/// Identity manager
///
/// Owns the user registry, the persisted session, and the session-changed
/// event channel.
pub struct Identity {
    config: Config,
    sessions: watch::Sender<Option<SessionUser>>,
}

impl Identity {
    /// Create an identity manager with default configuration
    pub fn new() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Ok(Self::with_config(config))
    }

    /// Create an identity manager with specific configuration
    ///
    /// Restores the persisted session if one exists and is readable.
    pub fn with_config(config: Config) -> Self {
        let current = load_session(&config.session_path()).unwrap_or_default();
        let (sessions, _) = watch::channel(current);
        Self { config, sessions }
    }

    /// Get the currently signed-in user, if any
    pub fn current_user(&self) -> Option<SessionUser> {
        self.sessions.borrow().clone()
    }

    /// Subscribe to session changes
    ///
    /// The receiver yields the new session on every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.sessions.subscribe()
    }

    /// Sign in with an email, registering it on first use
    ///
    /// Emails are trimmed and lowercased, so sign-ins are case-insensitive.
    pub fn sign_in(&self, email: &str) -> Result<SessionUser> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            bail!("'{}' is not a valid email address", email);
        }

        let mut users = load_users(&self.config.users_path())?;
        let user = match users.iter().find(|u| u.email == email) {
            Some(user) => user.clone(),
            None => {
                let user = SessionUser {
                    id: UserId::generate(),
                    email: email.clone(),
                };
                users.push(user.clone());
                save_users(&self.config.users_path(), &users)?;
                info!(%email, "registered new user");
                user
            }
        };

        save_session(&self.config.session_path(), &user)?;
        self.sessions.send_replace(Some(user.clone()));
        info!(%email, "signed in");
        Ok(user)
    }

    /// Sign out the current session
    ///
    /// Safe to call when nobody is signed in.
    pub fn sign_out(&self) -> Result<()> {
        let path = self.config.session_path();
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove session file: {:?}", path))?;
        }
        self.sessions.send_replace(None);
        info!("signed out");
        Ok(())
    }
}

/// Read the persisted session, if present
fn load_session(path: &Path) -> Result<Option<SessionUser>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {:?}", path))?;
    let user = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file: {:?}", path))?;
    Ok(Some(user))
}

/// Persist the session
fn save_session(path: &Path, user: &SessionUser) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(user).context("Failed to serialize session")?;
    fs::write(path, content).with_context(|| format!("Failed to write session file: {:?}", path))
}

/// Read the user registry, or an empty one if none exists yet
fn load_users(path: &Path) -> Result<Vec<SessionUser>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read user registry: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse user registry: {:?}", path))
}

/// Persist the user registry
fn save_users(path: &Path, users: &[SessionUser]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let content =
        serde_json::to_string_pretty(users).context("Failed to serialize user registry")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write user registry: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_no_session_initially() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::with_config(test_config(&temp_dir));
        assert!(identity.current_user().is_none());
    }

    #[test]
    fn test_sign_in_registers_new_user() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::with_config(test_config(&temp_dir));

        let user = identity.sign_in("sam@example.com").unwrap();
        assert_eq!(user.email, "sam@example.com");
        assert_eq!(identity.current_user(), Some(user));
    }

    #[test]
    fn test_sign_in_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::with_config(test_config(&temp_dir));

        let first = identity.sign_in("Sam@Example.com").unwrap();
        let second = identity.sign_in("  sam@example.COM ").unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_sign_in_rejects_invalid_email() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::with_config(test_config(&temp_dir));

        assert!(identity.sign_in("").is_err());
        assert!(identity.sign_in("not-an-email").is_err());
        assert!(identity.current_user().is_none());
    }

    #[test]
    fn test_session_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let identity1 = Identity::with_config(config.clone());
        let user = identity1.sign_in("sam@example.com").unwrap();

        // Simulates restart
        let identity2 = Identity::with_config(config);
        assert_eq!(identity2.current_user(), Some(user));
    }

    #[test]
    fn test_sign_out_clears_session() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let identity = Identity::with_config(config.clone());
        identity.sign_in("sam@example.com").unwrap();
        identity.sign_out().unwrap();
        assert!(identity.current_user().is_none());

        let identity2 = Identity::with_config(config);
        assert!(identity2.current_user().is_none());
    }

    #[test]
    fn test_sign_out_without_session_is_safe() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::with_config(test_config(&temp_dir));
        identity.sign_out().unwrap();
    }

    #[test]
    fn test_subscribe_sees_changes() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::with_config(test_config(&temp_dir));
        let mut receiver = identity.subscribe();

        identity.sign_in("sam@example.com").unwrap();
        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_some());

        identity.sign_out().unwrap();
        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_none());
    }

    #[test]
    fn test_registry_keeps_distinct_users() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::with_config(test_config(&temp_dir));

        let sam = identity.sign_in("sam@example.com").unwrap();
        let kim = identity.sign_in("kim@example.com").unwrap();
        assert_ne!(sam.id, kim.id);

        // Signing back in finds the original id
        let sam_again = identity.sign_in("sam@example.com").unwrap();
        assert_eq!(sam.id, sam_again.id);
    }
}
