//! QUIP Core Library
//!
//! This crate provides the core functionality for QUIP, a canned-phrase
//! manager: short reusable text blocks ("snippets") organized into named
//! categories, persisted per user.
//!
//! # Architecture
//!
//! - **Backend**: pluggable storage (local JSON documents, a hosted
//!   PostgREST endpoint, or in-memory for tests); source of truth across
//!   sessions
//! - **Workspace**: in-memory collections for the signed-in user; every
//!   mutation is confirmed by the backend before memory changes
//!
//! # Quick Start
//!
//! ```text
//! let identity = Identity::new()?;
//! let user = identity.sign_in("sam@example.com")?;
//!
//! let mut workspace = Workspace::new(backend);
//! workspace.load_for_user(user).await?;   // Seeds defaults on first use
//!
//! workspace.add_snippet(Some("Welcome"), "Hi there!").await?;
//! let visible = workspace.visible_snippets();
//! ```
//!
//! # Modules
//!
//! - `workspace`: Collection state and command handlers (main entry point)
//! - `models`: Data structures for categories and snippets
//! - `backend`: Storage backends and the `Backend` trait
//! - `bootstrap`: Default data for first-time users
//! - `search`: Snippet filtering
//! - `identity`: Users, sessions, and session-change events
//! - `notify`: Notices queued for the presentation layer
//! - `config`: Application configuration

pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod identity;
pub mod models;
pub mod notify;
pub mod search;
pub mod workspace;

pub use backend::{Backend, BackendError, LocalBackend, MemoryBackend, RemoteBackend};
pub use config::{BackendKind, Config, RemoteConfig};
pub use identity::{Identity, SessionUser};
pub use models::{Category, Snippet, UserId};
pub use notify::{Notice, NoticeKind};
pub use search::filter_snippets;
pub use workspace::{CommandError, Direction, LoadOutcome, Workspace};
