//! quip CLI
//!
//! Command-line interface for quip - canned phrases for repetitive replies.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quip_core::{
    Backend, BackendKind, Config, Direction, Identity, LocalBackend, NoticeKind, RemoteBackend,
    Workspace,
};

mod clipboard;
mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quip")]
#[command(about = "quip - canned phrases for repetitive replies")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage categories
    #[command(alias = "cat")]
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Manage snippets
    #[command(alias = "snip")]
    Snippet {
        #[command(subcommand)]
        command: SnippetCommands,
    },
    /// Copy a snippet's content to the clipboard
    Copy {
        /// Snippet (full UUID, label, or ID prefix)
        id: String,
    },
    /// Show status (backend, session, counts)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum AuthCommands {
    /// Sign in with an email address
    Login {
        /// Email address
        email: String,
    },
    /// Sign out and clear the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories in display order
    #[command(alias = "ls")]
    List,
    /// Create a new category
    #[command(alias = "add")]
    Create {
        /// Category name
        name: String,
    },
    /// Rename a category
    Rename {
        /// Category (full UUID, name, or ID prefix)
        id: String,
        /// New name
        name: String,
    },
    /// Delete a category and every snippet in it
    #[command(alias = "rm")]
    Delete {
        /// Category (full UUID, name, or ID prefix)
        id: String,
    },
    /// Move a category one step up or down
    #[command(alias = "mv")]
    Move {
        /// Category (full UUID, name, or ID prefix)
        id: String,
        /// Which way to move
        direction: MoveDirection,
    },
}

#[derive(Subcommand)]
enum SnippetCommands {
    /// List snippets in the active category
    #[command(alias = "ls")]
    List {
        /// Category to list (full UUID, name, or ID prefix)
        #[arg(short, long)]
        category: Option<String>,
        /// Filter by a search query
        #[arg(short, long)]
        search: Option<String>,
        /// List every snippet across categories
        #[arg(long, conflicts_with_all = ["category", "search"])]
        all: bool,
    },
    /// Create a new snippet
    #[command(alias = "add")]
    Create {
        /// Snippet content
        content: String,
        /// Label (derived from the first content line when omitted)
        #[arg(short, long)]
        label: Option<String>,
        /// Category to add to (full UUID, name, or ID prefix)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Edit a snippet's label or content
    Edit {
        /// Snippet (full UUID, label, or ID prefix)
        id: String,
        /// New label (pass an empty string to re-derive from content)
        #[arg(short, long)]
        label: Option<String>,
        /// New content
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Show a snippet in full
    Show {
        /// Snippet (full UUID, label, or ID prefix)
        id: String,
    },
    /// Delete a snippet
    #[command(alias = "rm")]
    Delete {
        /// Snippet (full UUID, label, or ID prefix)
        id: String,
    },
    /// Duplicate a snippet within its category
    #[command(alias = "dup")]
    Duplicate {
        /// Snippet (full UUID, label, or ID prefix)
        id: String,
    },
    /// Copy a snippet's content to the clipboard
    Copy {
        /// Snippet (full UUID, label, or ID prefix)
        id: String,
    },
    /// Search snippets in the active category
    Search {
        /// Search query (matches label and content)
        query: String,
        /// Category to search (full UUID, name, or ID prefix)
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, remote_url, remote_key)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Which way to move a category
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(direction: MoveDirection) -> Self {
        match direction {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    init_logging();

    // Commands that don't need a loaded workspace
    match &cli.command {
        Commands::Config { command } => {
            return handle_config_command(command.clone(), &output);
        }
        Commands::Auth { command } => {
            return handle_auth_command(command.clone(), &output);
        }
        _ => {}
    }

    let config = Config::load().context("Failed to load configuration")?;
    let identity = Identity::with_config(config.clone());
    let Some(user) = identity.current_user() else {
        bail!("Not signed in. Run `quip auth login <email>` first.");
    };

    let backend = open_backend(&config)?;
    let mut workspace = Workspace::new(backend);

    if let Err(err) = workspace.load_for_user(user).await {
        output.print_notices(&workspace.take_notices());
        if err.is_provisioning() {
            print_provisioning_hint();
        }
        std::process::exit(1);
    }
    debug!(backend = %config.backend, "workspace loaded");

    let result = match cli.command {
        Commands::Auth { .. } | Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Category { command } => {
            handle_category_command(command, &mut workspace, &output).await
        }
        Commands::Snippet { command } => {
            handle_snippet_command(command, &mut workspace, &output).await
        }
        Commands::Copy { id } => commands::snippet::copy(&workspace, id, &output),
        Commands::Status => commands::status::show(&config, &workspace, &output),
    };

    let notices = workspace.take_notices();
    output.print_notices(&notices);

    if let Err(err) = result {
        // Workspace failures are already in the notices; only surface
        // errors that never reached the notice queue.
        if !notices.iter().any(|n| n.kind == NoticeKind::Error) {
            eprintln!("Error: {:#}", err);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_category_command(
    command: CategoryCommands,
    workspace: &mut Workspace,
    output: &Output,
) -> Result<()> {
    match command {
        CategoryCommands::List => commands::category::list(workspace, output),
        CategoryCommands::Create { name } => {
            commands::category::create(workspace, name, output).await
        }
        CategoryCommands::Rename { id, name } => {
            commands::category::rename(workspace, id, name, output).await
        }
        CategoryCommands::Delete { id } => commands::category::delete(workspace, id, output).await,
        CategoryCommands::Move { id, direction } => {
            commands::category::mv(workspace, id, direction.into(), output).await
        }
    }
}

async fn handle_snippet_command(
    command: SnippetCommands,
    workspace: &mut Workspace,
    output: &Output,
) -> Result<()> {
    match command {
        SnippetCommands::List {
            category,
            search,
            all,
        } => commands::snippet::list(workspace, category, search, all, output),
        SnippetCommands::Create {
            content,
            label,
            category,
        } => commands::snippet::create(workspace, content, label, category, output).await,
        SnippetCommands::Edit { id, label, content } => {
            commands::snippet::edit(workspace, id, label, content, output).await
        }
        SnippetCommands::Show { id } => commands::snippet::show(workspace, id, output),
        SnippetCommands::Delete { id } => commands::snippet::delete(workspace, id, output).await,
        SnippetCommands::Duplicate { id } => {
            commands::snippet::duplicate(workspace, id, output).await
        }
        SnippetCommands::Copy { id } => commands::snippet::copy(workspace, id, output),
        SnippetCommands::Search { query, category } => {
            commands::snippet::search(workspace, query, category, output)
        }
    }
}

fn handle_auth_command(command: AuthCommands, output: &Output) -> Result<()> {
    match command {
        AuthCommands::Login { email } => commands::auth::login(email, output),
        AuthCommands::Logout => commands::auth::logout(output),
        AuthCommands::Whoami => commands::auth::whoami(output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Build the backend the config points at
fn open_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    match config.backend {
        BackendKind::Local => Ok(Arc::new(LocalBackend::open(config)?)),
        BackendKind::Remote => {
            let Some(remote) = config.remote.as_ref() else {
                bail!(
                    "Backend is set to 'remote' but no remote settings are configured.\n\
                     Set them with:\n  \
                     quip config set remote_url https://your-project.example.co/rest/v1\n  \
                     quip config set remote_key <api-key>"
                );
            };
            Ok(Arc::new(RemoteBackend::new(remote)?))
        }
    }
}

/// Route log output to stderr, filtered by QUIP_LOG (a level name)
fn init_logging() {
    let level = std::env::var("QUIP_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!("quip_core={},quip_cli={}", level, level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Table definitions for a fresh remote store
fn print_provisioning_hint() {
    eprintln!();
    eprintln!("The remote store has no quip tables yet. Create them with:");
    eprintln!();
    eprintln!("  create table categories (");
    eprintln!("    id uuid primary key,");
    eprintln!("    owner_id uuid not null,");
    eprintln!("    name text not null,");
    eprintln!("    sort_order bigint,");
    eprintln!("    created_at timestamptz not null");
    eprintln!("  );");
    eprintln!();
    eprintln!("  create table snippets (");
    eprintln!("    id uuid primary key,");
    eprintln!("    owner_id uuid not null,");
    eprintln!("    category_id uuid not null references categories (id),");
    eprintln!("    label text not null,");
    eprintln!("    content text not null,");
    eprintln!("    created_at timestamptz not null,");
    eprintln!("    updated_at timestamptz not null");
    eprintln!("  );");
}
