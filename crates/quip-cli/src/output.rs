//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)
//!
//! Stdout carries the requested data. Notices and errors go to stderr in
//! JSON and quiet modes so stdout stays machine-readable.

use quip_core::{Category, Notice, NoticeKind, Snippet};
use uuid::Uuid;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is in JSON mode
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print the category list, marking the active one
    ///
    /// Each row carries the category and its snippet count.
    pub fn print_categories(&self, rows: &[(&Category, usize)], selected: Option<Uuid>) {
        match self.format {
            OutputFormat::Human => {
                if rows.is_empty() {
                    println!("No categories yet.");
                    return;
                }
                for (category, count) in rows {
                    let marker = if selected == Some(category.id) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{} {} | {} | {} snippet(s)",
                        marker,
                        &category.id.to_string()[..8],
                        truncate(&category.name, 25),
                        count
                    );
                }
                let label = if rows.len() == 1 {
                    "category"
                } else {
                    "categories"
                };
                println!("\n{} {}", rows.len(), label);
            }
            OutputFormat::Json => {
                let json_rows: Vec<_> = rows
                    .iter()
                    .map(|(category, count)| {
                        serde_json::json!({
                            "id": category.id,
                            "name": category.name,
                            "sort_order": category.sort_order,
                            "created_at": category.created_at,
                            "selected": selected == Some(category.id),
                            "snippets": count
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json_rows).unwrap());
            }
            OutputFormat::Quiet => {
                for (category, _) in rows {
                    println!("{}", category.id);
                }
            }
        }
    }

    /// Print a list of snippets
    pub fn print_snippets(&self, snippets: &[&Snippet]) {
        match self.format {
            OutputFormat::Human => {
                if snippets.is_empty() {
                    println!("No snippets found.");
                    return;
                }
                for snippet in snippets {
                    println!(
                        "{} | {} | {}",
                        &snippet.id.to_string()[..8],
                        truncate(&snippet.label, 30),
                        truncate_line(&snippet.content, 45)
                    );
                }
                println!("\n{} snippet(s)", snippets.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(snippets).unwrap());
            }
            OutputFormat::Quiet => {
                for snippet in snippets {
                    println!("{}", snippet.id);
                }
            }
        }
    }

    /// Print a single snippet in full
    pub fn print_snippet(&self, snippet: &Snippet, category: Option<&Category>) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", snippet.id);
                println!("Label:    {}", snippet.label);
                if let Some(category) = category {
                    println!("Category: {}", category.name);
                }
                println!("Created:  {}", snippet.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:  {}", snippet.updated_at.format("%Y-%m-%d %H:%M"));
                println!();
                println!("{}", snippet.content);
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(snippet).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", snippet.id);
            }
        }
    }

    /// Print notices accumulated by workspace commands
    pub fn print_notices(&self, notices: &[Notice]) {
        for notice in notices {
            match self.format {
                OutputFormat::Human => match notice.kind {
                    NoticeKind::Success => println!("✓ {}", notice.message),
                    NoticeKind::Error => eprintln!("✗ {}", notice.message),
                    NoticeKind::Info => println!("· {}", notice.message),
                },
                OutputFormat::Json => {
                    eprintln!("{}", serde_json::to_string(notice).unwrap());
                }
                OutputFormat::Quiet => {
                    if notice.kind == NoticeKind::Error {
                        eprintln!("✗ {}", notice.message);
                    }
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max chars, adding "..." if truncated
///
/// Counts chars, not bytes, since snippet content is arbitrary text.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max chars
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
