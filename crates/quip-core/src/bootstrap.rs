//! Default data for first-time users
//!
//! A user whose store holds zero categories gets a starter set: four
//! categories covering a support conversation from greeting to closing, plus
//! a few example snippets. The caller decides when to seed (only after
//! observing an empty store), so seeding never duplicates.

use tracing::info;

use crate::backend::{Backend, BackendResult, NewSnippet};
use crate::models::{Category, Snippet, UserId};

/// Names of the default categories, in display order
pub const DEFAULT_CATEGORY_NAMES: [&str; 4] = ["Greetings", "Follow-ups", "Payment", "Closing"];

/// One default snippet, tied to its category by name
///
/// Categories are inserted first; snippets attach to the returned ids. The
/// name is the stable key between the two passes.
struct StarterSnippet {
    category: &'static str,
    label: &'static str,
    content: &'static str,
}

const STARTER_SNIPPETS: [StarterSnippet; 5] = [
    StarterSnippet {
        category: "Greetings",
        label: "Welcome",
        content: "Hi! Thanks for reaching out. How can I help you today?",
    },
    StarterSnippet {
        category: "Greetings",
        label: "Welcome back",
        content: "Welcome back! Picking up where we left off.",
    },
    StarterSnippet {
        category: "Follow-ups",
        label: "Checking in",
        content: "Just checking in. Did the last suggestion work for you?",
    },
    StarterSnippet {
        category: "Payment",
        label: "Invoice sent",
        content: "Your invoice is on its way. Let me know once the payment goes through.",
    },
    StarterSnippet {
        category: "Closing",
        label: "Wrap up",
        content: "Glad I could help! Feel free to reach out any time.",
    },
];

/// Create the default categories and snippets for one owner
///
/// Returns the stored records so the caller can adopt them directly instead
/// of re-fetching.
pub async fn seed(
    backend: &dyn Backend,
    owner: UserId,
) -> BackendResult<(Vec<Category>, Vec<Snippet>)> {
    let names: Vec<String> = DEFAULT_CATEGORY_NAMES
        .iter()
        .map(|name| name.to_string())
        .collect();
    let categories = backend.insert_categories(owner, &names).await?;

    let mut snippets = Vec::with_capacity(STARTER_SNIPPETS.len());
    for starter in &STARTER_SNIPPETS {
        let Some(category) = categories.iter().find(|c| c.name == starter.category) else {
            continue;
        };
        let snippet = backend
            .insert_snippet(
                owner,
                NewSnippet {
                    category_id: category.id,
                    label: starter.label.to_string(),
                    content: starter.content.to_string(),
                },
            )
            .await?;
        snippets.push(snippet);
    }

    info!(
        categories = categories.len(),
        snippets = snippets.len(),
        "seeded default collection"
    );
    Ok((categories, snippets))
}
