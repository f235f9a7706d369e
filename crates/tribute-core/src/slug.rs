//! Slug derivation and collision-free allocation

use std::collections::HashSet;

/// Used when every descriptive field normalizes to nothing.
const FALLBACK_SLUG: &str = "tribute";

/// Normalize free text into a URL segment.
///
/// Lowercases, drops apostrophes, turns every run of other non-alphanumeric
/// characters into a single hyphen and trims hyphens from both ends. Only
/// ASCII letters and digits survive.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if matches!(c, '\'' | '’' | '‘' | '`') {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Allocate a slug for a new record that no existing record uses.
///
/// The base is `name-category-breed` built from whichever parts normalize to
/// something. If the base is taken, `-2`, `-3`, ... are tried in turn. The
/// result is never empty and depends only on the inputs and `existing`.
pub fn allocate_slug(name: &str, category: &str, breed: &str, existing: &HashSet<String>) -> String {
    let parts: Vec<String> = [name, category, breed]
        .into_iter()
        .map(slugify)
        .filter(|p| !p.is_empty())
        .collect();

    let base = if parts.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        parts.join("-")
    };

    if !existing.contains(&base) {
        return base;
    }

    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or(base)
}
