//! Operator-facing validation failures
//!
//! Everything else (I/O, collaborator failures) travels as a plain
//! `eyre::Report` with context attached at the failing step.

use thiserror::Error;

/// A request that was rejected before anything was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("'{0}' is not a date; use YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidDate(String),

    #[error("'{0}' is not an email address")]
    InvalidEmail(String),

    #[error("no tribute with slug '{slug}'{}", suggestion_suffix(.suggestion))]
    UnknownSlug {
        slug: String,
        suggestion: Option<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

/// Closest existing slug, if any is close enough to be a likely typo.
pub fn suggest_slug<'a>(wanted: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|c| (c, strsim::normalized_levenshtein(wanted, c)))
        .filter(|(_, score)| *score >= 0.6)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.to_string())
}

/// Whether the report carries a [`ValidationError`] anywhere in its chain.
pub fn is_validation(report: &eyre::Report) -> bool {
    report
        .chain()
        .any(|cause| cause.downcast_ref::<ValidationError>().is_some())
}
