//! tribute library - static memorial archive publishing
//!
//! The `tributes` binary is a thin front end over [`publisher::Publisher`];
//! everything it does is available here for testing and embedding.

pub mod archive;
pub mod body;
pub mod config;
pub mod detail;
pub mod errors;
pub mod html;
pub mod image;
pub mod publisher;
pub mod shell;
pub mod sitemap;

use eyre::{Result, WrapErr};
use std::path::Path;
use tracing::debug;

pub use config::{Config, EmptyCategoryPolicy, Site};
pub use errors::ValidationError;
pub use publisher::{NewTribute, Publisher, TributeEdit};

/// Write a whole generated file, creating its folder if needed.
pub(crate) fn write_page(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote page");
    Ok(())
}
