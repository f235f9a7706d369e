//! Tribute photo placement

use eyre::{Result, WrapErr, bail};
use std::path::Path;
use tracing::debug;

/// Places a source image beside a detail page and reports its file name.
pub trait ImageProcessor {
    /// Process `source` into `dest_dir` using `stem` as the file stem.
    fn process(&self, source: &Path, dest_dir: &Path, stem: &str) -> Result<String>;
}

const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Copies already-prepared images without re-encoding them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyImage;

impl ImageProcessor for CopyImage {
    fn process(&self, source: &Path, dest_dir: &Path, stem: &str) -> Result<String> {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
            bail!(
                "Unsupported image type for {} (expected one of: {})",
                source.display(),
                ACCEPTED_EXTENSIONS.join(", ")
            );
        }

        std::fs::create_dir_all(dest_dir)
            .wrap_err_with(|| format!("Failed to create {}", dest_dir.display()))?;

        let file_name = format!("{stem}.{ext}");
        let dest = dest_dir.join(&file_name);
        std::fs::copy(source, &dest).wrap_err_with(|| {
            format!("Failed to copy image {} to {}", source.display(), dest.display())
        })?;

        debug!(from = %source.display(), to = %dest.display(), "placed tribute image");
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_with_normalized_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("IMG_0001.JPG");
        std::fs::write(&source, b"jpeg bytes").unwrap();

        let dest = dir.path().join("out");
        let name = CopyImage.process(&source, &dest, "biscuit").unwrap();
        assert_eq!(name, "biscuit.jpg");
        assert_eq!(std::fs::read(dest.join("biscuit.jpg")).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn rejects_unknown_types() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"text").unwrap();
        assert!(CopyImage.process(&source, dir.path(), "x").is_err());
    }
}
