//! Record store: the single JSON document every page is derived from

use eyre::{Result, WrapErr, bail, eyre};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::record::Tribute;

/// The persisted list of tribute records.
///
/// The store is the only owner of record lifetime. It holds no records
/// itself; every call reads or replaces the whole document.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record, in stored order.
    ///
    /// A missing document is an empty store. A malformed document, an
    /// unreadable date or a duplicated slug fails the whole load.
    pub fn load(&self) -> Result<Vec<Tribute>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no tribute store yet");
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .wrap_err_with(|| format!("Failed to read tribute store {}", self.path.display()))?;

        Self::from_json(&content)
            .wrap_err_with(|| format!("Failed to load tribute store {}", self.path.display()))
    }

    /// Parse and normalize a store document.
    pub fn from_json(content: &str) -> Result<Vec<Tribute>> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut records: Vec<Tribute> =
            facet_json::from_str(content).map_err(|e| eyre!("Malformed tribute store: {e}"))?;

        let mut seen = HashSet::new();
        for (idx, record) in records.iter_mut().enumerate() {
            record
                .normalize()
                .wrap_err_with(|| format!("Invalid tribute record at position {}", idx + 1))?;
            if !seen.insert(record.slug.clone()) {
                bail!("Duplicate tribute slug '{}' in store", record.slug);
            }
        }

        Ok(records)
    }

    /// Replace the document with `records`, in the order given.
    ///
    /// The new content is written beside the old file and renamed over it,
    /// so readers never see a half-written store.
    pub fn save(&self, records: &[Tribute]) -> Result<()> {
        let json = Self::to_json(records)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .wrap_err_with(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .wrap_err_with(|| format!("Failed to replace tribute store {}", self.path.display()))?;

        debug!(path = %self.path.display(), records = records.len(), "saved tribute store");
        Ok(())
    }

    /// Human-readable document text with a trailing newline.
    pub fn to_json(records: &[Tribute]) -> Result<String> {
        let records = records.to_vec();
        let mut json = facet_json::to_string_pretty(&records)
            .map_err(|e| eyre!("Failed to encode tribute store: {e:?}"))?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_STORE: &str = r#"[
  {
    "slug": "biscuit-golden-retriever",
    "pet_name": "Biscuit",
    "breed": "Golden Retriever",
    "years_pretty": "2008-2019",
    "excerpt": "Biscuit loved the lake.",
    "first_name": "Dana",
    "state": "Ohio",
    "published_iso": "2026-02-01",
    "image_filename": "biscuit-golden-retriever.webp",
    "legacy_color": "gold"
  }
]"#;

    fn sample(slug: &str) -> Tribute {
        Tribute {
            slug: slug.to_string(),
            name: "Biscuit".to_string(),
            category: "Dog".to_string(),
            published_at: "2025-03-04T05:06:07".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn legacy_records_are_normalized() {
        let records = RecordStore::from_json(LEGACY_STORE).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Biscuit");
        assert_eq!(record.folder, "");
        assert_eq!(record.category, "");
        assert_eq!(record.life_span, "2008 – 2019");
        assert_eq!(record.published_at, "2026-02-01T00:00:00");
        assert!(!record.featured);
        assert!(!record.notification_sent);
    }

    #[test]
    fn byte_order_mark_is_tolerated() {
        let with_bom = format!("\u{feff}{LEGACY_STORE}");
        assert_eq!(RecordStore::from_json(&with_bom).unwrap().len(), 1);
    }

    #[test]
    fn malformed_document_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "[{\"slug\": \"a\", \"published_iso\": \"2025-01-01\"},").unwrap();
        assert!(RecordStore::new(&path).load().is_err());
    }

    #[test]
    fn duplicate_slugs_fail_load() {
        let doc = r#"[
            {"slug": "a", "published_iso": "2025-01-01"},
            {"slug": "a", "published_iso": "2025-01-02"}
        ]"#;
        let err = format!("{:#}", RecordStore::from_json(doc).unwrap_err());
        assert!(err.contains("Duplicate"), "unexpected error: {err}");
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("nested").join("data.json"));

        let mut second = sample("second");
        second.featured = true;
        second.email = "dana@example.com".to_string();
        let records = vec![sample("first"), second, sample("third")];

        store.save(&records).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn saved_document_is_readable_and_stable() {
        let records = vec![sample("first")];
        let a = RecordStore::to_json(&records).unwrap();
        let b = RecordStore::to_json(&records).unwrap();
        assert_eq!(a, b);
        assert!(a.contains('\n'), "expected indented output");
        assert!(a.contains("\"pet_name\""));
        assert!(a.find("\"slug\"") < a.find("\"pet_name\""));
    }
}
