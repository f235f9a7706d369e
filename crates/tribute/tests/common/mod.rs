//! Common test utilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tribute::{Config, NewTribute, Publisher, Site};
use tribute_core::RecordStore;

/// A throwaway site rooted in a temp dir.
pub struct TestSite {
    pub dir: tempfile::TempDir,
    pub publisher: Publisher,
}

impl TestSite {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let site = Site::resolve(&config, dir.path()).expect("Failed to resolve site");
        let publisher = Publisher::new(site).expect("Failed to build publisher");
        Self { dir, publisher }
    }

    pub fn site(&self) -> &Site {
        self.publisher.site()
    }

    pub fn root(&self) -> &Path {
        &self.site().output_root
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(self.site().data_file.clone())
    }

    /// Relative path under the output root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("Failed to read {rel}: {e}"))
    }

    /// Publish `count` dogs dated one day apart, oldest first.
    pub fn publish_dogs(&self, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                self.publisher
                    .create(tribute(&format!("Dog {i}"), "Dog", &day(i)))
                    .expect("Failed to publish")
                    .slug
            })
            .collect()
    }
}

/// A minimal valid submission.
pub fn tribute(name: &str, category: &str, date: &str) -> NewTribute {
    NewTribute {
        name: name.to_string(),
        category: category.to_string(),
        message: format!("{name} was loved."),
        published_at: Some(date.to_string()),
        ..Default::default()
    }
}

/// `2024-01-01` plus `offset` days, as `YYYY-MM-DD`.
pub fn day(offset: usize) -> String {
    let date = time::Date::from_calendar_date(2024, time::Month::January, 1)
        .expect("valid date")
        + time::Duration::days(offset as i64);
    date.to_string()
}

/// Names of the `page-N` folders directly under `dir`, sorted.
pub fn page_dirs(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().to_str().map(str::to_string))
                .filter(|n| n.starts_with("page-"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
