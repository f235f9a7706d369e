//! Configuration schema for the tribute publisher
//!
//! Config lives at `.config/tributes/config.yaml` relative to the project
//! root. Every key is optional; a missing file means all defaults.

use eyre::{Result, WrapErr};
use facet::Facet;
use std::path::{Path, PathBuf};
use tribute_core::{PAGE_SIZE, Tribute, slugify};

use crate::errors::ValidationError;

/// Default location of the config file, relative to the project root.
pub const DEFAULT_CONFIG_PATH: &str = ".config/tributes/config.yaml";

/// Root configuration as written by the operator
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Scheme and host used for canonical and sitemap URLs
    #[facet(default)]
    pub site_domain: Option<String>,

    /// Organisation name used in Open Graph and schema blocks
    #[facet(default)]
    pub site_name: Option<String>,

    /// Directory the archive is generated into (relative to the project root)
    #[facet(default)]
    pub output_root: Option<String>,

    /// URL path the output root is served under, e.g. `/pet-tributes/`
    #[facet(default)]
    pub url_prefix: Option<String>,

    /// Record store file name (relative to the output root)
    #[facet(default)]
    pub data_file: Option<String>,

    #[facet(default)]
    pub page_size: Option<usize>,

    /// Folder holding the per-type archives
    #[facet(default)]
    pub category_dir: Option<String>,

    #[facet(default)]
    pub stylesheet: Option<String>,

    #[facet(default)]
    pub script: Option<String>,

    /// Image URL shown when a tribute has no photo
    #[facet(default)]
    pub placeholder_image: Option<String>,

    /// Page-shell template file (relative to the project root)
    #[facet(default)]
    pub template: Option<String>,

    #[facet(default)]
    pub submit_url: Option<String>,

    #[facet(default)]
    pub shop_url: Option<String>,

    /// `remove` (default) or `keep`: what to do with a pet-type archive
    /// whose last tribute was deleted
    #[facet(default)]
    pub empty_categories: Option<String>,
}

/// What happens to a per-type archive that no longer has any tributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyCategoryPolicy {
    /// Delete the whole archive folder.
    #[default]
    Remove,
    /// Keep the folder with an empty first page, dropped from the sitemap.
    Keep,
}

/// Fully resolved site layout. Built once per command and passed by
/// reference to every engine step.
#[derive(Debug, Clone)]
pub struct Site {
    pub domain: String,
    pub name: String,
    pub output_root: PathBuf,
    pub url_prefix: String,
    pub data_file: PathBuf,
    pub page_size: usize,
    pub category_dir: String,
    pub stylesheet: String,
    pub script: Option<String>,
    pub placeholder_image: String,
    pub template: Option<PathBuf>,
    pub submit_url: String,
    pub shop_url: String,
    pub empty_categories: EmptyCategoryPolicy,
}

impl Site {
    /// Resolve `config` against the project root.
    pub fn resolve(config: &Config, project_root: &Path) -> Result<Self> {
        let page_size = config.page_size.unwrap_or(PAGE_SIZE);
        if page_size == 0 {
            return Err(ValidationError::Config("page_size must be at least 1".into()).into());
        }

        let empty_categories = match config.empty_categories.as_deref() {
            None | Some("remove") => EmptyCategoryPolicy::Remove,
            Some("keep") => EmptyCategoryPolicy::Keep,
            Some(other) => {
                return Err(ValidationError::Config(format!(
                    "empty_categories must be 'remove' or 'keep', not '{other}'"
                ))
                .into());
            }
        };

        let category_dir = slugify(config.category_dir.as_deref().unwrap_or("type"));
        if category_dir.is_empty() {
            return Err(ValidationError::Config("category_dir must not be empty".into()).into());
        }

        let output_root =
            project_root.join(config.output_root.as_deref().unwrap_or("output/pet-tributes"));
        let data_file = output_root.join(config.data_file.as_deref().unwrap_or("data.json"));

        Ok(Self {
            domain: config
                .site_domain
                .as_deref()
                .unwrap_or("https://meltonmemorials.com")
                .trim_end_matches('/')
                .to_string(),
            name: config
                .site_name
                .clone()
                .unwrap_or_else(|| "Melton Memorials".to_string()),
            output_root,
            url_prefix: normalize_prefix(config.url_prefix.as_deref().unwrap_or("/pet-tributes/")),
            data_file,
            page_size,
            category_dir,
            stylesheet: config
                .stylesheet
                .clone()
                .unwrap_or_else(|| "/pet-tributes/assets/mm-tribute.css".to_string()),
            script: Some(
                config
                    .script
                    .clone()
                    .unwrap_or_else(|| "/pet-tributes/assets/mm-tribute.js".to_string()),
            )
            .filter(|s| !s.is_empty()),
            placeholder_image: config
                .placeholder_image
                .clone()
                .unwrap_or_else(|| "/pet-tributes/assets/blank-stone.webp".to_string()),
            template: config.template.as_ref().map(|t| project_root.join(t)),
            submit_url: config
                .submit_url
                .clone()
                .unwrap_or_else(|| "/submit-a-tribute/".to_string()),
            shop_url: config.shop_url.clone().unwrap_or_else(|| "/shop/".to_string()),
            empty_categories,
        })
    }

    /// Defaults rooted at `project_root`.
    pub fn with_defaults(project_root: &Path) -> Result<Self> {
        Self::resolve(&Config::default(), project_root)
    }

    /// Absolute URL for a site path.
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.domain, path)
        }
    }

    /// URL path of a record's detail page.
    pub fn detail_url(&self, record: &Tribute) -> String {
        format!("{}{}/", self.url_prefix, record.detail_path())
    }

    /// Directory holding a record's detail page and images.
    pub fn detail_dir(&self, record: &Tribute) -> PathBuf {
        self.output_root.join(record.detail_path())
    }

    /// URL of an image beside a record's detail page, or the placeholder.
    pub fn image_url(&self, record: &Tribute, file_name: &str) -> String {
        if file_name.is_empty() {
            self.placeholder_image.clone()
        } else {
            format!("{}{}", self.detail_url(record), file_name)
        }
    }

    /// Folder holding every per-type archive.
    pub fn categories_root(&self) -> PathBuf {
        self.output_root.join(&self.category_dir)
    }

    /// Listing root folder for one pet type.
    pub fn category_dir(&self, category_slug: &str) -> PathBuf {
        self.categories_root().join(category_slug)
    }

    /// Listing root URL for one pet type.
    pub fn category_url(&self, category_slug: &str) -> String {
        format!("{}{}/{}/", self.url_prefix, self.category_dir, category_slug)
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.output_root.join("sitemap.xml")
    }

    /// Names directly under the output root that never hold a detail page.
    pub fn is_reserved_dir(&self, name: &str) -> bool {
        name == "assets" || name == self.category_dir || tribute_core::parse_page_dir(name).is_some()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Find the project root by walking up from the current directory until a
/// config file is found. Falls back to the current directory.
pub fn find_project_root() -> Result<PathBuf> {
    let start = std::env::current_dir().wrap_err("Failed to get current directory")?;
    let mut current = start.clone();

    loop {
        if current.join(DEFAULT_CONFIG_PATH).exists() {
            return Ok(current);
        }

        if !current.pop() {
            return Ok(start);
        }
    }
}

/// Load the config file, failing if it is missing or malformed.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    facet_yaml::from_str(&content)
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load config if it exists, otherwise return the default config.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    load_config(path)
}
