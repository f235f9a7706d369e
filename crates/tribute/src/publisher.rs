//! Publishing workflows
//!
//! Every mutation runs the same commit sequence: settle the display order,
//! save the store, regenerate the global archive, the per-type archives and
//! the sitemap, then write the affected detail pages. A failure after the
//! save leaves the store updated and the pages stale; `rebuild` repairs that.

use eyre::{Result, WrapErr};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, warn};
use tribute_core::{
    DisplayOrder, RecordStore, Tribute, allocate_slug, derive_excerpt, format_timestamp,
    normalize_life_span, normalize_timestamp, slugify,
};

use crate::archive::{self, ArchiveReport};
use crate::body::{BodyRenderer, MarkupBody};
use crate::config::Site;
use crate::detail;
use crate::errors::{ValidationError, suggest_slug};
use crate::image::{CopyImage, ImageProcessor};
use crate::shell::{PageShell, TemplateShell};
use crate::sitemap;

/// A tribute as submitted for publication.
#[derive(Debug, Clone, Default)]
pub struct NewTribute {
    pub name: String,
    pub category: String,
    pub breed: String,
    pub life_span: String,
    /// Operator-entered message, rendered by the body renderer
    pub message: String,
    pub first_name: String,
    pub state: String,
    pub email: String,
    /// Publish timestamp; `None` means now
    pub published_at: Option<String>,
    /// Pin to the front of the archive, demoting any other featured tribute
    pub featured: bool,
    pub primary_image: Option<PathBuf>,
    pub secondary_image: Option<PathBuf>,
}

/// Changes to an existing tribute. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct TributeEdit {
    pub name: Option<String>,
    pub category: Option<String>,
    pub breed: Option<String>,
    pub life_span: Option<String>,
    /// Replacement message; without one the rendered message is kept
    pub message: Option<String>,
    pub first_name: Option<String>,
    pub state: Option<String>,
    pub email: Option<String>,
    pub published_at: Option<String>,
    pub featured: Option<bool>,
    pub notification_sent: Option<bool>,
    pub primary_image: Option<PathBuf>,
    pub secondary_image: Option<PathBuf>,
    pub clear_secondary_image: bool,
}

/// What a commit regenerated.
#[derive(Debug, Clone)]
pub struct Regeneration {
    pub global: ArchiveReport,
    pub categories: Vec<ArchiveReport>,
    pub pruned_categories: Vec<String>,
    pub demoted: Vec<String>,
    pub sitemap: PathBuf,
    pub detail_pages: Vec<PathBuf>,
}

impl Regeneration {
    pub fn listing_pages(&self) -> usize {
        self.global.page_count() + self.categories.iter().map(ArchiveReport::page_count).sum::<usize>()
    }
}

/// Result of a create, edit or delete.
#[derive(Debug, Clone)]
pub struct Published {
    pub slug: String,
    pub regeneration: Regeneration,
}

/// Runs the workflows against one site.
pub struct Publisher {
    site: Site,
    store: RecordStore,
    shell: Box<dyn PageShell>,
    body: Box<dyn BodyRenderer>,
    images: Box<dyn ImageProcessor>,
}

impl Publisher {
    /// Publisher with the default collaborators, using the configured page
    /// template when there is one.
    pub fn new(site: Site) -> Result<Self> {
        let shell = match &site.template {
            Some(path) => TemplateShell::load(path)?,
            None => TemplateShell::builtin(),
        };
        Ok(Self::with_collaborators(
            site,
            Box::new(shell),
            Box::new(MarkupBody),
            Box::new(CopyImage),
        ))
    }

    pub fn with_collaborators(
        site: Site,
        shell: Box<dyn PageShell>,
        body: Box<dyn BodyRenderer>,
        images: Box<dyn ImageProcessor>,
    ) -> Self {
        let store = RecordStore::new(site.data_file.clone());
        Self {
            site,
            store,
            shell,
            body,
            images,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Every record in display order.
    pub fn list(&self) -> Result<Vec<Tribute>> {
        let mut records = self.store.load()?;
        let order = DisplayOrder::compute(&mut records);
        Ok(order.records(&records).into_iter().cloned().collect())
    }

    /// Records whose submitter has not been sent a publish notice yet.
    pub fn pending_notices(&self) -> Result<Vec<Tribute>> {
        Ok(self.list()?.into_iter().filter(Tribute::notice_pending).collect())
    }

    /// Publish a new tribute.
    pub fn create(&self, new: NewTribute) -> Result<Published> {
        let name = required(&new.name, "pet name")?;
        required(&new.message, "message")?;
        let published_at = match new.published_at.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => checked_timestamp(value)?,
            _ => now_timestamp(),
        };
        check_email(&new.email)?;

        let mut records = self.store.load()?;
        let folder = self.group_folder(&new.category, &records);
        let slug = self.allocate(&name, &new, &folder, &records);

        let mut record = Tribute {
            slug: slug.clone(),
            folder,
            name,
            category: new.category.trim().to_string(),
            breed: new.breed.trim().to_string(),
            life_span: normalize_life_span(&new.life_span),
            excerpt: derive_excerpt(&new.message),
            first_name: new.first_name.trim().to_string(),
            state: new.state.trim().to_string(),
            email: new.email.trim().to_string(),
            notification_sent: false,
            primary_image: String::new(),
            secondary_image: String::new(),
            published_at,
            featured: new.featured,
        };

        let body = self
            .body
            .render(&new.message)
            .wrap_err_with(|| format!("Failed to render message for '{slug}'"))?;

        let dir = self.site.detail_dir(&record);
        let fresh = !dir.exists();
        let placed = self.place_images(
            &dir,
            &slug,
            new.primary_image.as_deref(),
            new.secondary_image.as_deref(),
            &[],
        );
        let (primary, secondary) = match placed {
            Ok(placed) => placed,
            Err(err) => {
                if fresh {
                    discard_detail_dir(&dir, !record.folder.is_empty());
                }
                return Err(err);
            }
        };
        record.primary_image = primary.unwrap_or_default();
        record.secondary_image = secondary.unwrap_or_default();

        if record.featured {
            unfeature_all(&mut records);
        }
        records.push(record);
        info!(slug = %slug, "publishing tribute");

        let regeneration = self.commit(&mut records, &[(slug.as_str(), Some(body))])?;
        Ok(Published { slug, regeneration })
    }

    /// Apply `edit` to the tribute with `slug`.
    pub fn edit(&self, slug: &str, edit: TributeEdit) -> Result<Published> {
        let published_at = edit
            .published_at
            .as_deref()
            .map(checked_timestamp)
            .transpose()?;
        if let Some(email) = &edit.email {
            check_email(email)?;
        }
        let name = edit.name.as_deref().map(|n| required(n, "pet name")).transpose()?;
        if let Some(message) = &edit.message {
            required(message, "message")?;
        }

        let mut records = self.store.load()?;
        let idx = find(&records, slug)?;

        let body = match &edit.message {
            Some(message) => Some(
                self.body
                    .render(message)
                    .wrap_err_with(|| format!("Failed to render message for '{slug}'"))?,
            ),
            None => None,
        };

        let current = &records[idx];
        let dir = self.site.detail_dir(current);
        let (primary, secondary) = self.place_images(
            &dir,
            &current.slug,
            edit.primary_image.as_deref(),
            edit.secondary_image.as_deref(),
            &[current.primary_image.as_str(), current.secondary_image.as_str()],
        )?;

        if edit.featured == Some(true) {
            unfeature_all(&mut records);
        }

        let record = &mut records[idx];
        if let Some(name) = name {
            record.name = name;
        }
        if let Some(category) = edit.category {
            record.category = category.trim().to_string();
        }
        if let Some(breed) = edit.breed {
            record.breed = breed.trim().to_string();
        }
        if let Some(life_span) = edit.life_span {
            record.life_span = normalize_life_span(&life_span);
        }
        if let Some(message) = &edit.message {
            record.excerpt = derive_excerpt(message);
        }
        if let Some(first_name) = edit.first_name {
            record.first_name = first_name.trim().to_string();
        }
        if let Some(state) = edit.state {
            record.state = state.trim().to_string();
        }
        if let Some(email) = edit.email {
            record.email = email.trim().to_string();
        }
        if let Some(published_at) = published_at {
            record.published_at = published_at;
        }
        if let Some(featured) = edit.featured {
            record.featured = featured;
        }
        if let Some(sent) = edit.notification_sent {
            record.notification_sent = sent;
        }

        let mut superseded = Vec::new();
        if let Some(placed) = primary {
            supersede(&mut record.primary_image, placed, &mut superseded);
        }
        if let Some(placed) = secondary {
            supersede(&mut record.secondary_image, placed, &mut superseded);
        } else if edit.clear_secondary_image {
            supersede(&mut record.secondary_image, String::new(), &mut superseded);
        }

        let slug = record.slug.clone();
        info!(slug = %slug, "editing tribute");
        let regeneration = self.commit(&mut records, &[(slug.as_str(), body)])?;
        // old photos go only once nothing references them
        remove_superseded(&dir, &superseded);
        Ok(Published { slug, regeneration })
    }

    /// Remove a tribute and its detail folder.
    pub fn delete(&self, slug: &str) -> Result<Published> {
        let mut records = self.store.load()?;
        let idx = find(&records, slug)?;
        let removed = records.remove(idx);
        info!(slug = %removed.slug, "deleting tribute");

        let regeneration = self.commit(&mut records, &[])?;
        detail::remove_detail_page(&self.site, &removed)?;
        Ok(Published {
            slug: removed.slug,
            regeneration,
        })
    }

    /// Regenerate every page from the store as it is.
    pub fn rebuild(&self) -> Result<Regeneration> {
        let mut records = self.store.load()?;
        let slugs: Vec<String> = records.iter().map(|r| r.slug.clone()).collect();
        let details: Vec<(&str, Option<String>)> = slugs.iter().map(|s| (s.as_str(), None)).collect();
        info!(tributes = records.len(), "rebuilding archive");
        self.commit(&mut records, &details)
    }

    /// Add detail folders that predate the store.
    ///
    /// Flat folders under the output root whose `index.html` carries a
    /// tribute heading are read back into records dated by the page's
    /// modification time. Returns the imported slugs, oldest first.
    pub fn import_legacy(&self) -> Result<Vec<String>> {
        let mut records = self.store.load()?;
        let known: HashSet<String> = records
            .iter()
            .flat_map(|r| [r.slug.clone(), r.folder.clone()])
            .filter(|s| !s.is_empty())
            .collect();

        let mut found = Vec::new();
        let root = &self.site.output_root;
        if root.is_dir() {
            let entries = std::fs::read_dir(root)
                .wrap_err_with(|| format!("Failed to list {}", root.display()))?;
            for entry in entries {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                if self.site.is_reserved_dir(&name) || known.contains(&name) {
                    continue;
                }
                if slugify(&name) != name {
                    warn!(dir = %entry.path().display(), "skipped folder whose name is not a valid slug");
                    continue;
                }
                if let Some(record) = recover_legacy(&entry.path(), &name)? {
                    found.push(record);
                } else {
                    debug!(dir = %entry.path().display(), "skipped folder without a tribute page");
                }
            }
        }

        if found.is_empty() {
            info!("no legacy tribute folders to import");
            return Ok(Vec::new());
        }

        found.sort_by(|a, b| a.published_at.cmp(&b.published_at).then_with(|| a.slug.cmp(&b.slug)));
        let slugs: Vec<String> = found.iter().map(|r| r.slug.clone()).collect();
        records.extend(found);
        info!(imported = slugs.len(), "importing legacy tributes");

        let details: Vec<(&str, Option<String>)> = slugs.iter().map(|s| (s.as_str(), None)).collect();
        self.commit(&mut records, &details)?;
        Ok(slugs)
    }

    /// Order, save, then regenerate everything derived from `records`.
    fn commit(&self, records: &mut [Tribute], details: &[(&str, Option<String>)]) -> Result<Regeneration> {
        let order = DisplayOrder::compute(records);
        self.store.save(records)?;

        let ordered = order.records(records);
        let global = archive::regenerate_global(&self.site, self.shell.as_ref(), &ordered)
            .wrap_err("Failed to regenerate the archive; run `tributes rebuild` to repair")?;
        let categories = archive::regenerate_categories(&self.site, self.shell.as_ref(), &ordered)
            .wrap_err("Failed to regenerate type archives; run `tributes rebuild` to repair")?;
        let sitemap = sitemap::write_sitemap(&self.site, &global, &categories.archives, &ordered)?;

        let mut detail_pages = Vec::with_capacity(details.len());
        for (slug, body) in details {
            let Some(record) = records.iter().find(|r| r.slug == *slug) else {
                continue;
            };
            let path = detail::sync_detail_page(&self.site, self.shell.as_ref(), record, body.as_deref())
                .wrap_err_with(|| format!("Failed to write detail page for '{slug}'"))?;
            detail_pages.push(path);
        }

        Ok(Regeneration {
            global,
            categories: categories.archives,
            pruned_categories: categories.pruned,
            demoted: order.demoted().to_vec(),
            sitemap,
            detail_pages,
        })
    }

    /// Group folder for a new tribute: the slugified pet type, kept clear
    /// of reserved names and of legacy flat detail folders.
    fn group_folder(&self, category: &str, records: &[Tribute]) -> String {
        let folder = slugify(category);
        if folder.is_empty() {
            return folder;
        }
        let clashes = self.site.is_reserved_dir(&folder)
            || records.iter().any(|r| r.folder.is_empty() && r.slug == folder);
        if clashes {
            format!("{folder}-tributes")
        } else {
            folder
        }
    }

    fn allocate(&self, name: &str, new: &NewTribute, folder: &str, records: &[Tribute]) -> String {
        let mut taken: HashSet<String> = records.iter().map(|r| r.slug.clone()).collect();
        if folder.is_empty() {
            // flat pages share the output root with group folders
            taken.extend(records.iter().map(|r| r.folder.clone()).filter(|f| !f.is_empty()));
        }
        loop {
            let candidate = allocate_slug(name, &new.category, &new.breed, &taken);
            if folder.is_empty() && self.site.is_reserved_dir(&candidate) {
                taken.insert(candidate);
                continue;
            }
            return candidate;
        }
    }

    /// Place the submitted photos in `dir` before any record changes.
    ///
    /// When the second photo fails, a first photo that nothing in `in_use`
    /// names is removed again, so a failed change leaves no new files.
    fn place_images(
        &self,
        dir: &Path,
        slug: &str,
        primary: Option<&Path>,
        secondary: Option<&Path>,
        in_use: &[&str],
    ) -> Result<(Option<String>, Option<String>)> {
        let primary = primary
            .map(|source| self.images.process(source, dir, slug))
            .transpose()?;
        let secondary = match secondary {
            Some(source) => match self.images.process(source, dir, &format!("{slug}-2")) {
                Ok(placed) => Some(placed),
                Err(err) => {
                    if let Some(placed) = primary.as_deref().filter(|p| !in_use.contains(p)) {
                        remove_superseded(dir, &[placed.to_string()]);
                    }
                    return Err(err);
                }
            },
            None => None,
        };
        Ok((primary, secondary))
    }
}

fn required(value: &str, field: &'static str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field).into());
    }
    Ok(value.to_string())
}

fn checked_timestamp(value: &str) -> Result<String> {
    normalize_timestamp(value).ok_or_else(|| ValidationError::InvalidDate(value.trim().to_string()).into())
}

fn check_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()).into())
    }
}

fn now_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(PrimitiveDateTime::new(now.date(), now.time()))
}

fn find(records: &[Tribute], slug: &str) -> Result<usize> {
    records.iter().position(|r| r.slug == slug).ok_or_else(|| {
        ValidationError::UnknownSlug {
            slug: slug.to_string(),
            suggestion: suggest_slug(slug, records.iter().map(|r| r.slug.as_str())),
        }
        .into()
    })
}

fn unfeature_all(records: &mut [Tribute]) {
    for record in records.iter_mut().filter(|r| r.featured) {
        debug!(slug = %record.slug, "unfeaturing for new featured tribute");
        record.featured = false;
    }
}

/// Point `slot` at `placed`, remembering the file it named before.
fn supersede(slot: &mut String, placed: String, superseded: &mut Vec<String>) {
    if !slot.is_empty() && *slot != placed {
        superseded.push(std::mem::take(slot));
    }
    *slot = placed;
}

fn remove_superseded(dir: &Path, files: &[String]) {
    for file in files {
        let path = dir.join(file);
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed replaced image"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove replaced image"),
        }
    }
}

/// Remove a detail folder created for a submission that was rejected.
fn discard_detail_dir(dir: &Path, grouped: bool) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %dir.display(), error = %e, "failed to remove abandoned tribute folder");
        }
        return;
    }
    if grouped && let Some(group) = dir.parent() {
        // only succeeds when the group folder is empty
        let _ = std::fs::remove_dir(group);
    }
}

fn recover_legacy(dir: &Path, name: &str) -> Result<Option<Tribute>> {
    let index = dir.join("index.html");
    if !index.is_file() {
        return Ok(None);
    }
    let html = std::fs::read_to_string(&index)
        .wrap_err_with(|| format!("Failed to read {}", index.display()))?;
    let Some(fields) = detail::recover_fields(&html) else {
        return Ok(None);
    };

    let modified = std::fs::metadata(&index)
        .and_then(|m| m.modified())
        .map(OffsetDateTime::from)
        .unwrap_or_else(|_| OffsetDateTime::now_utc());
    let date = PrimitiveDateTime::new(modified.date(), time::Time::MIDNIGHT);

    let mut images: Vec<String> = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|file| {
            let lower = file.to_ascii_lowercase();
            [".webp", ".jpg", ".jpeg", ".png", ".gif"]
                .iter()
                .any(|ext| lower.ends_with(ext))
        })
        .collect();
    images.sort();

    if fields.name.is_empty() {
        warn!(dir = %dir.display(), "legacy page has an empty name");
    }

    Ok(Some(Tribute {
        slug: name.to_string(),
        name: if fields.name.is_empty() { name.to_string() } else { fields.name },
        breed: fields.breed,
        life_span: normalize_life_span(&fields.life_span),
        excerpt: fields.excerpt,
        first_name: fields.first_name,
        state: fields.state,
        primary_image: images.into_iter().next().unwrap_or_default(),
        published_at: format_timestamp(date),
        ..Default::default()
    }))
}
