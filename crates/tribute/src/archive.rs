//! Listing archives: the global archive and one archive per pet type
//!
//! Each archive is regenerated as a whole: numbered page folders left by a
//! previous run are removed first, then every page implied by the current
//! record order is written. A shrinking archive therefore never leaves an
//! orphaned trailing page behind.

use eyre::{Result, WrapErr};
use facet::Facet;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use tracing::{debug, info, warn};
use tribute_core::{PageLinks, Tribute, page_count, page_dir_name, paginate, parse_page_dir, slugify};

use crate::config::{EmptyCategoryPolicy, Site};
use crate::html::{html_escape, json_ld, meta_name};
use crate::shell::{PageShell, ShellInput};
use crate::write_page;

const ARCHIVE_TITLE: &str = "Pet Memorial Tributes";

/// One independently paginated listing.
#[derive(Debug, Clone)]
pub struct Grouping<'a> {
    /// Heading shown on every page
    pub title: String,
    pub intro: String,
    pub root_dir: PathBuf,
    pub url_prefix: String,
    /// Members in display order
    pub members: Vec<&'a Tribute>,
}

/// A pet type present in the current record set.
#[derive(Debug, Clone)]
pub struct Category<'a> {
    pub slug: String,
    /// Display label, taken from the first member in display order
    pub label: String,
    pub members: Vec<&'a Tribute>,
}

/// What one archive regeneration wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub root_dir: PathBuf,
    /// Canonical URL of every page written, page 1 first
    pub page_urls: Vec<String>,
    /// Page folders from a previous run numbered past the current last page
    pub stale_pages: usize,
}

impl ArchiveReport {
    pub fn page_count(&self) -> usize {
        self.page_urls.len()
    }
}

/// Outcome of regenerating every per-type archive.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegeneration {
    /// Archives for types that still have tributes, in slug order
    pub archives: Vec<ArchiveReport>,
    /// Type folders deleted because no tribute uses them any more
    pub pruned: Vec<String>,
    /// Type folders kept as empty, unlisted archives
    pub delisted: Vec<String>,
}

impl<'a> Grouping<'a> {
    /// The archive of every tribute.
    pub fn global(site: &Site, ordered: &[&'a Tribute]) -> Self {
        Self {
            title: ARCHIVE_TITLE.to_string(),
            intro: "A public archive honoring beloved companions and the memories they leave behind."
                .to_string(),
            root_dir: site.output_root.clone(),
            url_prefix: site.url_prefix.clone(),
            members: ordered.to_vec(),
        }
    }

    /// The archive of one pet type.
    pub fn category(site: &Site, category: &Category<'a>) -> Self {
        Self {
            title: format!("{} Memorial Tributes", title_case(&category.label)),
            intro: format!(
                "Tributes to beloved {} companions and the memories they leave behind.",
                category.label.to_lowercase()
            ),
            root_dir: site.category_dir(&category.slug),
            url_prefix: site.category_url(&category.slug),
            members: category.members.clone(),
        }
    }

    /// Whether this is the archive of every tribute rather than one type.
    fn is_global(&self, site: &Site) -> bool {
        self.url_prefix == site.url_prefix
    }
}

/// Group display-ordered records by slugified pet type.
///
/// Records with an empty type belong to no per-type archive. Members keep
/// the display order they were given in.
pub fn categories<'a>(ordered: &[&'a Tribute]) -> Vec<Category<'a>> {
    let mut by_slug: BTreeMap<String, Category<'a>> = BTreeMap::new();
    for &record in ordered {
        let slug = slugify(&record.category);
        if slug.is_empty() {
            continue;
        }
        by_slug
            .entry(slug.clone())
            .or_insert_with(|| Category {
                slug,
                label: record.category.trim().to_string(),
                members: Vec::new(),
            })
            .members
            .push(record);
    }
    by_slug.into_values().collect()
}

/// Regenerate the global archive. Always writes at least one page.
pub fn regenerate_global(
    site: &Site,
    shell: &dyn PageShell,
    ordered: &[&Tribute],
) -> Result<ArchiveReport> {
    let grouping = Grouping::global(site, ordered);
    let report = regenerate(site, shell, &grouping)?;
    info!(
        tributes = ordered.len(),
        pages = report.page_count(),
        stale = report.stale_pages,
        "regenerated global archive"
    );
    Ok(report)
}

/// Regenerate one archive per pet type and clean up types that vanished.
pub fn regenerate_categories(
    site: &Site,
    shell: &dyn PageShell,
    ordered: &[&Tribute],
) -> Result<CategoryRegeneration> {
    let current = categories(ordered);
    let mut outcome = CategoryRegeneration::default();

    for category in &current {
        let grouping = Grouping::category(site, category);
        let report = regenerate(site, shell, &grouping)
            .wrap_err_with(|| format!("Failed to regenerate '{}' archive", category.label))?;
        debug!(
            category = %category.slug,
            tributes = category.members.len(),
            pages = report.page_count(),
            "regenerated type archive"
        );
        outcome.archives.push(report);
    }

    let live: Vec<&str> = current.iter().map(|c| c.slug.as_str()).collect();
    for leftover in leftover_category_dirs(site, &live)? {
        let dir = site.category_dir(&leftover);
        match site.empty_categories {
            EmptyCategoryPolicy::Remove => {
                std::fs::remove_dir_all(&dir)
                    .wrap_err_with(|| format!("Failed to remove {}", dir.display()))?;
                warn!(category = %leftover, "removed empty type archive");
                outcome.pruned.push(leftover);
            }
            EmptyCategoryPolicy::Keep => {
                let grouping = Grouping::category(
                    site,
                    &Category {
                        slug: leftover.clone(),
                        label: leftover.replace('-', " "),
                        members: Vec::new(),
                    },
                );
                regenerate(site, shell, &grouping)?;
                warn!(category = %leftover, "kept empty type archive out of the sitemap");
                outcome.delisted.push(leftover);
            }
        }
    }

    info!(
        archives = outcome.archives.len(),
        pruned = outcome.pruned.len(),
        delisted = outcome.delisted.len(),
        "regenerated type archives"
    );
    Ok(outcome)
}

/// Make the pages under `grouping.root_dir` match its members exactly.
pub fn regenerate(site: &Site, shell: &dyn PageShell, grouping: &Grouping<'_>) -> Result<ArchiveReport> {
    let removed = remove_page_dirs(&grouping.root_dir)?;

    let pages = paginate(&grouping.members, site.page_size);
    let total = page_count(grouping.members.len(), site.page_size);
    let stale_pages = removed.iter().filter(|&&n| n > total).count();
    let mut page_urls = Vec::with_capacity(total);

    for (idx, members) in pages.iter().enumerate() {
        let links = PageLinks::new(&grouping.url_prefix, idx + 1, total);
        let html = render_listing_page(site, shell, grouping, members, &links)?;
        let path = page_path(&grouping.root_dir, links.number);
        write_page(&path, &html)?;
        page_urls.push(links.url);
    }

    Ok(ArchiveReport {
        root_dir: grouping.root_dir.clone(),
        page_urls,
        stale_pages,
    })
}

/// File a listing page is written to.
pub fn page_path(root: &Path, number: usize) -> PathBuf {
    match page_dir_name(number) {
        Some(dir) => root.join(dir).join("index.html"),
        None => root.join("index.html"),
    }
}

/// Delete every `page-N` folder directly under `root`, returning their numbers.
fn remove_page_dirs(root: &Path) -> Result<Vec<usize>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    let entries =
        std::fs::read_dir(root).wrap_err_with(|| format!("Failed to list {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(number) = parse_page_dir(name) else { continue };
        if !entry.file_type()?.is_dir() {
            continue;
        }
        std::fs::remove_dir_all(entry.path())
            .wrap_err_with(|| format!("Failed to remove stale page {}", entry.path().display()))?;
        debug!(page = %entry.path().display(), "removed stale listing page");
        removed.push(number);
    }
    Ok(removed)
}

/// Type folders on disk that no current record maps to, sorted.
fn leftover_category_dirs(site: &Site, live: &[&str]) -> Result<Vec<String>> {
    let root = site.categories_root();
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut leftovers = Vec::new();
    let entries =
        std::fs::read_dir(&root).wrap_err_with(|| format!("Failed to list {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !live.contains(&name.as_str()) {
            leftovers.push(name);
        }
    }
    leftovers.sort();
    Ok(leftovers)
}

fn render_listing_page(
    site: &Site,
    shell: &dyn PageShell,
    grouping: &Grouping<'_>,
    members: &[&Tribute],
    links: &PageLinks,
) -> Result<String> {
    let title = if links.number == 1 {
        grouping.title.clone()
    } else {
        format!("{} — Page {}", grouping.title, links.number)
    };

    let mut head = vec![
        meta_name("description", &grouping.intro),
        meta_name("robots", "index, follow"),
        format!("<link rel=\"canonical\" href=\"{}\">", site.absolute(&links.url)),
    ];
    if let Some(prev) = &links.prev {
        head.push(format!("<link rel=\"prev\" href=\"{}\">", site.absolute(prev)));
    }
    if let Some(next) = &links.next {
        head.push(format!("<link rel=\"next\" href=\"{}\">", site.absolute(next)));
    }
    head.push(format!("<link rel=\"stylesheet\" href=\"{}\">", site.stylesheet));
    if let Some(script) = &site.script {
        head.push(format!("<script src=\"{script}\" defer></script>"));
    }

    let cards = if members.is_empty() {
        "<p class=\"mm-archive-empty\">No tributes have been published yet.</p>".to_string()
    } else {
        members
            .iter()
            .map(|record| render_card(site, record))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let offset = (links.number - 1) * site.page_size;
    let schema = json_ld(&ItemListSchema::new(site, &title, links, members, offset))?;

    let view_all = if grouping.is_global(site) {
        String::new()
    } else {
        format!(
            "\n        <a href=\"{}\" class=\"mm-btn-secondary\">View All Memorials</a>",
            site.url_prefix
        )
    };

    let content = format!(
        r#"<main class="memorials-hub">
  <div class="container text-center">

    <section class="memorials-hero">
      <div class="hero-header-row">
        <h1>{heading}</h1>
        <div class="tribute-search-wrapper">
          <input type="text" id="tributeSearch" placeholder="Search tributes..." aria-label="Search tributes">
        </div>
      </div>

      <p>{intro}</p>

      <div class="mm-hero-cta">
        <a href="{submit}" class="mm-btn-primary">Create a Tribute</a>{view_all}
      </div>
    </section>

    <div class="tribute-grid">
{cards}
    </div>

{pagination}

    <section class="mm-bottom-cta">
      <h3>Would you like to honor your beloved companion?</h3>
      <div class="mm-cta-buttons">
        <a href="{submit}" class="mm-btn-primary">Create a Tribute</a>
        <a href="{all}" class="mm-btn-secondary">View All Memorials</a>
      </div>
    </section>

  </div>
</main>
{schema}"#,
        heading = html_escape(&grouping.title),
        intro = html_escape(&grouping.intro),
        submit = site.submit_url,
        view_all = view_all,
        cards = cards,
        pagination = render_pagination(&grouping.url_prefix, links),
        all = site.url_prefix,
        schema = schema,
    );

    shell.render(&ShellInput {
        title: &title,
        head_extras: &head.join("\n  "),
        content: &content,
    })
}

/// One archive card.
pub fn render_card(site: &Site, record: &Tribute) -> String {
    let detail_url = site.detail_url(record);
    let badge = publish_label(record);
    let heading = if record.breed.trim().is_empty() {
        record.name.clone()
    } else {
        format!("{} – {}", record.name, record.breed.trim())
    };
    let attribution = record
        .attribution()
        .map(|a| format!("\n      <div class=\"mm-archive-attribution\">{}</div>", html_escape(&a)))
        .unwrap_or_default();

    format!(
        r#"<article class="mm-archive-card"
  data-name="{name}"
  data-breed="{breed}"
  data-type="{category}"
  data-years="{years}"
  data-content="{excerpt}"
>
  <a class="mm-archive-link" href="{detail_url}">
    <div class="mm-archive-thumb">
      <span class="mm-date-badge">{badge}</span>
      <img src="{image}" alt="{name} memorial tribute" loading="lazy">
    </div>
    <div class="mm-archive-meta">
      <h2 class="mm-archive-title">{heading}</h2>
      <p class="mm-archive-excerpt">{excerpt}</p>
      <p class="mm-archive-years">{years}</p>{attribution}
    </div>
  </a>
</article>"#,
        name = html_escape(&record.name),
        breed = html_escape(&record.breed),
        category = html_escape(&record.category),
        years = html_escape(&record.life_span),
        excerpt = html_escape(&record.excerpt),
        detail_url = detail_url,
        badge = html_escape(&badge),
        image = html_escape(&site.image_url(record, &record.primary_image)),
        heading = html_escape(&heading),
        attribution = attribution,
    )
}

/// Numbered page links with arrows; empty for a single-page archive.
pub fn render_pagination(prefix: &str, links: &PageLinks) -> String {
    if links.total <= 1 {
        return String::new();
    }

    let mut parts = Vec::new();
    if let Some(prev) = &links.prev {
        parts.push(format!(
            "<a class=\"mm-page-arrow\" href=\"{prev}\" aria-label=\"Previous page\">←</a>"
        ));
    }
    for n in 1..=links.total {
        let url = links.sibling(prefix, n);
        if n == links.number {
            parts.push(format!(
                "<a class=\"mm-page-number mm-page-active\" href=\"{url}\" aria-current=\"page\">{n}</a>"
            ));
        } else {
            parts.push(format!("<a class=\"mm-page-number\" href=\"{url}\">{n}</a>"));
        }
    }
    if let Some(next) = &links.next {
        parts.push(format!(
            "<a class=\"mm-page-arrow\" href=\"{next}\" aria-label=\"Next page\">→</a>"
        ));
    }

    format!(
        "    <nav class=\"mm-pagination\" aria-label=\"Tribute pages\">{}</nav>",
        parts.join(" ")
    )
}

/// `Mon YYYY` badge from the publish date.
fn publish_label(record: &Tribute) -> String {
    record
        .published()
        .and_then(|dt| dt.format(format_description!("[month repr:short] [year]")).ok())
        .unwrap_or_default()
}

fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Facet)]
struct ItemListSchema {
    #[facet(rename = "@context")]
    context: String,
    #[facet(rename = "@type")]
    kind: String,
    name: String,
    url: String,
    #[facet(rename = "itemListElement")]
    items: Vec<ListItemSchema>,
}

#[derive(Facet)]
struct ListItemSchema {
    #[facet(rename = "@type")]
    kind: String,
    position: usize,
    url: String,
    name: String,
}

impl ItemListSchema {
    fn new(site: &Site, title: &str, links: &PageLinks, members: &[&Tribute], offset: usize) -> Self {
        Self {
            context: "https://schema.org".to_string(),
            kind: "ItemList".to_string(),
            name: title.to_string(),
            url: site.absolute(&links.url),
            items: members
                .iter()
                .enumerate()
                .map(|(idx, record)| ListItemSchema {
                    kind: "ListItem".to_string(),
                    position: offset + idx + 1,
                    url: site.absolute(&site.detail_url(record)),
                    name: record.name.clone(),
                })
                .collect(),
        }
    }
}
