//! Detail pages: one folder per tribute holding `index.html` and its photos
//!
//! The rendered message lives inside a single known container. When a page
//! is regenerated without a new message, the previous container contents are
//! read back from disk and reused verbatim, so metadata edits never touch the
//! message itself.

use eyre::{Result, WrapErr};
use facet::Facet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tribute_core::Tribute;

use crate::config::Site;
use crate::html::{html_escape, html_unescape, json_ld, meta_name, meta_property, truncate_chars};
use crate::shell::{PageShell, ShellInput};
use crate::write_page;

const MESSAGE_OPEN: &str = "<div class=\"mm-tribute-message\">";
const DESCRIPTION_LIMIT: usize = 165;

/// Regenerate one tribute's detail page.
///
/// `body` replaces the rendered message; with `None` the message already on
/// disk is kept, falling back to the excerpt for a page that does not exist
/// yet. Returns the path written.
pub fn sync_detail_page(
    site: &Site,
    shell: &dyn PageShell,
    record: &Tribute,
    body: Option<&str>,
) -> Result<PathBuf> {
    let dir = site.detail_dir(record);
    let path = dir.join("index.html");

    let message = match body {
        Some(body) => body.trim().to_string(),
        None => match read_existing_body(&path)? {
            Some(existing) => existing,
            None => {
                debug!(slug = %record.slug, "no previous page, using excerpt as message");
                format!("<p>{}</p>", html_escape(&record.excerpt))
            }
        },
    };

    let html = render_detail_page(site, shell, record, &message)?;
    write_page(&path, &html)?;
    info!(slug = %record.slug, path = %path.display(), "wrote detail page");
    Ok(path)
}

/// Remove a tribute's folder, and its group folder if that is left empty.
///
/// Returns whether anything was removed.
pub fn remove_detail_page(site: &Site, record: &Tribute) -> Result<bool> {
    let dir = site.detail_dir(record);
    if !dir.is_dir() {
        return Ok(false);
    }

    std::fs::remove_dir_all(&dir).wrap_err_with(|| format!("Failed to remove {}", dir.display()))?;
    debug!(dir = %dir.display(), "removed detail folder");

    if !record.folder.is_empty() {
        let group = site.output_root.join(&record.folder);
        let empty = std::fs::read_dir(&group)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if empty {
            std::fs::remove_dir(&group)
                .wrap_err_with(|| format!("Failed to remove {}", group.display()))?;
            debug!(dir = %group.display(), "removed empty group folder");
        }
    }
    Ok(true)
}

/// Message HTML from a previously written page, if there is one.
pub fn read_existing_body(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let html = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read existing page {}", path.display()))?;
    Ok(extract_message(&html))
}

/// Contents of the message container, matched by nesting depth so that
/// `<div>`s inside the message do not end it early.
pub fn extract_message(html: &str) -> Option<String> {
    let start = html.find(MESSAGE_OPEN)? + MESSAGE_OPEN.len();
    let rest = &html[start..];

    let mut depth = 1usize;
    let mut cursor = 0;
    while cursor < rest.len() {
        let tail = &rest[cursor..];
        let next_open = tail.find("<div");
        let next_close = tail.find("</div>")?;
        match next_open {
            Some(open) if open < next_close => {
                depth += 1;
                cursor += open + "<div".len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    let inner = &rest[..cursor + next_close];
                    return Some(inner.trim().to_string());
                }
                cursor += next_close + "</div>".len();
            }
        }
    }
    None
}

/// Fields recoverable from a detail page written before the store existed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveredPage {
    pub name: String,
    pub breed: String,
    pub life_span: String,
    pub excerpt: String,
    pub first_name: String,
    pub state: String,
}

/// Read tribute fields back out of a detail page's markup.
///
/// Returns `None` when the page has no tribute heading at all.
pub fn recover_fields(html: &str) -> Option<RecoveredPage> {
    let name = between(html, "<h1 class=\"mm-tribute-name\">", "</h1>")?;
    let breed = between(html, "<p class=\"mm-tribute-subtitle\">", "</p>")
        .map(|s| s.replace("Memorial Tribute", "").trim().to_string())
        .unwrap_or_default();
    let (first_name, state) = between(html, "<p class=\"mm-tribute-origin\">Shared by ", "</p>")
        .map(|origin| {
            let mut parts = origin.splitn(2, ',').map(|p| p.trim().to_string());
            (parts.next().unwrap_or_default(), parts.next().unwrap_or_default())
        })
        .unwrap_or_default();

    Some(RecoveredPage {
        name,
        breed,
        life_span: between(html, "<p class=\"mm-years\">", "</p>").unwrap_or_default(),
        excerpt: between(html, "<meta name=\"description\" content=\"", "\"").unwrap_or_default(),
        first_name,
        state,
    })
}

fn between(html: &str, open: &str, close: &str) -> Option<String> {
    let start = html.find(open)? + open.len();
    let len = html[start..].find(close)?;
    Some(html_unescape(html[start..start + len].trim()))
}

fn page_title(record: &Tribute) -> String {
    match record.breed.trim() {
        "" => format!("{} – Memorial Tribute", record.name),
        breed => format!("{} – {breed} Memorial Tribute", record.name),
    }
}

fn render_detail_page(site: &Site, shell: &dyn PageShell, record: &Tribute, message: &str) -> Result<String> {
    let title = page_title(record);
    let page_url = site.absolute(&site.detail_url(record));
    let image_abs = site.absolute(&site.image_url(record, &record.primary_image));
    let published = &record.published_at;

    let description = if record.excerpt.is_empty() {
        format!("A memorial tribute honoring {}.", record.name)
    } else {
        truncate_chars(&record.excerpt, DESCRIPTION_LIMIT)
    };
    let social_description = if record.excerpt.is_empty() {
        format!("Read the memorial tribute honoring {}.", record.name)
    } else {
        record.excerpt.clone()
    };

    let head = [
        meta_name("description", &description),
        format!("<link rel=\"canonical\" href=\"{page_url}\">"),
        meta_name("robots", "index, follow"),
        meta_name("date", published),
        meta_property("og:type", "article"),
        meta_property("og:site_name", &site.name),
        meta_property("og:title", &title),
        meta_property("og:description", &social_description),
        meta_property("og:url", &page_url),
        meta_property("og:image", &image_abs),
        meta_property("article:published_time", published),
        meta_name("twitter:card", "summary_large_image"),
        meta_name("twitter:title", &title),
        meta_name("twitter:description", &social_description),
        meta_name("twitter:image", &image_abs),
        format!("<link rel=\"stylesheet\" href=\"{}\">", site.stylesheet),
    ]
    .join("\n  ");

    let subtitle = match record.breed.trim() {
        "" => "Memorial Tribute".to_string(),
        breed => format!("{breed} Memorial Tribute"),
    };

    let primary_src = if record.primary_image.is_empty() {
        site.placeholder_image.clone()
    } else {
        record.primary_image.clone()
    };
    let secondary = if record.secondary_image.is_empty() {
        String::new()
    } else {
        format!(
            "\n      <img class=\"mm-tribute-photo-secondary\" src=\"{}\" alt=\"{} memorial tribute photo\" loading=\"lazy\">",
            html_escape(&record.secondary_image),
            html_escape(&record.name)
        )
    };
    let origin = record
        .attribution()
        .map(|a| format!("\n      <p class=\"mm-tribute-origin\">Shared by {}</p>", html_escape(&a)))
        .unwrap_or_default();

    let schema = json_ld(&ArticleSchema::new(site, record, &title, &page_url, &image_abs, &description))?;

    let content = format!(
        r#"<div class="mm-tribute-system">
    <div class="mm-tribute-wrapper">
      <p class="mm-memorial-line">In Loving Memory of</p>

      <h1 class="mm-tribute-name">{name}</h1>

      <p class="mm-tribute-subtitle">{subtitle}</p>

      <div class="mm-tribute-divider"></div>

      <img class="mm-tribute-photo" src="{primary}" alt="{name} memorial tribute photo">{secondary}

      <div class="mm-tribute-body">
{MESSAGE_OPEN}
{message}
</div>
      </div>

      <p class="mm-years">{years}</p>{origin}

{share}

      <div class="mm-tribute-cta">
        <a href="{shop}" class="mm-btn">Explore Memorial Stones →</a>
      </div>
    </div>
</div>
{schema}"#,
        name = html_escape(&record.name),
        subtitle = html_escape(&subtitle),
        primary = html_escape(&primary_src),
        secondary = secondary,
        message = message,
        years = html_escape(&record.life_span),
        origin = origin,
        share = share_links(&page_url, &image_abs, &record.excerpt),
        shop = site.absolute(&site.shop_url),
        schema = schema,
    );

    shell.render(&ShellInput {
        title: &title,
        head_extras: &head,
        content: &content,
    })
}

fn share_links(page_url: &str, image_abs: &str, excerpt: &str) -> String {
    let url = urlencoding::encode(page_url);
    let facebook = format!("https://www.facebook.com/sharer/sharer.php?u={url}");
    let pinterest = format!(
        "https://pinterest.com/pin/create/button/?url={url}&media={}&description={}",
        urlencoding::encode(image_abs),
        urlencoding::encode(excerpt)
    );
    let email = format!("mailto:?subject={}&body={url}", urlencoding::encode("Memorial Tribute"));

    format!(
        r#"      <div class="mm-tribute-share" aria-label="Share this tribute">
        <p class="mm-share-label">Share this memory</p>
        <div class="mm-share-icons">
          <a class="mm-share-icon mm-share-facebook" href="{}" target="_blank" rel="noopener" aria-label="Share on Facebook">Facebook</a>
          <a class="mm-share-icon mm-share-pinterest" href="{}" target="_blank" rel="noopener" aria-label="Share on Pinterest">Pinterest</a>
          <a class="mm-share-icon mm-share-email" href="{}" aria-label="Share by Email">Email</a>
        </div>
      </div>"#,
        html_escape(&facebook),
        html_escape(&pinterest),
        html_escape(&email)
    )
}

#[derive(Facet)]
struct ArticleSchema {
    #[facet(rename = "@context")]
    context: String,
    #[facet(rename = "@type")]
    kind: String,
    #[facet(rename = "mainEntityOfPage")]
    main_entity: WebPageRef,
    headline: String,
    image: Vec<String>,
    #[facet(rename = "datePublished")]
    date_published: String,
    #[facet(rename = "dateModified")]
    date_modified: String,
    author: OrganizationRef,
    publisher: OrganizationRef,
    description: String,
}

#[derive(Facet)]
struct WebPageRef {
    #[facet(rename = "@type")]
    kind: String,
    #[facet(rename = "@id")]
    id: String,
}

#[derive(Facet)]
struct OrganizationRef {
    #[facet(rename = "@type")]
    kind: String,
    name: String,
}

impl ArticleSchema {
    fn new(site: &Site, record: &Tribute, title: &str, page_url: &str, image: &str, description: &str) -> Self {
        let organization = || OrganizationRef {
            kind: "Organization".to_string(),
            name: site.name.clone(),
        };
        Self {
            context: "https://schema.org".to_string(),
            kind: "Article".to_string(),
            main_entity: WebPageRef {
                kind: "WebPage".to_string(),
                id: page_url.to_string(),
            },
            headline: title.to_string(),
            image: vec![image.to_string()],
            date_published: record.published_at.clone(),
            date_modified: record.published_at.clone(),
            author: organization(),
            publisher: organization(),
            description: description.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::TemplateShell;

    fn record() -> Tribute {
        Tribute {
            slug: "biscuit-dog-beagle".to_string(),
            folder: "dog".to_string(),
            name: "Biscuit".to_string(),
            category: "Dog".to_string(),
            breed: "Beagle".to_string(),
            life_span: "2010 – 2024".to_string(),
            excerpt: "Best boy.".to_string(),
            first_name: "Dana".to_string(),
            state: "Ohio".to_string(),
            published_at: "2025-03-01T10:00:00".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn nested_divs_stay_inside_the_message() {
        let html = format!("<x>{MESSAGE_OPEN}\n<div><p>a</p></div>\n<p>b</p>\n</div>\n</div></x>");
        assert_eq!(
            extract_message(&html).as_deref(),
            Some("<div><p>a</p></div>\n<p>b</p>")
        );
    }

    #[test]
    fn missing_container_yields_none() {
        assert_eq!(extract_message("<p>nothing here</p>"), None);
    }

    #[test]
    fn first_sync_falls_back_to_excerpt_then_preserves() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_defaults(dir.path()).unwrap();
        let shell = TemplateShell::builtin();
        let r = record();

        let path = sync_detail_page(&site, &shell, &r, None).unwrap();
        assert_eq!(path, dir.path().join("output/pet-tributes/dog/biscuit-dog-beagle/index.html"));
        assert_eq!(read_existing_body(&path).unwrap().as_deref(), Some("<p>Best boy.</p>"));

        sync_detail_page(&site, &shell, &r, Some("<p>Full message</p>\n<p>More</p>")).unwrap();
        let mut edited = r.clone();
        edited.breed = "Basset".to_string();
        sync_detail_page(&site, &shell, &edited, None).unwrap();

        let page = std::fs::read_to_string(&path).unwrap();
        assert!(page.contains("Biscuit – Basset Memorial Tribute"));
        assert_eq!(
            read_existing_body(&path).unwrap().as_deref(),
            Some("<p>Full message</p>\n<p>More</p>")
        );
    }

    #[test]
    fn page_carries_meta_and_share_links() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_defaults(dir.path()).unwrap();
        let path = sync_detail_page(&site, &TemplateShell::builtin(), &record(), Some("<p>x</p>")).unwrap();
        let page = std::fs::read_to_string(path).unwrap();

        assert!(page.contains(
            "<link rel=\"canonical\" href=\"https://meltonmemorials.com/pet-tributes/dog/biscuit-dog-beagle/\">"
        ));
        assert!(page.contains("sharer.php?u=https%3A%2F%2Fmeltonmemorials.com%2Fpet-tributes%2Fdog%2Fbiscuit-dog-beagle%2F"));
        assert!(page.contains("&amp;description=Best%20boy."));
        assert!(page.contains("Shared by Dana, Ohio"));
        assert!(page.contains("\"@type\": \"Article\"") || page.contains("\"@type\":\"Article\""));
        assert!(page.contains("src=\"/pet-tributes/assets/blank-stone.webp\""));
    }

    #[test]
    fn recovers_fields_from_rendered_page() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_defaults(dir.path()).unwrap();
        let path = sync_detail_page(&site, &TemplateShell::builtin(), &record(), Some("<p>x</p>")).unwrap();
        let page = std::fs::read_to_string(path).unwrap();

        let recovered = recover_fields(&page).unwrap();
        assert_eq!(recovered.name, "Biscuit");
        assert_eq!(recovered.breed, "Beagle");
        assert_eq!(recovered.life_span, "2010 – 2024");
        assert_eq!(recovered.excerpt, "Best boy.");
        assert_eq!(recovered.first_name, "Dana");
        assert_eq!(recovered.state, "Ohio");
    }

    #[test]
    fn removing_last_tribute_removes_group_folder() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::with_defaults(dir.path()).unwrap();
        let r = record();
        sync_detail_page(&site, &TemplateShell::builtin(), &r, None).unwrap();

        assert!(remove_detail_page(&site, &r).unwrap());
        assert!(!site.detail_dir(&r).exists());
        assert!(!site.output_root.join("dog").exists());
        assert!(!remove_detail_page(&site, &r).unwrap());
    }
}
