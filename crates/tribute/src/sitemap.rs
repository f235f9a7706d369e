//! `sitemap.xml` for every page the archive currently serves

use eyre::{Result, WrapErr};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;
use tribute_core::Tribute;

use crate::archive::ArchiveReport;
use crate::config::Site;
use crate::html::html_escape;
use crate::write_page;

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Absolute URL
    pub loc: String,
    /// `YYYY-MM-DD`, detail pages only
    pub lastmod: Option<String>,
}

/// Every canonical URL, listing pages first, then per-type pages, then
/// detail pages. The first occurrence of a URL wins.
pub fn collect_entries(
    site: &Site,
    global: &ArchiveReport,
    categories: &[ArchiveReport],
    ordered: &[&Tribute],
) -> Vec<SitemapEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut push = |loc: String, lastmod: Option<String>| {
        if seen.insert(loc.clone()) {
            entries.push(SitemapEntry { loc, lastmod });
        }
    };

    for url in &global.page_urls {
        push(site.absolute(url), None);
    }
    for report in categories {
        for url in &report.page_urls {
            push(site.absolute(url), None);
        }
    }
    for record in ordered {
        let lastmod = record.published_at.get(..10).map(str::to_string);
        push(site.absolute(&site.detail_url(record)), lastmod);
    }

    entries
}

/// Render a `<urlset>` document.
pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", html_escape(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Collect, render and write the sitemap. Returns the path written.
pub fn write_sitemap(
    site: &Site,
    global: &ArchiveReport,
    categories: &[ArchiveReport],
    ordered: &[&Tribute],
) -> Result<PathBuf> {
    let entries = collect_entries(site, global, categories, ordered);
    let path = site.sitemap_path();
    write_page(&path, &render_sitemap(&entries))?;
    info!(urls = entries.len(), path = %path.display(), "wrote sitemap");
    Ok(path)
}

/// `<loc>` values of an existing sitemap, in document order.
pub fn read_sitemap_urls(path: &Path) -> Result<Vec<String>> {
    let xml = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read sitemap {}", path.display()))?;

    Ok(xml
        .split("<loc>")
        .skip(1)
        .filter_map(|chunk| chunk.split_once("</loc>"))
        .map(|(loc, _)| crate::html::html_unescape(loc))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(urls: &[&str]) -> ArchiveReport {
        ArchiveReport {
            root_dir: PathBuf::new(),
            page_urls: urls.iter().map(|u| u.to_string()).collect(),
            stale_pages: 0,
        }
    }

    #[test]
    fn listing_then_type_then_detail() {
        let site = Site::with_defaults(Path::new("/srv")).unwrap();
        let record = Tribute {
            slug: "biscuit".into(),
            published_at: "2025-03-01T10:00:00".into(),
            ..Default::default()
        };
        let entries = collect_entries(
            &site,
            &report(&["/pet-tributes/", "/pet-tributes/page-2/"]),
            &[report(&["/pet-tributes/type/dog/"])],
            &[&record, &record],
        );

        let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            [
                "https://meltonmemorials.com/pet-tributes/",
                "https://meltonmemorials.com/pet-tributes/page-2/",
                "https://meltonmemorials.com/pet-tributes/type/dog/",
                "https://meltonmemorials.com/pet-tributes/biscuit/",
            ]
        );
        assert_eq!(entries[3].lastmod.as_deref(), Some("2025-03-01"));
        assert_eq!(entries[0].lastmod, None);
    }

    #[test]
    fn rendered_urls_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        let entries = vec![SitemapEntry {
            loc: "https://example.com/a?b=1&c=2".into(),
            lastmod: Some("2025-01-01".into()),
        }];
        let xml = render_sitemap(&entries);
        assert!(xml.contains("<loc>https://example.com/a?b=1&amp;c=2</loc>"));
        std::fs::write(&path, xml).unwrap();
        assert_eq!(read_sitemap_urls(&path).unwrap(), ["https://example.com/a?b=1&c=2"]);
    }
}
