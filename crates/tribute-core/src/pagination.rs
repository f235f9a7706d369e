//! Page planning for listing archives

/// Cards per listing page.
pub const PAGE_SIZE: usize = 15;

const PAGE_DIR_PREFIX: &str = "page-";

/// Number of pages a listing of `len` items occupies. Never zero: an empty
/// listing still has its first page.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Split an ordered sequence into contiguous pages.
///
/// An empty sequence yields exactly one empty page.
pub fn paginate<T>(items: &[T], page_size: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return vec![&items[..0]];
    }
    items.chunks(page_size.max(1)).collect()
}

/// Folder name holding page `number`, `None` for page 1 (the listing root).
pub fn page_dir_name(number: usize) -> Option<String> {
    (number > 1).then(|| format!("{PAGE_DIR_PREFIX}{number}"))
}

/// Page number encoded in a folder name like `page-3`.
///
/// Only `page-` followed by digits matches; `page-1` and `page-0` are still
/// reported so that stale-page cleanup can remove them.
pub fn parse_page_dir(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(PAGE_DIR_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Canonical URL of one page and of its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    /// 1-based page number
    pub number: usize,
    pub total: usize,
    pub url: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl PageLinks {
    /// Links for page `number` of `total` under `prefix`.
    ///
    /// `prefix` is the listing root URL and should end with `/`.
    pub fn new(prefix: &str, number: usize, total: usize) -> Self {
        let url_for = |n: usize| match page_dir_name(n) {
            Some(dir) => format!("{prefix}{dir}/"),
            None => prefix.to_string(),
        };
        Self {
            number,
            total,
            url: url_for(number),
            prev: (number > 1).then(|| url_for(number - 1)),
            next: (number < total).then(|| url_for(number + 1)),
        }
    }

    /// URL of any sibling page in the same listing.
    pub fn sibling(&self, prefix: &str, number: usize) -> String {
        PageLinks::new(prefix, number, self.total).url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_matches_ceiling() {
        assert_eq!(page_count(0, 15), 1);
        assert_eq!(page_count(1, 15), 1);
        assert_eq!(page_count(15, 15), 1);
        assert_eq!(page_count(16, 15), 2);
        assert_eq!(page_count(30, 15), 2);
        assert_eq!(page_count(31, 15), 3);
    }

    #[test]
    fn paginate_is_contiguous() {
        let items: Vec<usize> = (0..31).collect();
        let pages = paginate(&items, 15);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 15);
        assert_eq!(pages[1][0], 15);
        assert_eq!(pages[2], &[30]);
        let flat: Vec<usize> = pages.concat();
        assert_eq!(flat, items);
    }

    #[test]
    fn paginate_empty_yields_one_page() {
        let items: Vec<u8> = Vec::new();
        let pages = paginate(&items, 15);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn page_count_agrees_with_paginate() {
        for len in 0..50 {
            let items = vec![(); len];
            assert_eq!(paginate(&items, 7).len(), page_count(len, 7));
        }
    }

    #[test]
    fn links_for_first_middle_last() {
        let first = PageLinks::new("/pet-tributes/", 1, 3);
        assert_eq!(first.url, "/pet-tributes/");
        assert_eq!(first.prev, None);
        assert_eq!(first.next.as_deref(), Some("/pet-tributes/page-2/"));

        let middle = PageLinks::new("/pet-tributes/", 2, 3);
        assert_eq!(middle.url, "/pet-tributes/page-2/");
        assert_eq!(middle.prev.as_deref(), Some("/pet-tributes/"));
        assert_eq!(middle.next.as_deref(), Some("/pet-tributes/page-3/"));

        let last = PageLinks::new("/pet-tributes/", 3, 3);
        assert_eq!(last.prev.as_deref(), Some("/pet-tributes/page-2/"));
        assert_eq!(last.next, None);
    }

    #[test]
    fn single_page_has_no_neighbours() {
        let only = PageLinks::new("/pet-tributes/type/dog/", 1, 1);
        assert_eq!(only.url, "/pet-tributes/type/dog/");
        assert!(only.prev.is_none() && only.next.is_none());
    }

    #[test]
    fn page_dir_names_round_trip() {
        assert_eq!(page_dir_name(1), None);
        assert_eq!(page_dir_name(4).as_deref(), Some("page-4"));
        assert_eq!(parse_page_dir("page-4"), Some(4));
        assert_eq!(parse_page_dir("page-12"), Some(12));
        assert_eq!(parse_page_dir("page-"), None);
        assert_eq!(parse_page_dir("page-2b"), None);
        assert_eq!(parse_page_dir("pages"), None);
        assert_eq!(parse_page_dir("biscuit-page-2"), None);
    }
}
