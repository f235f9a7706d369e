//! Display ordering: one pinned record, then newest first

use time::PrimitiveDateTime;
use tracing::warn;

use crate::record::Tribute;

/// Canonical display order over a record set.
///
/// Every listing (global or per-type) is a filtered view of this one order,
/// so a record's relative position is computed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOrder {
    indices: Vec<usize>,
    demoted: Vec<String>,
}

impl DisplayOrder {
    /// Compute the order for `records`.
    ///
    /// If several records are featured, only the most recently published one
    /// keeps the flag (the earliest in input order on a tie); the rest are
    /// demoted in place. The pinned record comes first, everything else
    /// follows by publish date, newest first, ties keeping input order.
    pub fn compute(records: &mut [Tribute]) -> Self {
        let mut pinned: Option<usize> = None;
        for (idx, record) in records.iter().enumerate() {
            if !record.featured {
                continue;
            }
            match pinned {
                Some(current) if sort_key(&records[current]) >= sort_key(record) => {}
                _ => pinned = Some(idx),
            }
        }

        let mut demoted = Vec::new();
        for (idx, record) in records.iter_mut().enumerate() {
            if record.featured && Some(idx) != pinned {
                warn!(slug = %record.slug, "demoting extra featured tribute");
                record.featured = false;
                demoted.push(record.slug.clone());
            }
        }

        let mut rest: Vec<usize> = (0..records.len()).filter(|&i| Some(i) != pinned).collect();
        // sort_by is stable, so equal timestamps keep their input order
        rest.sort_by(|&a, &b| sort_key(&records[b]).cmp(&sort_key(&records[a])));

        let indices = pinned.into_iter().chain(rest).collect();
        Self { indices, demoted }
    }

    /// Records in display order.
    pub fn records<'a>(&self, records: &'a [Tribute]) -> Vec<&'a Tribute> {
        self.indices.iter().filter_map(|&i| records.get(i)).collect()
    }

    /// Indices into the input slice, in display order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Slugs whose featured flag was cleared by this computation.
    pub fn demoted(&self) -> &[String] {
        &self.demoted
    }
}

/// Undated records sort as the oldest.
fn sort_key(record: &Tribute) -> Option<PrimitiveDateTime> {
    record.published()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tribute(slug: &str, published: &str, featured: bool) -> Tribute {
        Tribute {
            slug: slug.to_string(),
            published_at: published.to_string(),
            featured,
            ..Default::default()
        }
    }

    fn slugs(order: &DisplayOrder, records: &[Tribute]) -> Vec<String> {
        order
            .records(records)
            .iter()
            .map(|r| r.slug.clone())
            .collect()
    }

    #[test]
    fn newest_featured_is_pinned_and_others_demoted() {
        let mut records = vec![
            tribute("a", "2024-01-01T00:00:00", true),
            tribute("b", "2025-06-01T00:00:00", false),
            tribute("c", "2023-01-01T00:00:00", true),
        ];
        let order = DisplayOrder::compute(&mut records);

        assert_eq!(slugs(&order, &records), ["a", "b", "c"]);
        assert!(records[0].featured);
        assert!(!records[2].featured);
        assert_eq!(order.demoted(), ["c".to_string()]);
    }

    #[test]
    fn without_featured_newest_comes_first() {
        let mut records = vec![
            tribute("old", "2020-01-01T00:00:00", false),
            tribute("new", "2026-01-01T00:00:00", false),
            tribute("mid", "2023-01-01T00:00:00", false),
        ];
        let order = DisplayOrder::compute(&mut records);
        assert_eq!(slugs(&order, &records), ["new", "mid", "old"]);
        assert!(order.demoted().is_empty());
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let mut records = vec![
            tribute("first", "2025-01-01T00:00:00", false),
            tribute("second", "2025-01-01T00:00:00", false),
            tribute("third", "2025-01-01T00:00:00", false),
            tribute("newer", "2025-02-01T00:00:00", false),
        ];
        let order = DisplayOrder::compute(&mut records);
        assert_eq!(slugs(&order, &records), ["newer", "first", "second", "third"]);
    }

    #[test]
    fn featured_tie_keeps_the_earlier_record() {
        let mut records = vec![
            tribute("x", "2025-01-01T00:00:00", true),
            tribute("y", "2025-01-01T00:00:00", true),
        ];
        let order = DisplayOrder::compute(&mut records);
        assert_eq!(slugs(&order, &records), ["x", "y"]);
        assert!(records[0].featured);
        assert!(!records[1].featured);
    }

    #[test]
    fn recomputing_is_stable() {
        let mut records = vec![
            tribute("a", "2024-01-01T00:00:00", true),
            tribute("b", "2025-06-01T00:00:00", true),
            tribute("c", "2025-06-01T00:00:00", false),
        ];
        let first = DisplayOrder::compute(&mut records);
        let second = DisplayOrder::compute(&mut records);
        assert_eq!(first.indices(), second.indices());
        assert!(second.demoted().is_empty());
    }

    #[test]
    fn empty_input() {
        let mut records: Vec<Tribute> = Vec::new();
        let order = DisplayOrder::compute(&mut records);
        assert!(order.records(&records).is_empty());
    }
}
