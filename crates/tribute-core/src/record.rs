//! Tribute record schema and field normalization

use eyre::{Result, bail};
use facet::Facet;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

use crate::excerpt::normalize_life_span;

/// One published tribute.
///
/// Field keys match the persisted document so that stores written by older
/// publishers load unchanged. Keys not listed here are ignored on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Facet)]
pub struct Tribute {
    /// Unique URL segment, immutable once allocated
    pub slug: String,

    /// Sub-path the detail page lives under (empty for the legacy flat layout)
    #[facet(default)]
    pub folder: String,

    /// Pet's name as entered
    #[facet(rename = "pet_name", default)]
    pub name: String,

    /// Pet type, e.g. "Dog" - drives the per-type archives
    #[facet(rename = "pet_type", default)]
    pub category: String,

    #[facet(default)]
    pub breed: String,

    /// Dates of life, always in `start – end` form
    #[facet(rename = "years_pretty", default)]
    pub life_span: String,

    /// Plain-text summary of the tribute message
    #[facet(default)]
    pub excerpt: String,

    /// Submitter's first name
    #[facet(default)]
    pub first_name: String,

    /// Submitter's region
    #[facet(default)]
    pub state: String,

    #[facet(default)]
    pub email: String,

    /// Whether the publish notice has been sent to `email`
    #[facet(rename = "notified", default)]
    pub notification_sent: bool,

    /// File name beside the detail page, empty for the placeholder
    #[facet(rename = "image_filename", default)]
    pub primary_image: String,

    #[facet(rename = "image2_filename", default)]
    pub secondary_image: String,

    /// `YYYY-MM-DDTHH:MM:SS`
    #[facet(rename = "published_iso", default)]
    pub published_at: String,

    /// Pinned to the front of the archive
    #[facet(default)]
    pub featured: bool,
}

impl Tribute {
    /// Bring a freshly loaded record into canonical form.
    ///
    /// Fails if the publish timestamp cannot be understood; a record without
    /// a usable date cannot be placed in the archive.
    pub fn normalize(&mut self) -> Result<()> {
        self.slug = self.slug.trim().to_string();
        if self.slug.is_empty() {
            bail!("tribute record '{}' has an empty slug", self.name);
        }
        self.folder = self.folder.trim().trim_matches('/').to_string();
        self.life_span = normalize_life_span(&self.life_span);
        self.published_at = normalize_timestamp(&self.published_at).ok_or_else(|| {
            eyre::eyre!(
                "tribute '{}' has an unreadable published date: {:?}",
                self.slug,
                self.published_at
            )
        })?;
        Ok(())
    }

    /// Parsed publish timestamp, `None` if the stored value is malformed.
    pub fn published(&self) -> Option<PrimitiveDateTime> {
        parse_timestamp(&self.published_at)
    }

    /// `"First, Region"` from whichever parts are present.
    pub fn attribution(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.trim(), self.state.trim()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    /// Contact address, if one was given.
    pub fn contact_email(&self) -> Option<&str> {
        let email = self.email.trim();
        (!email.is_empty()).then_some(email)
    }

    /// Whether a publish notice is still owed to the submitter.
    pub fn notice_pending(&self) -> bool {
        self.contact_email().is_some() && !self.notification_sent
    }

    /// Path of the detail page relative to the archive root, without slashes
    /// at either end.
    pub fn detail_path(&self) -> String {
        if self.folder.is_empty() {
            self.slug.clone()
        } else {
            format!("{}/{}", self.folder, self.slug)
        }
    }
}

/// Parse any accepted timestamp spelling.
///
/// Accepts date-only values (midnight), `T`- or space-separated date-times,
/// and RFC 3339 with an offset. The wall-clock part is kept as written and
/// sub-second precision is dropped.
pub fn parse_timestamp(value: &str) -> Option<PrimitiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = Date::parse(value, format_description!("[year]-[month]-[day]")) {
        return Some(PrimitiveDateTime::new(date, Time::MIDNIGHT));
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Some(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ) {
        return Some(truncate_seconds(dt));
    }
    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(truncate_seconds(PrimitiveDateTime::new(dt.date(), dt.time())));
    }
    None
}

/// Canonical `YYYY-MM-DDTHH:MM:SS` form.
pub fn format_timestamp(dt: PrimitiveDateTime) -> String {
    dt.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    ))
    .unwrap_or_default()
}

/// Parse then re-format, `None` if the value is not a timestamp.
pub fn normalize_timestamp(value: &str) -> Option<String> {
    parse_timestamp(value).map(format_timestamp)
}

fn truncate_seconds(dt: PrimitiveDateTime) -> PrimitiveDateTime {
    match dt.time().replace_nanosecond(0) {
        Ok(time) => dt.replace_time(time),
        Err(_) => dt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_becomes_midnight() {
        assert_eq!(
            normalize_timestamp("2026-02-01").as_deref(),
            Some("2026-02-01T00:00:00")
        );
    }

    #[test]
    fn full_timestamps_are_kept() {
        assert_eq!(
            normalize_timestamp("2025-06-01T14:05:09").as_deref(),
            Some("2025-06-01T14:05:09")
        );
        assert_eq!(
            normalize_timestamp("2025-06-01 14:05:09").as_deref(),
            Some("2025-06-01T14:05:09")
        );
    }

    #[test]
    fn offsets_and_fractions_keep_wall_clock() {
        assert_eq!(
            normalize_timestamp("2025-06-01T14:05:09.250+02:00").as_deref(),
            Some("2025-06-01T14:05:09")
        );
        assert_eq!(
            normalize_timestamp("2025-06-01T14:05:09.999").as_deref(),
            Some("2025-06-01T14:05:09")
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(normalize_timestamp("").is_none());
        assert!(normalize_timestamp("last tuesday").is_none());
        assert!(normalize_timestamp("2025-13-01").is_none());
    }

    #[test]
    fn normalize_fixes_legacy_fields() {
        let mut record = Tribute {
            slug: " biscuit ".to_string(),
            folder: "/dog/".to_string(),
            life_span: "2008-2019".to_string(),
            published_at: "2026-02-01".to_string(),
            ..Default::default()
        };
        record.normalize().unwrap();
        assert_eq!(record.slug, "biscuit");
        assert_eq!(record.folder, "dog");
        assert_eq!(record.life_span, "2008 – 2019");
        assert_eq!(record.published_at, "2026-02-01T00:00:00");
        assert_eq!(record.detail_path(), "dog/biscuit");
    }

    #[test]
    fn normalize_rejects_bad_dates() {
        let mut record = Tribute {
            slug: "biscuit".to_string(),
            published_at: "someday".to_string(),
            ..Default::default()
        };
        let err = record.normalize().unwrap_err().to_string();
        assert!(err.contains("biscuit"), "error should name the record: {err}");
    }

    #[test]
    fn attribution_joins_present_parts() {
        let mut record = Tribute::default();
        assert_eq!(record.attribution(), None);
        record.state = "Ohio".to_string();
        assert_eq!(record.attribution().as_deref(), Some("Ohio"));
        record.first_name = "Dana".to_string();
        assert_eq!(record.attribution().as_deref(), Some("Dana, Ohio"));
    }

    #[test]
    fn notice_pending_needs_an_address() {
        let mut record = Tribute::default();
        assert!(!record.notice_pending());
        record.email = "dana@example.com".to_string();
        assert!(record.notice_pending());
        record.notification_sent = true;
        assert!(!record.notice_pending());
    }
}
