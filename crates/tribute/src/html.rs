//! Small HTML helpers shared by the listing and detail renderers

use eyre::{Result, eyre};
use facet::Facet;

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`html_escape`] for text recovered from an existing page.
pub fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Serialize a schema.org value into an `application/ld+json` block.
pub fn json_ld<'a, T: Facet<'a>>(value: &T) -> Result<String> {
    let json = facet_json::to_string_pretty(value)
        .map_err(|e| eyre!("Failed to encode schema block: {e:?}"))?;
    // keep the payload from closing the script element early
    let json = json.replace("</", "<\\/");
    Ok(format!(
        "<script type=\"application/ld+json\">\n{json}\n</script>"
    ))
}

/// `<meta name=... content=...>` with the content escaped.
pub fn meta_name(name: &str, content: &str) -> String {
    format!(
        "<meta name=\"{}\" content=\"{}\">",
        name,
        html_escape(content)
    )
}

/// `<meta property=... content=...>` with the content escaped.
pub fn meta_property(property: &str, content: &str) -> String {
    format!(
        "<meta property=\"{}\" content=\"{}\">",
        property,
        html_escape(content)
    )
}

/// Shorten `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            html_escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn unescape_reverses_escape() {
        let raw = r#"<b>"Tom" & 'Jerry'</b> &amp;"#;
        assert_eq!(html_unescape(&html_escape(raw)), raw);
    }

    #[test]
    fn truncation_marks_the_cut() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 5), "abcd…");
    }
}
