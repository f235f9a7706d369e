//! Excerpt derivation and life-span normalization

/// Upper bound, in characters, for a derived excerpt.
pub const EXCERPT_LIMIT: usize = 220;

/// Derive the short plain-text summary shown on cards and in meta tags.
///
/// Whitespace is collapsed and the message markup markers are stripped. Text
/// that fits is used whole; otherwise whole sentences are taken while they
/// fit, and when not even the first sentence fits it is cut at a word
/// boundary and marked with an ellipsis.
pub fn derive_excerpt(message: &str) -> String {
    let text = plain_text(message);
    if text.chars().count() <= EXCERPT_LIMIT {
        return text;
    }

    let mut taken = String::new();
    for sentence in sentences(&text) {
        let candidate_len = if taken.is_empty() {
            sentence.chars().count()
        } else {
            taken.chars().count() + 1 + sentence.chars().count()
        };
        if candidate_len > EXCERPT_LIMIT {
            break;
        }
        if !taken.is_empty() {
            taken.push(' ');
        }
        taken.push_str(sentence);
    }
    if !taken.is_empty() {
        return taken;
    }

    // Leave room for the ellipsis.
    let head: String = text.chars().take(EXCERPT_LIMIT - 1).collect();
    let cut = match head.rfind(' ') {
        Some(idx) if idx > 0 => &head[..idx],
        _ => head.as_str(),
    };
    format!("{}…", cut.trim_end_matches([',', ';', ':', ' ']))
}

/// Normalize a dates-of-life label to `start – end`.
///
/// Em and en dashes, spaced hyphens and a lone bare hyphen all count as the
/// separator. Labels with no separator are only trimmed.
pub fn normalize_life_span(value: &str) -> String {
    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if value.is_empty() {
        return value;
    }

    let parts: Vec<&str> = if value.contains(['–', '—']) {
        value.split(['–', '—']).collect()
    } else if value.contains(" - ") {
        value.split(" - ").collect()
    } else if value.matches('-').count() == 1 {
        value.split('-').collect()
    } else {
        return value;
    };

    let parts: Vec<&str> = parts
        .into_iter()
        .map(|p| p.trim().trim_matches('-').trim())
        .filter(|p| !p.is_empty())
        .collect();
    parts.join(" – ")
}

/// Drop the markers the message renderer interprets: `## `/`### ` heading
/// prefixes and balanced `**`/`*` pairs. Anything else stays literal.
fn plain_text(message: &str) -> String {
    let mut words = Vec::new();
    for line in message.lines() {
        let line = line.trim();
        let line = line
            .strip_prefix("### ")
            .or_else(|| line.strip_prefix("## "))
            .unwrap_or(line);
        let line = strip_pairs(&strip_pairs(line, "**"), "*");
        words.extend(line.split_whitespace().map(str::to_string));
    }
    words.join(" ")
}

/// Remove `marker` when every occurrence on the line has a partner.
fn strip_pairs(line: &str, marker: &str) -> String {
    let parts: Vec<&str> = line.split(marker).collect();
    if parts.len() < 3 || parts.len() % 2 == 0 {
        return line.to_string();
    }
    parts.concat()
}

/// Split collapsed text after `.`, `!` or `?` followed by a space.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let end = idx + ch.len_utf8();
            if end == text.len() || bytes[end] == b' ' {
                out.push(text[start..end].trim());
                start = end;
            }
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_are_used_whole() {
        let excerpt = derive_excerpt("She loved the beach.\n\nAnd naps in the sun!");
        assert_eq!(excerpt, "She loved the beach. And naps in the sun!");
    }

    #[test]
    fn markup_markers_are_stripped() {
        let excerpt = derive_excerpt("## Our Girl\n\n**Always** there, *always* kind.");
        assert_eq!(excerpt, "Our Girl Always there, always kind.");
    }

    #[test]
    fn uninterpreted_characters_stay_literal() {
        let excerpt = derive_excerpt("#1 dog, mr_bean to his friends.\n\nA lone * star.");
        assert_eq!(excerpt, "#1 dog, mr_bean to his friends. A lone * star.");
        assert_eq!(derive_excerpt("#### Not a heading"), "#### Not a heading");
    }

    #[test]
    fn long_messages_stop_at_a_sentence() {
        let first = "Biscuit was the gentlest soul we ever knew.";
        let second = "He greeted every visitor like an old friend.";
        let filler = "x".repeat(300);
        let message = format!("{first} {second} {filler}.");
        let excerpt = derive_excerpt(&message);
        assert_eq!(excerpt, format!("{first} {second}"));
        assert!(excerpt.chars().count() <= EXCERPT_LIMIT);
    }

    #[test]
    fn one_giant_sentence_is_cut_at_a_word() {
        let message = "word ".repeat(100);
        let excerpt = derive_excerpt(&message);
        assert!(excerpt.ends_with('…'));
        assert!(excerpt.chars().count() <= EXCERPT_LIMIT);
        assert!(!excerpt.contains("wor…"));
    }

    #[test]
    fn life_span_separators_are_unified() {
        assert_eq!(normalize_life_span("2008-2019"), "2008 – 2019");
        assert_eq!(normalize_life_span("2008 — 2019"), "2008 – 2019");
        assert_eq!(normalize_life_span("2008–2019"), "2008 – 2019");
        assert_eq!(normalize_life_span("May 2008 - June 2019"), "May 2008 – June 2019");
        assert_eq!(normalize_life_span("  2008   –   2019 "), "2008 – 2019");
    }

    #[test]
    fn life_span_without_separator_is_trimmed() {
        assert_eq!(normalize_life_span(""), "");
        assert_eq!(normalize_life_span("  Forever  young "), "Forever young");
        assert_eq!(normalize_life_span("2008-05-01"), "2008-05-01");
    }
}
