//! Tribute message rendering

use eyre::Result;

use crate::html::html_escape;

/// Turns an operator-entered message into a safe HTML fragment.
pub trait BodyRenderer {
    fn render(&self, message: &str) -> Result<String>;
}

/// Paragraphs plus a tiny markup subset: `## `/`### ` headings,
/// `**bold**` and `*italic*`. Everything else is escaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupBody;

impl BodyRenderer for MarkupBody {
    fn render(&self, message: &str) -> Result<String> {
        let message = message.replace("\r\n", "\n");
        let mut blocks = Vec::new();

        for block in message.split("\n\n") {
            let lines: Vec<&str> = block.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
            if lines.is_empty() {
                continue;
            }

            let mut paragraph: Vec<String> = Vec::new();
            for line in lines {
                if let Some((level, text)) = heading(line) {
                    if !paragraph.is_empty() {
                        blocks.push(format!("<p>{}</p>", paragraph.join("<br>\n")));
                        paragraph.clear();
                    }
                    blocks.push(format!("<h{level}>{}</h{level}>", inline(text)));
                } else {
                    paragraph.push(inline(line));
                }
            }
            if !paragraph.is_empty() {
                blocks.push(format!("<p>{}</p>", paragraph.join("<br>\n")));
            }
        }

        Ok(blocks.join("\n"))
    }
}

fn heading(line: &str) -> Option<(u8, &str)> {
    if let Some(text) = line.strip_prefix("### ") {
        Some((3, text.trim()))
    } else {
        line.strip_prefix("## ").map(|text| (2, text.trim()))
    }
}

/// Escape a line and apply bold/italic. Unbalanced markers stay literal.
fn inline(line: &str) -> String {
    let escaped = html_escape(line);
    let bolded = wrap_pairs(&escaped, "**", "strong");
    wrap_pairs(&bolded, "*", "em")
}

fn wrap_pairs(text: &str, marker: &str, tag: &str) -> String {
    let parts: Vec<&str> = text.split(marker).collect();
    // odd part count means every marker has a partner
    if parts.len() < 3 || parts.len() % 2 == 0 {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + parts.len() * 4);
    for (idx, part) in parts.iter().enumerate() {
        if idx % 2 == 1 {
            out.push_str(&format!("<{tag}>{part}</{tag}>"));
        } else {
            out.push_str(part);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(message: &str) -> String {
        MarkupBody.render(message).unwrap()
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(
            render("First line\nsecond line\n\nNew paragraph"),
            "<p>First line<br>\nsecond line</p>\n<p>New paragraph</p>"
        );
    }

    #[test]
    fn headings_bold_and_italic() {
        assert_eq!(
            render("## Our Boy\n**Always** *loyal*"),
            "<h2>Our Boy</h2>\n<p><strong>Always</strong> <em>loyal</em></p>"
        );
        assert_eq!(render("### Small"), "<h3>Small</h3>");
    }

    #[test]
    fn everything_else_is_escaped() {
        assert_eq!(
            render("<script>alert(1)</script> & more"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn unbalanced_markers_stay_literal() {
        assert_eq!(render("5 * 3 = 15"), "<p>5 * 3 = 15</p>");
    }
}
