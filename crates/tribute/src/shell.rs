//! Page shell: wraps a rendered content fragment in a full HTML document
//!
//! The archive and detail renderers only ever produce fragments; the
//! `<html>`/`<head>` scaffolding belongs to whichever [`PageShell`] the
//! caller supplies.

use eyre::{Result, WrapErr, bail};
use indoc::indoc;
use std::path::Path;

use crate::html::html_escape;

/// What a page asks the shell to wrap.
#[derive(Debug, Clone, Copy)]
pub struct ShellInput<'a> {
    /// Plain-text title; the shell escapes it
    pub title: &'a str,
    /// Extra `<head>` markup (meta tags, links)
    pub head_extras: &'a str,
    /// Body fragment
    pub content: &'a str,
}

/// Turns a content fragment into a complete page.
pub trait PageShell {
    fn render(&self, page: &ShellInput<'_>) -> Result<String>;
}

const BUILTIN_TEMPLATE: &str = indoc! {r#"
    <!DOCTYPE html>
    <html lang="en">
    <head>
      <meta charset="UTF-8">
      <meta name="viewport" content="width=device-width, initial-scale=1.0">
      <title>{{TITLE}}</title>
      {{HEAD_META}}
    </head>
    <body>
    {{HEADER}}
    {{CONTENT}}
    {{FOOTER}}
    </body>
    </html>
"#};

/// Placeholder-substitution shell.
///
/// Templates use `{{TITLE}}`, `{{HEAD_META}}`, `{{HEADER}}`, `{{CONTENT}}`
/// and `{{FOOTER}}`. Only `{{CONTENT}}` is mandatory.
#[derive(Debug, Clone)]
pub struct TemplateShell {
    template: String,
    header: String,
    footer: String,
}

impl TemplateShell {
    pub fn builtin() -> Self {
        Self {
            template: BUILTIN_TEMPLATE.to_string(),
            header: String::new(),
            footer: String::new(),
        }
    }

    pub fn from_template(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains("{{CONTENT}}") {
            bail!("page template has no {{{{CONTENT}}}} placeholder");
        }
        Ok(Self {
            template,
            header: String::new(),
            footer: String::new(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read page template {}", path.display()))?;
        Self::from_template(template)
            .wrap_err_with(|| format!("Invalid page template {}", path.display()))
    }

    /// Markup injected at `{{HEADER}}` and `{{FOOTER}}`.
    pub fn with_chrome(mut self, header: impl Into<String>, footer: impl Into<String>) -> Self {
        self.header = header.into();
        self.footer = footer.into();
        self
    }
}

impl PageShell for TemplateShell {
    fn render(&self, page: &ShellInput<'_>) -> Result<String> {
        // CONTENT goes last so placeholders inside tribute text stay literal
        Ok(self
            .template
            .replace("{{TITLE}}", &html_escape(page.title))
            .replace("{{HEAD_META}}", page.head_extras)
            .replace("{{HEADER}}", &self.header)
            .replace("{{FOOTER}}", &self.footer)
            .replace("{{CONTENT}}", page.content))
    }
}
