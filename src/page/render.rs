//! Markdown rendering and syntax highlight styles.
//!
//! Both entry points are pure: the syntax and theme sets are loaded once and
//! shared read-only across build workers.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use thiserror::Error;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Highlight class prefix style shared by the markup and the CSS.
const CLASS_STYLE: ClassStyle = ClassStyle::Spaced;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("highlight style `{0}` not found")]
    StyleNotFound(String),

    #[error("failed to generate highlight CSS")]
    Css(#[from] syntect::Error),
}

fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_FOOTNOTES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    opts
}

/// Render a markdown body to HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, Highlighter::new(parser));
    html
}

/// CSS for the named highlight theme.
pub fn highlight_css(style: &str) -> Result<String, RenderError> {
    let theme = THEME_SET
        .themes
        .get(style)
        .ok_or_else(|| RenderError::StyleNotFound(style.to_string()))?;
    Ok(css_for_theme_with_class_style(theme, CLASS_STYLE)?)
}

/// Names of the bundled highlight themes.
pub fn available_styles() -> impl Iterator<Item = &'static str> {
    THEME_SET.themes.keys().map(String::as_str)
}

/// Replaces fenced code blocks in a recognized language with highlighted HTML.
///
/// Blocks in unknown languages pass through untouched.
struct Highlighter<I> {
    inner: I,
    block: Option<(&'static SyntaxReference, String)>,
}

impl<I> Highlighter<I> {
    fn new(inner: I) -> Self {
        Self { inner, block: None }
    }
}

impl<'a, I> Iterator for Highlighter<I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Event<'a>> {
        loop {
            let event = self.inner.next()?;

            if let Some((syntax, source)) = &mut self.block {
                match event {
                    Event::Text(text) => source.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let html = highlight_block(syntax, source);
                        self.block = None;
                        return Some(Event::Html(html.into()));
                    }
                    _ => {}
                }
                continue;
            }

            if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &event
                && let Some(syntax) = find_syntax(info)
            {
                self.block = Some((syntax, String::new()));
                continue;
            }

            return Some(event);
        }
    }
}

/// Look up the syntax named by the first token of a fence info string
/// (`rust`, `rust,ignore`, `python {.numbered}`).
fn find_syntax(info: &str) -> Option<&'static SyntaxReference> {
    let token = info
        .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|t| !t.is_empty())?;
    SYNTAX_SET.find_syntax_by_token(token)
}

fn highlight_block(syntax: &SyntaxReference, source: &str) -> String {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
    for line in LinesWithEndings::from(source) {
        if generator
            .parse_html_for_line_which_includes_newline(line)
            .is_err()
        {
            return format!("<pre><code>{}</code></pre>\n", escape_html(source));
        }
    }
    format!("<pre class=\"code\"><code>{}</code></pre>\n", generator.finalize())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_basics() {
        let html = markdown_to_html("# Title\n\nSome *emphasis* and ~~strike~~.\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<del>strike</del>"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = markdown_to_html("<div class=\"note\">hi</div>\n");
        assert!(html.contains("<div class=\"note\">hi</div>"));
    }

    #[test]
    fn test_known_language_is_highlighted() {
        let html = markdown_to_html("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre class=\"code\">"));
        assert!(html.contains("<span class=\""));
        assert!(!html.contains("language-rust"));
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let html = markdown_to_html("```nosuchlang\n<tag>\n```\n");
        assert!(html.contains("language-nosuchlang"));
        assert!(html.contains("&lt;tag&gt;"));
    }

    #[test]
    fn test_text_after_code_block_survives() {
        let html = markdown_to_html("```rust\nlet x = 1;\n```\n\nafter\n");
        assert!(html.contains("<p>after</p>"));
    }

    #[test]
    fn test_highlight_css() {
        let css = highlight_css("base16-ocean.dark").unwrap();
        assert!(css.contains('{'));
    }

    #[test]
    fn test_highlight_css_unknown_style() {
        let err = highlight_css("no-such-theme").unwrap_err();
        assert!(matches!(err, RenderError::StyleNotFound(name) if name == "no-such-theme"));
    }

    #[test]
    fn test_available_styles_include_default() {
        assert!(available_styles().any(|s| s == "base16-ocean.dark"));
    }

    #[test]
    fn test_find_syntax_tokens() {
        assert!(find_syntax("rust,ignore").is_some());
        assert!(find_syntax("python {.numbered}").is_some());
        assert!(find_syntax("").is_none());
    }
}
