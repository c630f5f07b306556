//! The page model handed to the layout template.

use minijinja::Value;

use super::Metadata;

/// Logical URL prefix of the mirrored assets directory.
pub const ASSETS_PATH: &str = "/assets";

/// Everything the layout template can see, exposed to it as `page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageModel {
    pub title: String,
    pub desc: String,
    /// `YYYY-MM-DD`, empty when the document has no date.
    pub date: String,
    /// Rendered body markup.
    pub content: String,
    pub inline_css: String,
    pub inline_js: String,
    pub assets_path: &'static str,
}

impl PageModel {
    pub fn new(meta: Metadata, title: String, content: String, inline_css: String) -> Self {
        let date = meta.date_string();
        Self {
            title,
            desc: meta.desc.unwrap_or_default(),
            date,
            content,
            inline_css,
            inline_js: meta.js.unwrap_or_default(),
            assets_path: ASSETS_PATH,
        }
    }

    /// Template value. Markup fields are marked safe so auto-escaping
    /// leaves them intact; plain text fields are escaped.
    pub fn to_value(&self) -> Value {
        Value::from_iter([
            ("title", Value::from(self.title.as_str())),
            ("desc", Value::from(self.desc.as_str())),
            ("date", Value::from(self.date.as_str())),
            ("content", Value::from_safe_string(self.content.clone())),
            ("inline_css", Value::from_safe_string(self.inline_css.clone())),
            ("inline_js", Value::from_safe_string(self.inline_js.clone())),
            ("assets_path", Value::from_safe_string(self.assets_path.to_string())),
        ])
    }
}
