//! Document metadata from YAML (`---`) or TOML (`+++`) front matter.
//!
//! # Fields
//!
//! | Field    | Type        | Description                              |
//! |----------|-------------|------------------------------------------|
//! | `title`  | `String`    | Page title (defaults to the file stem)   |
//! | `desc`   | `String`    | Short description                        |
//! | `date`   | `YYYY-MM-DD`| Publication date                         |
//! | `status` | `bool`      | Publish flag (default: `false`)          |
//! | `js`     | `String`    | Raw script inlined into the page         |

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Front matter parse failure.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("invalid YAML front matter")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML front matter")]
    Toml(#[from] toml::de::Error),
}

/// Metadata record parsed from a document's front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: Option<String>,
    pub desc: Option<String>,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: Option<NaiveDate>,
    /// Publish flag. Documents without `status: true` are drafts.
    pub status: bool,
    pub js: Option<String>,
}

impl Metadata {
    /// Title if present and non-blank.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Date formatted as `YYYY-MM-DD`, or empty when absent.
    pub fn date_string(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Raw date values as they come out of either front matter format.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Toml(toml::value::Datetime),
}

/// Accept `YYYY-MM-DD`, a full timestamp starting with one, or a TOML date.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<RawDate>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawDate::Text(text)) => text,
        Some(RawDate::Toml(datetime)) => datetime.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("invalid date `{text}`, expected YYYY-MM-DD")))
}

/// Split a document into its metadata and body.
///
/// A document without a front matter block yields default metadata and the
/// whole text as body.
pub fn extract(content: &str) -> Result<(Metadata, &str), MetaError> {
    match detect_front_matter(content) {
        Some(FrontMatter::Yaml(block, body)) => Ok((parse_yaml(block)?, body)),
        Some(FrontMatter::Toml(block, body)) => Ok((toml::from_str(block)?, body)),
        None => Ok((Metadata::default(), content)),
    }
}

fn parse_yaml(block: &str) -> Result<Metadata, MetaError> {
    // An empty block deserializes as unit, not as an empty mapping.
    if block.trim().is_empty() {
        return Ok(Metadata::default());
    }
    Ok(serde_yaml::from_str(block)?)
}

enum FrontMatter<'a> {
    Yaml(&'a str, &'a str),
    Toml(&'a str, &'a str),
}

fn detect_front_matter(content: &str) -> Option<FrontMatter<'_>> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();

    for (fence, is_toml) in [("---", false), ("+++", true)] {
        let Some(rest) = trimmed.strip_prefix(fence) else {
            continue;
        };
        // Opening fence must sit alone on its line.
        if !rest.starts_with('\n') && !rest.starts_with("\r\n") {
            continue;
        }
        let closing = format!("\n{fence}");
        let end = rest.find(&closing)?;
        let block = rest[..end].trim();
        let after = &rest[end + closing.len()..];
        let body = after
            .split_once('\n')
            .map_or("", |(_, body)| body)
            .trim_start_matches(['\r', '\n']);

        return Some(if is_toml {
            FrontMatter::Toml(block, body)
        } else {
            FrontMatter::Yaml(block, body)
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_front_matter() {
        let doc = "---\ntitle: Hello\ndesc: A greeting\ndate: 2024-03-09\nstatus: true\njs: console.log(1)\n---\n\n# Body\n";
        let (meta, body) = extract(doc).unwrap();

        assert_eq!(meta.title(), Some("Hello"));
        assert_eq!(meta.desc.as_deref(), Some("A greeting"));
        assert_eq!(meta.date_string(), "2024-03-09");
        assert!(meta.status);
        assert_eq!(meta.js.as_deref(), Some("console.log(1)"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_toml_front_matter() {
        let doc = "+++\ntitle = \"Hello\"\nstatus = true\n+++\nBody";
        let (meta, body) = extract(doc).unwrap();

        assert_eq!(meta.title(), Some("Hello"));
        assert!(meta.status);
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_no_front_matter_is_draft() {
        let doc = "# Just a body\n";
        let (meta, body) = extract(doc).unwrap();

        assert_eq!(meta, Metadata::default());
        assert!(!meta.status);
        assert_eq!(body, doc);
    }

    #[test]
    fn test_empty_front_matter() {
        let (meta, body) = extract("---\n---\nBody").unwrap();
        assert_eq!(meta, Metadata::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_blank_title_is_absent() {
        let (meta, _) = extract("---\ntitle: \"  \"\nstatus: true\n---\n").unwrap();
        assert_eq!(meta.title(), None);

        let (meta, _) = extract("---\ntitle:\nstatus: true\n---\n").unwrap();
        assert_eq!(meta.title(), None);
    }

    #[test]
    fn test_timestamp_date_keeps_day() {
        let (meta, _) = extract("---\ndate: 2024-01-02T10:00:00Z\n---\n").unwrap();
        assert_eq!(meta.date_string(), "2024-01-02");
    }

    #[test]
    fn test_invalid_date_is_error() {
        assert!(extract("---\ndate: yesterday\n---\n").is_err());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let err = extract("---\ntitle: [unclosed\n---\nBody").unwrap_err();
        assert!(matches!(err, MetaError::Yaml(_)));
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let doc = "---\ntitle: Hello\n";
        let (meta, body) = extract(doc).unwrap();
        assert_eq!(meta, Metadata::default());
        assert_eq!(body, doc);
    }

    #[test]
    fn test_horizontal_rule_is_not_front_matter() {
        let doc = "---x\nnot front matter\n---\n";
        let (meta, body) = extract(doc).unwrap();
        assert_eq!(meta, Metadata::default());
        assert_eq!(body, doc);
    }
}
