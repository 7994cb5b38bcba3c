//! Splitting a topic file into its YAML header and markdown body.
//!
//! ```text
//! ---
//! slug: ci-basics
//! title: CI Basics
//! ---
//!
//! ## What a pipeline does
//! ```
//!
//! Topic files must open with a `---` line and close the header with a
//! second `---` line. Anything else is a parse failure for that file.

use serde_yaml::Value;
use thiserror::Error;

/// Errors splitting a topic file
#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("missing frontmatter: file must start with a '---' line")]
    Missing,

    #[error("unterminated frontmatter: no closing '---' line")]
    Unterminated,

    #[error("invalid frontmatter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A topic file split into header and body
#[derive(Debug, Clone)]
pub struct Document<'a> {
    /// Parsed header (`Null` when the header is empty)
    pub frontmatter: Value,

    /// Everything after the closing delimiter
    pub body: &'a str,
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Split `text` into frontmatter and body
pub fn split(text: &str) -> Result<Document<'_>, FrontmatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if is_delimiter(first) => {}
        _ => return Err(FrontmatterError::Missing),
    }

    let header_start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let mut offset = header_start;

    for line in lines {
        if is_delimiter(line) {
            let yaml = &text[header_start..offset];
            let body = &text[offset + line.len()..];

            let frontmatter = if yaml.trim().is_empty() {
                Value::Null
            } else {
                serde_yaml::from_str(yaml)?
            };

            return Ok(Document { frontmatter, body });
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unterminated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_header_and_body() {
        let text = "---\nslug: a\ntitle: A\n---\n\n## Heading\n";
        let doc = split(text).unwrap();

        assert_eq!(doc.frontmatter.get("slug").and_then(|v| v.as_str()), Some("a"));
        assert_eq!(doc.body, "\n## Heading\n");
    }

    #[test]
    fn test_dashes_inside_body_are_kept() {
        let text = "---\nslug: a\n---\nintro\n---\nmore";
        let doc = split(text).unwrap();
        assert_eq!(doc.body, "intro\n---\nmore");
    }

    #[test]
    fn test_crlf_delimiters() {
        let text = "---\r\nslug: a\r\n---\r\nbody";
        let doc = split(text).unwrap();
        assert_eq!(doc.frontmatter.get("slug").and_then(|v| v.as_str()), Some("a"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_empty_header_is_null() {
        let doc = split("---\n---\nbody").unwrap();
        assert!(doc.frontmatter.is_null());
    }

    #[test]
    fn test_missing_and_unterminated() {
        assert!(matches!(split("# Title"), Err(FrontmatterError::Missing)));
        assert!(matches!(
            split("---\nslug: a\nbody"),
            Err(FrontmatterError::Unterminated)
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = split("---\nslug: [unclosed\n---\nbody");
        assert!(matches!(result, Err(FrontmatterError::Yaml(_))));
    }
}
