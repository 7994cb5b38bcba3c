//! Frontmatter schema validation.
//!
//! Validation works on the untyped YAML value so that every problem in a
//! record is reported at once, each with the path of the offending field.
//! Malformed input is the expected case: nothing here panics or returns
//! `Err`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::domain::{Level, Source, Topic};
use crate::domain::topic::parse_updated;

/// Pattern every stored slug must match
pub const SLUG_PATTERN: &str = r"^[a-z0-9]+(-[a-z0-9]+)*$";

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SLUG_PATTERN).expect("slug pattern is valid"))
}

fn time_to_read_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+m$").expect("timeToRead pattern is valid"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*):(?P<rest>\S+)$")
            .expect("url pattern is valid")
    })
}

/// Whether a slug is lowercase kebab-case
pub fn is_kebab_case(slug: &str) -> bool {
    slug_regex().is_match(slug)
}

/// Whether a string is a syntactically valid absolute URL.
///
/// Hierarchical web schemes must carry a `//host` part.
pub fn is_absolute_url(raw: &str) -> bool {
    let Some(caps) = url_regex().captures(raw) else {
        return false;
    };

    let scheme = caps["scheme"].to_ascii_lowercase();
    let rest = &caps["rest"];

    match scheme.as_str() {
        "http" | "https" | "ftp" | "ws" | "wss" => rest
            .strip_prefix("//")
            .and_then(|authority| authority.split(['/', '?', '#']).next())
            .is_some_and(|host| !host.is_empty() && !host.starts_with(':')),
        _ => true,
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `sources.0.url`
    pub path: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of validating one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The normalized record
    Valid(Topic),

    /// Every failure, in field order
    Invalid(Vec<FieldError>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    /// Field errors (empty when valid)
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Validation::Valid(_) => &[],
            Validation::Invalid(errors) => errors,
        }
    }

    pub fn into_topic(self) -> Option<Topic> {
        match self {
            Validation::Valid(topic) => Some(topic),
            Validation::Invalid(_) => None,
        }
    }
}

/// Aggregate of validating a batch of records
#[derive(Debug, Clone, Default)]
pub struct ValidationSummary {
    pub results: Vec<Validation>,
    pub passed: usize,
    pub failed: usize,
}

impl ValidationSummary {
    pub fn all_valid(&self) -> bool {
        self.failed == 0
    }
}

/// Validate a batch of records
pub fn validate_all<'a>(records: impl IntoIterator<Item = &'a Value>) -> ValidationSummary {
    let mut summary = ValidationSummary::default();

    for record in records {
        let result = validate(record);
        if result.is_valid() {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
        summary.results.push(result);
    }

    summary
}

/// Validate one frontmatter record
pub fn validate(value: &Value) -> Validation {
    let Some(map) = value.as_mapping() else {
        return Validation::Invalid(vec![FieldError::new("(root)", "expected a mapping")]);
    };

    let mut errors = Vec::new();
    let mut fields = Fields { map, errors: &mut errors };

    let slug = fields.required_str("slug");
    if let Some(slug) = &slug {
        if !is_kebab_case(slug) {
            fields.push("slug", "must be lowercase kebab-case");
        }
    }

    let title = fields.required_str("title");
    let summary = fields.required_str("summary");

    let updated = fields.required_str("updated");
    if let Some(updated) = &updated {
        if parse_updated(updated).is_none() {
            fields.push("updated", "must be a valid ISO date string");
        }
    }

    let time_to_read = fields.required_str("timeToRead");
    if let Some(time_to_read) = &time_to_read {
        if !time_to_read_regex().is_match(time_to_read) {
            fields.push("timeToRead", "must be in format like '10m'");
        }
    }

    let level = if fields.get("level").is_none() {
        fields.push("level", "is required");
        None
    } else {
        fields.string("level")
    };
    if let Some(level) = &level {
        if level.parse::<Level>().is_err() {
            fields.push("level", "must be one of Beginner, Intermediate, Advanced");
        }
    }

    let domain = fields.required_str("domain");
    let tags = fields.string_list("tags");
    let sources = fields.sources("sources");

    if !errors.is_empty() {
        return Validation::Invalid(errors);
    }

    // every required field was checked above, so these are all present
    Validation::Valid(Topic {
        slug: slug.unwrap_or_default(),
        title: title.unwrap_or_default(),
        summary: summary.unwrap_or_default(),
        domain: domain.unwrap_or_default(),
        level: level.unwrap_or_default(),
        time_to_read: time_to_read.unwrap_or_default(),
        tags,
        updated: updated.unwrap_or_default(),
        sources,
    })
}

/// Field accessor that records failures as it goes
struct Fields<'a> {
    map: &'a Mapping,
    errors: &'a mut Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(path, message));
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// A string field; a present non-string value is reported
    fn string(&mut self, key: &str) -> Option<String> {
        match self.get(key) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.push(key, "expected a string");
                None
            }
        }
    }

    /// A non-empty string field
    fn required_str(&mut self, key: &str) -> Option<String> {
        if self.get(key).is_none() {
            self.push(key, "is required");
            return None;
        }

        let value = self.string(key)?;
        if value.trim().is_empty() {
            self.push(key, "is required");
            return None;
        }

        Some(value)
    }

    /// An optional list of strings, defaulting to empty
    fn string_list(&mut self, key: &str) -> Vec<String> {
        let Some(value) = self.get(key) else {
            return Vec::new();
        };

        let Some(seq) = value.as_sequence() else {
            self.push(key, "expected a list");
            return Vec::new();
        };

        let mut items = Vec::with_capacity(seq.len());
        let mut bad = Vec::new();
        for (i, item) in seq.iter().enumerate() {
            match item.as_str() {
                Some(s) => items.push(s.to_string()),
                None => bad.push(format!("{}.{}", key, i)),
            }
        }

        for path in bad {
            self.push(path, "expected a string");
        }

        items
    }

    /// An optional list of `{title, url}` entries
    fn sources(&mut self, key: &str) -> Option<Vec<Source>> {
        let value = self.get(key)?;

        let Some(seq) = value.as_sequence() else {
            self.push(key, "expected a list");
            return None;
        };

        let mut sources = Vec::with_capacity(seq.len());
        for (i, entry) in seq.iter().enumerate() {
            let base = format!("{}.{}", key, i);
            let Some(entry) = entry.as_mapping() else {
                self.push(base, "expected a mapping");
                continue;
            };

            let title = match entry.get("title") {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                Some(Value::String(_)) | None | Some(Value::Null) => {
                    self.push(format!("{}.title", base), "is required");
                    None
                }
                Some(_) => {
                    self.push(format!("{}.title", base), "expected a string");
                    None
                }
            };

            let url = match entry.get("url") {
                Some(Value::String(s)) if is_absolute_url(s) => Some(s.clone()),
                Some(Value::String(_)) => {
                    self.push(format!("{}.url", base), "must be a valid absolute URL");
                    None
                }
                None | Some(Value::Null) => {
                    self.push(format!("{}.url", base), "is required");
                    None
                }
                Some(_) => {
                    self.push(format!("{}.url", base), "expected a string");
                    None
                }
            };

            if let (Some(title), Some(url)) = (title, url) {
                sources.push(Source { title, url });
            }
        }

        Some(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    const VALID: &str = r#"
slug: release-trains
title: Release Trains
summary: Shipping on a fixed cadence
domain: Release
level: Intermediate
timeToRead: 12m
updated: "2024-06-01"
tags: [release, cadence]
sources:
  - title: SAFe
    url: https://example.com/safe
"#;

    #[test]
    fn test_valid_record_normalizes() {
        let result = validate(&record(VALID));
        let topic = result.into_topic().expect("record should be valid");

        assert_eq!(topic.slug, "release-trains");
        assert_eq!(topic.tags, vec!["release", "cadence"]);
        assert_eq!(topic.sources.unwrap()[0].title, "SAFe");
    }

    #[test]
    fn test_tags_default_to_empty() {
        let yaml = VALID.replace("tags: [release, cadence]\n", "");
        let topic = validate(&record(&yaml)).into_topic().unwrap();
        assert!(topic.tags.is_empty());
    }

    #[test]
    fn test_collects_every_error_in_field_order() {
        let yaml = r#"
slug: Release Trains
title: ""
level: Expert
timeToRead: 10min
updated: someday
domain: Release
summary: ok
"#;
        let result = validate(&record(yaml));
        let messages: Vec<String> = result.errors().iter().map(|e| e.to_string()).collect();

        assert_eq!(
            messages,
            vec![
                "slug: must be lowercase kebab-case",
                "title: is required",
                "updated: must be a valid ISO date string",
                "timeToRead: must be in format like '10m'",
                "level: must be one of Beginner, Intermediate, Advanced",
            ]
        );
    }

    #[test]
    fn test_missing_fields_are_required() {
        let result = validate(&record("slug: only-slug"));
        let paths: Vec<&str> = result.errors().iter().map(|e| e.path.as_str()).collect();

        assert_eq!(
            paths,
            vec!["title", "summary", "updated", "timeToRead", "level", "domain"]
        );
    }

    #[test]
    fn test_wrong_types_are_reported() {
        let yaml = VALID
            .replace("timeToRead: 12m", "timeToRead: 12")
            .replace("tags: [release, cadence]", "tags: [release, 3]");
        let result = validate(&record(&yaml));
        let messages: Vec<String> = result.errors().iter().map(|e| e.to_string()).collect();

        assert_eq!(
            messages,
            vec!["timeToRead: expected a string", "tags.1: expected a string"]
        );
    }

    #[test]
    fn test_source_url_must_be_absolute() {
        let yaml = VALID.replace("https://example.com/safe", "/docs/safe");
        let result = validate(&record(&yaml));
        assert_eq!(
            result.errors()[0].to_string(),
            "sources.0.url: must be a valid absolute URL"
        );
    }

    #[test]
    fn test_non_mapping_is_structured_error() {
        let result = validate(&Value::Null);
        assert_eq!(result.errors()[0].path, "(root)");

        let result = validate(&record("- a\n- b"));
        assert!(!result.is_valid());
    }

    #[test]
    fn test_url_syntax() {
        assert!(is_absolute_url("https://example.com"));
        assert!(is_absolute_url("http://localhost:8080/path?q=1"));
        assert!(is_absolute_url("mailto:someone@example.com"));
        assert!(!is_absolute_url("https://"));
        assert!(!is_absolute_url("https:example.com"));
        assert!(!is_absolute_url("example.com/page"));
        assert!(!is_absolute_url("not a url"));
    }

    #[test]
    fn test_validate_all_counts() {
        let good = record(VALID);
        let bad = record("slug: Bad");
        let summary = validate_all([&good, &bad, &good]);

        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_valid());
    }
}
