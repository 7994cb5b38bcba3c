//! Topic metadata as declared in a content file's frontmatter.
//!
//! Values are kept as written so that a topic admitted without passing
//! validation still sorts and filters. Typed views are exposed through
//! accessors that return `None` when the raw value does not parse.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Experience level of a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    /// All levels, in display order
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = anyhow::Error;

    /// Exact, case-sensitive match. Frontmatter must spell the level as listed.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown level: {}", s))
    }
}

/// External reference cited by a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// A single topic in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Unique lowercase kebab-case identifier
    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub summary: String,

    /// Subject area, used as a facet
    #[serde(default)]
    pub domain: String,

    /// One of Beginner, Intermediate, Advanced
    #[serde(default)]
    pub level: String,

    /// Estimated reading time, e.g. "10m"
    #[serde(default)]
    pub time_to_read: String,

    /// Display order matters: cards show the first few
    #[serde(default)]
    pub tags: Vec<String>,

    /// Last update as an ISO-8601 date or date-time
    #[serde(default)]
    pub updated: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

impl Topic {
    /// Parsed level, if the raw value is one of the known levels
    pub fn level(&self) -> Option<Level> {
        self.level.parse().ok()
    }

    /// Leading integer of `time_to_read` ("12m" -> 12)
    pub fn minutes(&self) -> Option<u32> {
        leading_minutes(&self.time_to_read)
    }

    /// Parsed `updated` timestamp
    pub fn updated_at(&self) -> Option<NaiveDateTime> {
        parse_updated(&self.updated)
    }

    /// Tags to show on a card plus the number left over
    pub fn tag_preview(&self, max: usize) -> (&[String], usize) {
        let shown = self.tags.len().min(max);
        (&self.tags[..shown], self.tags.len() - shown)
    }
}

/// Parse the leading run of ASCII digits, saturating at `u32::MAX`.
pub fn leading_minutes(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    let digits = &trimmed[..end];
    if digits.is_empty() {
        return None;
    }

    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Parse an `updated` value.
///
/// Accepts a plain date (`2024-01-31`), an RFC 3339 date-time, or a
/// date-time without offset (`2024-01-31T09:30:00`). Date-times with an
/// offset are normalized to UTC.
pub fn parse_updated(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str_is_exact() {
        assert_eq!("Beginner".parse::<Level>().unwrap(), Level::Beginner);
        assert_eq!("Advanced".parse::<Level>().unwrap(), Level::Advanced);
        assert!("beginner".parse::<Level>().is_err());
        assert!("Expert".parse::<Level>().is_err());
    }

    #[test]
    fn test_leading_minutes() {
        assert_eq!(leading_minutes("10m"), Some(10));
        assert_eq!(leading_minutes("5"), Some(5));
        assert_eq!(leading_minutes("15min"), Some(15));
        assert_eq!(leading_minutes("m10"), None);
        assert_eq!(leading_minutes(""), None);
        assert_eq!(leading_minutes("5000000000m"), Some(u32::MAX));
    }

    #[test]
    fn test_parse_updated_forms() {
        let day = parse_updated("2024-03-01").unwrap();
        assert_eq!(day.to_string(), "2024-03-01 00:00:00");

        let rfc = parse_updated("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(rfc.to_string(), "2024-03-01 08:00:00");

        assert!(parse_updated("2024-03-01T10:00:00").is_some());
        assert!(parse_updated("March 1st").is_none());
        assert!(parse_updated("2024-13-01").is_none());
    }

    #[test]
    fn test_frontmatter_keys_are_camel_case() {
        let yaml = r#"
slug: ci-basics
title: CI Basics
summary: What a pipeline does
domain: DevOps
level: Beginner
timeToRead: 8m
updated: "2024-05-01"
"#;
        let topic: Topic = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(topic.time_to_read, "8m");
        assert_eq!(topic.minutes(), Some(8));
        assert!(topic.tags.is_empty());
        assert!(topic.sources.is_none());
    }

    #[test]
    fn test_tag_preview() {
        let topic = Topic {
            tags: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            ..Default::default()
        };
        let (shown, rest) = topic.tag_preview(3);
        assert_eq!(shown.len(), 3);
        assert_eq!(rest, 2);
    }
}
