//! Catalog of all discovered topics.
//!
//! Built once from a [`Registry`], immutable afterwards. Metadata is held in
//! memory; bodies are read back through each topic's loader on lookup.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::content::{self, Registry, TopicSource};
use crate::domain::{Source, Topic};
use crate::render::{self, Widget};
use crate::schema::{self, FieldError, Validation};

/// What to do when two topics share a slug
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the load
    #[default]
    Reject,
    /// Keep the first discovered, drop later ones
    FirstWins,
}

/// What to do with topics that fail validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPolicy {
    /// Leave them out of the catalog
    #[default]
    Exclude,
    /// Keep them, flagged with their field errors
    Include,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "reject"),
            DuplicatePolicy::FirstWins => write!(f, "first_wins"),
        }
    }
}

impl std::fmt::Display for InvalidPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPolicy::Exclude => write!(f, "exclude"),
            InvalidPolicy::Include => write!(f, "include"),
        }
    }
}

/// Load-time behaviour of a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPolicy {
    pub duplicates: DuplicatePolicy,
    pub invalid_topics: InvalidPolicy,
    /// Log aggregate validation results while loading
    pub validate_on_load: bool,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            duplicates: DuplicatePolicy::Reject,
            invalid_topics: InvalidPolicy::Exclude,
            validate_on_load: true,
        }
    }
}

/// Errors that stop a catalog from loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate slug '{slug}': {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
}

/// A topic with its body, as returned by a lookup
#[derive(Debug, Clone)]
pub struct TopicDocument {
    pub topic: Topic,

    /// Raw markdown after the frontmatter
    pub body: String,

    /// Rendered body
    pub widgets: Vec<Widget>,
}

/// Result of looking a topic up by slug
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Box<TopicDocument>),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_document(self) -> Option<TopicDocument> {
        match self {
            Lookup::Found(doc) => Some(*doc),
            Lookup::NotFound => None,
        }
    }
}

/// Previous and next topics in catalog order
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbors<'a> {
    pub previous: Option<&'a Topic>,
    pub next: Option<&'a Topic>,
}

struct Entry {
    source: Arc<dyn TopicSource>,
    /// Field errors when admitted without passing validation
    errors: Vec<FieldError>,
}

/// Catalog of all loaded topics
pub struct Catalog {
    topics: Vec<Topic>,
    entries: Vec<Entry>,
    /// Lowercased slug -> position
    index: HashMap<String, usize>,
    /// Sources that could not be read or parsed, or were excluded
    skipped: usize,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("topics", &self.topics.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}

/// Normalize a lookup identifier
pub fn normalize_slug(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

impl Catalog {
    /// Read, parse and validate every registered source.
    ///
    /// Unreadable or unparseable sources are logged and skipped. The only
    /// hard failure is a duplicate slug under [`DuplicatePolicy::Reject`].
    pub async fn load(registry: &Registry, policy: &CatalogPolicy) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            topics: Vec::with_capacity(registry.len()),
            entries: Vec::with_capacity(registry.len()),
            index: HashMap::new(),
            skipped: 0,
        };
        let mut passed = 0usize;
        let mut failed = 0usize;

        for registered in registry.entries() {
            let location = registered.source.location();

            let text = match registered.source.read().await {
                Ok(text) => text,
                Err(e) => {
                    error!(key = %registered.key, %location, "Failed to load topic: {:#}", e);
                    catalog.skipped += 1;
                    continue;
                }
            };

            let doc = match content::split(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    error!(key = %registered.key, %location, "Failed to parse topic: {}", e);
                    catalog.skipped += 1;
                    continue;
                }
            };

            let must_validate =
                policy.validate_on_load || policy.invalid_topics == InvalidPolicy::Exclude;

            let (topic, errors) = if must_validate {
                match schema::validate(&doc.frontmatter) {
                    Validation::Valid(topic) => {
                        passed += 1;
                        (topic, Vec::new())
                    }
                    Validation::Invalid(errors) => {
                        failed += 1;
                        if policy.validate_on_load {
                            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                            warn!(key = %registered.key, %location, errors = ?joined, "Topic validation failed");
                        }

                        if policy.invalid_topics == InvalidPolicy::Exclude {
                            catalog.skipped += 1;
                            continue;
                        }

                        match lenient(&doc.frontmatter) {
                            Some(topic) => (topic, errors),
                            None => {
                                error!(key = %registered.key, %location, "Topic frontmatter has the wrong shape");
                                catalog.skipped += 1;
                                continue;
                            }
                        }
                    }
                }
            } else {
                match lenient(&doc.frontmatter) {
                    Some(topic) => (topic, Vec::new()),
                    None => {
                        error!(key = %registered.key, %location, "Topic frontmatter has the wrong shape");
                        catalog.skipped += 1;
                        continue;
                    }
                }
            };

            let key = if topic.slug.trim().is_empty() {
                normalize_slug(&registered.key)
            } else {
                normalize_slug(&topic.slug)
            };

            if let Some(&existing) = catalog.index.get(&key) {
                let first = catalog.entries[existing].source.location();
                match policy.duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(CatalogError::DuplicateSlug {
                            slug: key,
                            first,
                            second: location,
                        });
                    }
                    DuplicatePolicy::FirstWins => {
                        warn!(slug = %key, %first, duplicate = %location, "Duplicate slug, keeping first");
                        catalog.skipped += 1;
                        continue;
                    }
                }
            }

            debug!(slug = %key, %location, "Loaded topic");
            catalog.index.insert(key, catalog.topics.len());
            catalog.topics.push(topic);
            catalog.entries.push(Entry {
                source: Arc::clone(&registered.source),
                errors,
            });
        }

        if policy.validate_on_load {
            if failed == 0 {
                info!("All {} topics validated successfully", passed);
            } else {
                warn!(passed, failed, "Topic validation found problems");
            }
        }

        Ok(catalog)
    }

    /// All topics in discovery order
    pub fn list_all(&self) -> &[Topic] {
        &self.topics
    }

    /// Metadata for a slug (case-insensitive)
    pub fn get(&self, identifier: &str) -> Option<&Topic> {
        self.position(identifier).map(|i| &self.topics[i])
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        self.index.get(&normalize_slug(identifier)).copied()
    }

    /// Resolve a topic and its rendered body.
    ///
    /// Missing topics and topics whose file can no longer be read, split or
    /// rendered all come back as [`Lookup::NotFound`].
    pub async fn get_by_slug(&self, identifier: &str) -> Lookup {
        let slug = normalize_slug(identifier);

        let Some(position) = self.position(&slug) else {
            warn!(%slug, "Topic not found");
            return Lookup::NotFound;
        };

        let source = &self.entries[position].source;
        let location = source.location();

        let text = match source.read().await {
            Ok(text) => text,
            Err(e) => {
                error!(%slug, %location, "Failed to load topic: {:#}", e);
                return Lookup::NotFound;
            }
        };

        let doc = match content::split(&text) {
            Ok(doc) => doc,
            Err(e) => {
                error!(%slug, %location, "Failed to parse topic: {}", e);
                return Lookup::NotFound;
            }
        };

        let widgets = match render::render(doc.body) {
            Ok(widgets) => widgets,
            Err(e) => {
                error!(%slug, %location, "Failed to render topic: {}", e);
                return Lookup::NotFound;
            }
        };

        Lookup::Found(Box::new(TopicDocument {
            topic: self.topics[position].clone(),
            body: doc.body.to_string(),
            widgets,
        }))
    }

    /// Topics before and after `identifier` in catalog order
    pub fn neighbors(&self, identifier: &str) -> Neighbors<'_> {
        let Some(position) = self.position(identifier) else {
            return Neighbors::default();
        };

        Neighbors {
            previous: position.checked_sub(1).map(|i| &self.topics[i]),
            next: self.topics.get(position + 1),
        }
    }

    /// Distinct domains in first-seen order
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = Vec::new();
        for topic in &self.topics {
            if !domains.contains(&topic.domain.as_str()) {
                domains.push(&topic.domain);
            }
        }
        domains
    }

    /// Field errors of a topic admitted without passing validation
    pub fn validation_errors(&self, identifier: &str) -> &[FieldError] {
        self.position(identifier)
            .map(|i| self.entries[i].errors.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a topic was admitted without passing validation
    pub fn is_invalid(&self, identifier: &str) -> bool {
        !self.validation_errors(identifier).is_empty()
    }

    /// Number of admitted topics that failed validation
    pub fn invalid_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.errors.is_empty()).count()
    }

    /// Number of sources left out of the catalog
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Build a topic without validation, field by field.
///
/// Scalars of the wrong type are stringified, non-string tags and
/// malformed sources are dropped. `None` only when the header is not a
/// mapping at all.
fn lenient(frontmatter: &Value) -> Option<Topic> {
    let map = frontmatter.as_mapping()?;
    let text = |key: &str| map.get(key).and_then(scalar_text).unwrap_or_default();

    let tags = map
        .get("tags")
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let sources = map.get("sources").and_then(Value::as_sequence).map(|seq| {
        seq.iter()
            .filter_map(|entry| {
                Some(Source {
                    title: entry.get("title").and_then(scalar_text)?,
                    url: entry.get("url").and_then(scalar_text)?,
                })
            })
            .collect()
    });

    Some(Topic {
        slug: text("slug"),
        title: text("title"),
        summary: text("summary"),
        domain: text("domain"),
        level: text("level"),
        time_to_read: text("timeToRead"),
        tags,
        updated: text("updated"),
        sources,
    })
}

/// String form of a scalar YAML value
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_text(slug: &str, domain: &str) -> String {
        format!(
            "---\nslug: {slug}\ntitle: {slug} title\nsummary: about {slug}\ndomain: {domain}\n\
             level: Beginner\ntimeToRead: 5m\nupdated: \"2024-01-01\"\n---\n\n## {slug}\n"
        )
    }

    #[tokio::test]
    async fn test_load_and_list_in_discovery_order() {
        let registry = Registry::new()
            .with_inline("b", topic_text("b-topic", "Cloud"))
            .with_inline("a", topic_text("a-topic", "DevOps"));

        let catalog = Catalog::load(&registry, &CatalogPolicy::default()).await.unwrap();
        let slugs: Vec<&str> = catalog.list_all().iter().map(|t| t.slug.as_str()).collect();

        assert_eq!(slugs, vec!["b-topic", "a-topic"]);
        assert_eq!(catalog.domains(), vec!["Cloud", "DevOps"]);
    }

    #[tokio::test]
    async fn test_neighbors() {
        let registry = Registry::new()
            .with_inline("a", topic_text("a", "X"))
            .with_inline("b", topic_text("b", "X"))
            .with_inline("c", topic_text("c", "X"));
        let catalog = Catalog::load(&registry, &CatalogPolicy::default()).await.unwrap();

        let middle = catalog.neighbors("B");
        assert_eq!(middle.previous.map(|t| t.slug.as_str()), Some("a"));
        assert_eq!(middle.next.map(|t| t.slug.as_str()), Some("c"));

        let first = catalog.neighbors("a");
        assert!(first.previous.is_none());

        let missing = catalog.neighbors("zzz");
        assert!(missing.previous.is_none() && missing.next.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_source_is_skipped() {
        let registry = Registry::new()
            .with_inline("broken", "no frontmatter here")
            .with_inline("ok", topic_text("ok", "X"));
        let catalog = Catalog::load(&registry, &CatalogPolicy::default()).await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped(), 1);
    }

    #[tokio::test]
    async fn test_unvalidated_load_keeps_wrongly_typed_topic() {
        let registry = Registry::new().with_inline(
            "typed",
            "---\nslug: typed\ntimeToRead: 7\ntags: [k8s, 3, true]\ndraft: false\n---\n",
        );
        let policy = CatalogPolicy {
            invalid_topics: InvalidPolicy::Include,
            validate_on_load: false,
            ..Default::default()
        };

        let catalog = Catalog::load(&registry, &policy).await.unwrap();
        let topic = catalog.get("typed").unwrap();

        assert_eq!(catalog.skipped(), 0);
        assert!(!catalog.is_invalid("typed"));
        assert_eq!(topic.time_to_read, "7");
        assert_eq!(topic.tags, vec!["k8s"]);
        assert!(topic.title.is_empty());
    }

    #[test]
    fn test_lenient_requires_a_mapping() {
        let list: Value = serde_yaml::from_str("[1, 2]").unwrap();
        assert!(lenient(&list).is_none());

        let header: Value = serde_yaml::from_str("level: 2\nupdated: 2024-01-01").unwrap();
        let topic = lenient(&header).unwrap();
        assert_eq!(topic.level, "2");
        assert_eq!(topic.updated, "2024-01-01");
        assert!(topic.sources.is_none());
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("  Some-Slug \n"), "some-slug");
    }
}
