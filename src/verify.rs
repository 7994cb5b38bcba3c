//! Build-time verification of a content directory.
//!
//! Every subdirectory of the content directory is one topic. Checks, per
//! topic: frontmatter schema, duplicate slugs, slug and directory casing,
//! relative asset references. A slug that differs from its directory name
//! is a warning only.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::content::{self, Registry, TopicSource};
use crate::render;
use crate::schema::{self, is_kebab_case, Validation};

/// Verification could not run at all
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Failed to read content directory {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Category of a verification problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Schema,
    Duplicate,
    Casing,
    Asset,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueKind::Schema => "schema",
            IssueKind::Duplicate => "duplicate",
            IssueKind::Casing => "casing",
            IssueKind::Asset => "asset",
        };
        write!(f, "{}", s)
    }
}

/// One error found in a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Topic slug, or its directory name when no slug is available
    pub slug: String,
    pub kind: IssueKind,
    pub message: String,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.slug, self.kind, self.message)
    }
}

/// Outcome of verifying a content directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub content_dir: PathBuf,
    pub topics_checked: usize,
    /// Topics with no errors
    pub valid: usize,
    pub errors: Vec<Issue>,
    pub warnings: Vec<String>,
}

impl VerifyReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors grouped by kind, in kind order
    pub fn errors_by_kind(&self) -> BTreeMap<IssueKind, Vec<&Issue>> {
        let mut grouped: BTreeMap<IssueKind, Vec<&Issue>> = BTreeMap::new();
        for issue in &self.errors {
            grouped.entry(issue.kind).or_default().push(issue);
        }
        grouped
    }
}

/// Verify every topic directory under `content_dir`.
///
/// Problems with individual topics land in the report; only an unreadable
/// content directory is an error.
pub async fn verify_content_dir(content_dir: &Path) -> Result<VerifyReport, VerifyError> {
    let unreadable = |reason: String| VerifyError::Unreadable {
        path: content_dir.to_path_buf(),
        reason,
    };

    let mut topic_dirs: Vec<(String, PathBuf)> = std::fs::read_dir(content_dir)
        .map_err(|e| unreadable(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            (!name.starts_with('.')).then(|| (name, entry.path()))
        })
        .collect();
    topic_dirs.sort();

    let registry = Registry::discover(content_dir).map_err(|e| unreadable(format!("{:#}", e)))?;
    let sources: HashMap<&str, &dyn TopicSource> = registry
        .entries()
        .iter()
        .map(|entry| (entry.key.as_str(), entry.source.as_ref()))
        .collect();

    info!(dir = %content_dir.display(), topics = topic_dirs.len(), "Verifying topics");

    let mut report = VerifyReport {
        content_dir: content_dir.to_path_buf(),
        topics_checked: topic_dirs.len(),
        ..Default::default()
    };
    // lowercased slug -> directory that claimed it first
    let mut seen: HashMap<String, String> = HashMap::new();

    for (dir_name, dir_path) in &topic_dirs {
        let before = report.errors.len();
        check_topic(
            dir_name,
            dir_path,
            sources.get(dir_name.as_str()).copied(),
            &mut seen,
            &mut report,
        )
        .await;

        if report.errors.len() == before {
            report.valid += 1;
            debug!(topic = %dir_name, "Topic valid");
        }
    }

    Ok(report)
}

async fn check_topic(
    dir_name: &str,
    dir_path: &Path,
    source: Option<&dyn TopicSource>,
    seen: &mut HashMap<String, String>,
    report: &mut VerifyReport,
) {
    if !is_kebab_case(dir_name) {
        report.errors.push(Issue {
            slug: dir_name.to_string(),
            kind: IssueKind::Casing,
            message: format!("Directory name '{}' must be lowercase kebab-case", dir_name),
        });
    }

    let Some(source) = source else {
        report.errors.push(parse_failure(dir_name, "no index.mdx or index.md found"));
        return;
    };

    let text = match source.read().await {
        Ok(text) => text,
        Err(e) => {
            report.errors.push(parse_failure(dir_name, &format!("{:#}", e)));
            return;
        }
    };

    let doc = match content::split(&text) {
        Ok(doc) => doc,
        Err(e) => {
            report.errors.push(parse_failure(dir_name, &e.to_string()));
            return;
        }
    };

    let raw_slug = raw_slug(&doc.frontmatter);
    let slug = raw_slug.clone().unwrap_or_else(|| dir_name.to_string());

    if let Validation::Invalid(field_errors) = schema::validate(&doc.frontmatter) {
        for field_error in field_errors {
            let uppercase_slug = field_error.path == "slug"
                && raw_slug
                    .as_deref()
                    .is_some_and(|s| s.chars().any(|c| c.is_uppercase()));

            report.errors.push(if uppercase_slug {
                Issue {
                    slug: slug.clone(),
                    kind: IssueKind::Casing,
                    message: "Slug must be lowercase kebab-case".to_string(),
                }
            } else {
                Issue {
                    slug: slug.clone(),
                    kind: IssueKind::Schema,
                    message: field_error.to_string(),
                }
            });
        }
    }

    if let Some(raw) = &raw_slug {
        let key = raw.trim().to_lowercase();
        if let Some(first) = seen.get(&key) {
            report.errors.push(Issue {
                slug: slug.clone(),
                kind: IssueKind::Duplicate,
                message: format!("Duplicate slug found (also used by '{}')", first),
            });
        } else {
            seen.insert(key, dir_name.to_string());
        }

        if raw != dir_name {
            report.warnings.push(format!(
                "Slug \"{}\" doesn't match directory name \"{}\"",
                raw, dir_name
            ));
        }
    }

    if let Err(e) = render::render(doc.body) {
        report.errors.push(Issue {
            slug: slug.clone(),
            kind: IssueKind::Schema,
            message: format!("Failed to render: {}", e),
        });
    }

    for asset in render::asset_references(doc.body) {
        if !dir_path.join(&asset).exists() {
            report.errors.push(Issue {
                slug: slug.clone(),
                kind: IssueKind::Asset,
                message: format!("Missing asset: {}", asset),
            });
        }
    }
}

fn raw_slug(frontmatter: &Value) -> Option<String> {
    frontmatter
        .get("slug")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn parse_failure(dir_name: &str, reason: &str) -> Issue {
    Issue {
        slug: dir_name.to_string(),
        kind: IssueKind::Schema,
        message: format!("Failed to parse: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_topic(root: &Path, dir: &str, slug: &str, body: &str) {
        let topic_dir = root.join(dir);
        std::fs::create_dir_all(&topic_dir).unwrap();
        std::fs::write(
            topic_dir.join("index.mdx"),
            format!(
                "---\nslug: {slug}\ntitle: T\nsummary: S\ndomain: D\nlevel: Beginner\n\
                 timeToRead: 5m\nupdated: \"2024-01-01\"\n---\n{body}\n"
            ),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_clean_directory() {
        let tmp = TempDir::new().unwrap();
        write_topic(tmp.path(), "alpha", "alpha", "# Alpha");
        write_topic(tmp.path(), "beta", "beta", "# Beta");

        let report = verify_content_dir(tmp.path()).await.unwrap();

        assert_eq!(report.topics_checked, 2);
        assert_eq!(report.valid, 2);
        assert!(!report.has_errors());
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_slug_names_the_slug() {
        let tmp = TempDir::new().unwrap();
        write_topic(tmp.path(), "one", "shared", "");
        write_topic(tmp.path(), "two", "shared", "");

        let report = verify_content_dir(tmp.path()).await.unwrap();
        let duplicates = &report.errors_by_kind()[&IssueKind::Duplicate];

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].slug, "shared");
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.valid, 1);
    }

    #[tokio::test]
    async fn test_uppercase_slug_is_casing_error() {
        let tmp = TempDir::new().unwrap();
        write_topic(tmp.path(), "my-topic", "My-Topic", "");

        let report = verify_content_dir(tmp.path()).await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, IssueKind::Casing);
    }

    #[tokio::test]
    async fn test_uppercase_directory_is_casing_error() {
        let tmp = TempDir::new().unwrap();
        write_topic(tmp.path(), "My-Topic", "my-topic", "");

        let report = verify_content_dir(tmp.path()).await.unwrap();

        assert!(report
            .errors
            .iter()
            .any(|e| e.kind == IssueKind::Casing && e.message.contains("My-Topic")));
    }

    #[tokio::test]
    async fn test_missing_asset() {
        let tmp = TempDir::new().unwrap();
        write_topic(
            tmp.path(),
            "pics",
            "pics",
            "![there](there.png)\n\n![gone](gone.png)",
        );
        std::fs::write(tmp.path().join("pics/there.png"), b"png").unwrap();

        let report = verify_content_dir(tmp.path()).await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, IssueKind::Asset);
        assert!(report.errors[0].message.contains("gone.png"));
    }

    #[tokio::test]
    async fn test_directory_without_index_is_parse_failure() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("empty")).unwrap();

        let report = verify_content_dir(tmp.path()).await.unwrap();

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.starts_with("Failed to parse"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = verify_content_dir(&tmp.path().join("nope")).await;
        assert!(matches!(result, Err(VerifyError::Unreadable { .. })));
    }
}
