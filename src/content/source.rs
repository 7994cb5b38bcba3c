//! Topic sources and the discovery registry.
//!
//! Discovery runs once and yields an ordered registry of
//! `(location, loader)` pairs. Lookups go through the registry rather
//! than matching file paths as strings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

/// File names recognised as a topic's content file, in priority order
pub const INDEX_FILES: [&str; 2] = ["index.mdx", "index.md"];

/// Something that can produce a topic file's text
#[async_trait]
pub trait TopicSource: Send + Sync {
    /// Human-readable location used in logs (usually a path)
    fn location(&self) -> String;

    /// Read the full text (frontmatter + body)
    async fn read(&self) -> Result<String>;
}

/// Topic file on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TopicSource for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read topic file: {}", self.path.display()))
    }
}

/// In-memory topic text, for embedded content and tests
#[derive(Debug, Clone)]
pub struct InlineSource {
    name: String,
    text: String,
}

impl InlineSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl TopicSource for InlineSource {
    fn location(&self) -> String {
        format!("inline:{}", self.name)
    }

    async fn read(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// One discovered topic
#[derive(Clone)]
pub struct RegistryEntry {
    /// Storage key: the topic's directory name
    pub key: String,

    /// Directory holding the topic's content file and assets, if on disk
    pub dir: Option<PathBuf>,

    pub source: Arc<dyn TopicSource>,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("key", &self.key)
            .field("dir", &self.dir)
            .field("location", &self.source.location())
            .finish()
    }
}

/// Ordered collection of discovered topic sources
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source under a storage key
    pub fn register(&mut self, key: impl Into<String>, source: Arc<dyn TopicSource>) {
        self.entries.push(RegistryEntry {
            key: key.into(),
            dir: None,
            source,
        });
    }

    /// Append an in-memory topic
    pub fn with_inline(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        let key = key.into();
        let source = Arc::new(InlineSource::new(key.clone(), text));
        self.register(key, source);
        self
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discover `<content_dir>/*/index.mdx` (or `index.md`).
    ///
    /// Entries are ordered by directory name. A directory holding both
    /// file names uses `index.mdx`. Fails only when the content directory
    /// itself cannot be read.
    pub fn discover(content_dir: &Path) -> Result<Self> {
        if !content_dir.is_dir() {
            anyhow::bail!("Content directory not found: {}", content_dir.display());
        }

        std::fs::read_dir(content_dir).with_context(|| {
            format!("Failed to read content directory: {}", content_dir.display())
        })?;

        let mut found: Vec<(String, PathBuf)> = Vec::new();

        for index_name in INDEX_FILES {
            let pattern = format!(
                "{}/*/{}",
                glob::Pattern::escape(&content_dir.to_string_lossy()),
                index_name
            );

            // hidden directories (".drafts/") are not topics
            let options = glob::MatchOptions {
                require_literal_leading_dot: true,
                ..glob::MatchOptions::new()
            };
            let paths = glob::glob_with(&pattern, options)
                .with_context(|| format!("Invalid discovery pattern: {}", pattern))?;

            for path in paths {
                let path = match path {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };

                let Some(key) = path
                    .parent()
                    .and_then(|dir| dir.file_name())
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
                else {
                    continue;
                };

                if found.iter().any(|(existing, _)| existing == &key) {
                    continue;
                }
                found.push((key, path));
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));

        let entries = found
            .into_iter()
            .map(|(key, path)| RegistryEntry {
                key,
                dir: path.parent().map(Path::to_path_buf),
                source: Arc::new(FileSource::new(path)),
            })
            .collect();

        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, text: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_discover_orders_by_directory() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "zeta/index.mdx", "z");
        write(temp.path(), "alpha/index.md", "a");
        write(temp.path(), "mid/index.mdx", "m");
        write(temp.path(), "mid/index.md", "ignored");
        write(temp.path(), "loose.mdx", "not a topic");
        write(temp.path(), "empty-dir/notes.txt", "no index");

        let registry = Registry::discover(temp.path()).unwrap();
        let keys: Vec<&str> = registry.entries().iter().map(|e| e.key.as_str()).collect();

        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
        assert!(registry.entries()[1].source.location().ends_with("index.mdx"));
    }

    #[test]
    fn test_discover_skips_hidden_directories() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "ok/index.mdx", "---\nslug: ok\n---\n");
        write(temp.path(), ".drafts/index.mdx", "---\nslug: ok\n---\n");

        let registry = Registry::discover(temp.path()).unwrap();
        let keys: Vec<&str> = registry.entries().iter().map(|e| e.key.as_str()).collect();

        assert_eq!(keys, vec!["ok"]);
    }

    #[test]
    fn test_discover_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        assert!(Registry::discover(&temp.path().join("nope")).is_err());
    }

    #[tokio::test]
    async fn test_file_and_inline_sources_read() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/index.mdx", "---\nslug: a\n---\n");

        let registry = Registry::discover(temp.path()).unwrap();
        let text = registry.entries()[0].source.read().await.unwrap();
        assert!(text.contains("slug: a"));

        let inline = InlineSource::new("b", "hello");
        assert_eq!(inline.read().await.unwrap(), "hello");
        assert_eq!(inline.location(), "inline:b");
    }
}
