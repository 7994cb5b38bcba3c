//! Configuration for learnhub.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (LEARNHUB_CONTENT_DIR, LEARNHUB_PROFILE)
//! 2. Config file (.learnhub/config.yaml)
//! 3. Defaults (src/content/learn, development profile)
//!
//! Config file discovery:
//! - Searches current directory and parents for .learnhub/config.yaml
//! - Paths in config file are relative to the project root (parent of .learnhub/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::library::{CatalogPolicy, DuplicatePolicy, InvalidPolicy};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default content directory, relative to the project root
pub const DEFAULT_CONTENT_DIR: &str = "src/content/learn";

/// Build profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Development,
    Production,
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Development => write!(f, "development"),
            Profile::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            _ => anyhow::bail!("Unknown profile: {}", s),
        }
    }
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentConfig {
    /// Topic directory (relative to project root)
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    pub duplicates: Option<DuplicatePolicy>,
    pub invalid_topics: Option<InvalidPolicy>,
    /// Unset means: on for development, off for production
    pub validate_on_load: Option<bool>,
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub profile: Profile,
    /// Topic directory (absolute when a config file was found)
    pub content_dir: PathBuf,
    pub duplicates: DuplicatePolicy,
    pub invalid_topics: InvalidPolicy,
    pub validate_on_load: bool,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Development,
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            duplicates: DuplicatePolicy::default(),
            invalid_topics: InvalidPolicy::default(),
            validate_on_load: true,
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    /// Catalog load policy from this configuration
    pub fn catalog_policy(&self) -> CatalogPolicy {
        CatalogPolicy {
            duplicates: self.duplicates,
            invalid_topics: self.invalid_topics,
            validate_on_load: self.validate_on_load,
        }
    }
}

/// Environment overrides
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    content_dir: Option<String>,
    profile: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            content_dir: std::env::var("LEARNHUB_CONTENT_DIR").ok(),
            profile: std::env::var("LEARNHUB_PROFILE").ok(),
        }
    }
}

/// Find config file by searching a directory and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".learnhub").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge file settings, environment overrides and defaults
fn resolve(
    config_path: Option<&Path>,
    file: Option<ConfigFile>,
    env: &EnvOverrides,
) -> Result<ResolvedConfig> {
    let file_profile = file.as_ref().and_then(|f| f.profile);
    let profile = match &env.profile {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid LEARNHUB_PROFILE: {}", raw))?,
        None => file_profile.unwrap_or_default(),
    };

    // Project root is the parent of .learnhub/
    let base_dir = config_path
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(Path::new("."));

    let content_dir = if let Some(env_dir) = &env.content_dir {
        PathBuf::from(env_dir)
    } else if let Some(dir) = file.as_ref().and_then(|f| f.content.dir.as_deref()) {
        resolve_path(base_dir, dir)
    } else if config_path.is_some() {
        resolve_path(base_dir, DEFAULT_CONTENT_DIR)
    } else {
        PathBuf::from(DEFAULT_CONTENT_DIR)
    };

    let catalog = file.map(|f| f.catalog).unwrap_or_default();

    Ok(ResolvedConfig {
        profile,
        content_dir,
        duplicates: catalog.duplicates.unwrap_or_default(),
        invalid_topics: catalog.invalid_topics.unwrap_or_default(),
        validate_on_load: catalog
            .validate_on_load
            .unwrap_or(profile == Profile::Development),
        config_file: config_path.map(Path::to_path_buf),
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_path = find_config_file(&cwd);

    let file = match &config_path {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    resolve(config_path.as_deref(), file, &EnvOverrides::from_env())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the content directory.
pub fn content_dir() -> Result<PathBuf> {
    Ok(config()?.content_dir.clone())
}
