//! Search, facet and sort selections for a browsing session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Reading-time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// 5 minutes or less
    UpTo5,
    /// More than 5, at most 15 minutes
    From5To15,
    /// More than 15 minutes
    Over15,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 3] = [TimeBucket::UpTo5, TimeBucket::From5To15, TimeBucket::Over15];

    /// Whether a reading time in minutes falls in this bucket
    pub fn contains(&self, minutes: u32) -> bool {
        match self {
            TimeBucket::UpTo5 => minutes <= 5,
            TimeBucket::From5To15 => minutes > 5 && minutes <= 15,
            TimeBucket::Over15 => minutes > 15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeBucket::UpTo5 => "≤5m",
            TimeBucket::From5To15 => "5-15m",
            TimeBucket::Over15 => "15m+",
        }
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for TimeBucket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim() {
            "≤5m" | "<=5m" | "short" => Ok(TimeBucket::UpTo5),
            "5-15m" | "5–15m" | "medium" => Ok(TimeBucket::From5To15),
            "15m+" | ">15m" | "long" => Ok(TimeBucket::Over15),
            _ => anyhow::bail!("Unknown time bucket: {}", s),
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Catalog order
    #[default]
    Relevance,
    /// Most recently updated first
    Newest,
    /// Shortest reading time first
    Shortest,
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortMode::Relevance => write!(f, "relevance"),
            SortMode::Newest => write!(f, "newest"),
            SortMode::Shortest => write!(f, "shortest"),
        }
    }
}

impl std::str::FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortMode::Relevance),
            "newest" => Ok(SortMode::Newest),
            "shortest" => Ok(SortMode::Shortest),
            _ => anyhow::bail!("Unknown sort mode: {}", s),
        }
    }
}

/// Active search/filter/sort selections.
///
/// Empty sets mean "no filter" for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub search_query: String,

    #[serde(default)]
    pub selected_domains: BTreeSet<String>,

    #[serde(default)]
    pub selected_levels: BTreeSet<String>,

    #[serde(default)]
    pub selected_time_buckets: BTreeSet<TimeBucket>,

    #[serde(default)]
    pub sort_mode: SortMode,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.selected_domains.insert(domain.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.selected_levels.insert(level.into());
        self
    }

    pub fn with_time_bucket(mut self, bucket: TimeBucket) -> Self {
        self.selected_time_buckets.insert(bucket);
        self
    }

    pub fn with_sort(mut self, sort_mode: SortMode) -> Self {
        self.sort_mode = sort_mode;
        self
    }

    /// Add the domain if absent, remove it if present
    pub fn toggle_domain(&mut self, domain: &str) {
        if !self.selected_domains.remove(domain) {
            self.selected_domains.insert(domain.to_string());
        }
    }

    /// Add the level if absent, remove it if present
    pub fn toggle_level(&mut self, level: &str) {
        if !self.selected_levels.remove(level) {
            self.selected_levels.insert(level.to_string());
        }
    }

    /// Add the bucket if absent, remove it if present
    pub fn toggle_time_bucket(&mut self, bucket: TimeBucket) {
        if !self.selected_time_buckets.remove(&bucket) {
            self.selected_time_buckets.insert(bucket);
        }
    }

    /// Whether any search text or facet is selected (sort is not a filter)
    pub fn is_active(&self) -> bool {
        !self.search_query.trim().is_empty()
            || !self.selected_domains.is_empty()
            || !self.selected_levels.is_empty()
            || !self.selected_time_buckets.is_empty()
    }

    /// Reset every selection, including the sort mode
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
