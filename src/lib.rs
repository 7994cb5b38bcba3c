//! learnhub - Learn topic content pipeline
//!
//! Loads learning topics from a directory of markdown files with YAML
//! frontmatter, validates them, and serves them for browsing.
//!
//! # Architecture
//!
//! Data flows one way:
//! - Discovery registers one loader per topic directory
//! - The catalog reads and validates every topic once
//! - Browsing filters and sorts the immutable topic list
//! - Lookups re-read a topic's body and render it into widgets
//!
//! # Modules
//!
//! - `domain`: Data structures (Topic, FilterState)
//! - `schema`: Frontmatter validation
//! - `content`: Frontmatter splitting and topic discovery
//! - `library`: The topic catalog
//! - `filter`: Search, facets and sorting
//! - `render`: Body markdown to widgets
//! - `verify`: Build-time content checks
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Check content before a build
//! learnhub verify --content-dir src/content/learn
//!
//! # Browse
//! learnhub list --domain Cloud --sort newest
//! learnhub show intro-to-kubernetes
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod domain;
pub mod filter;
pub mod library;
pub mod render;
pub mod schema;
pub mod verify;

// Re-export main types at crate root for convenience
pub use domain::{FilterState, Level, SortMode, Source, TimeBucket, Topic};
pub use filter::apply_filters;
pub use library::{Catalog, CatalogPolicy, LazyCatalog, Lookup, TopicDocument};
pub use render::Widget;
pub use schema::{validate, FieldError, Validation};
pub use verify::{verify_content_dir, VerifyReport};
