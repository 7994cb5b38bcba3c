//! Domain types for the learning catalog.
//!
//! - Topic: frontmatter metadata of one content entry
//! - FilterState: search/facet/sort selections of a browsing session

pub mod filter_state;
pub mod topic;

pub use filter_state::{FilterState, SortMode, TimeBucket};
pub use topic::{Level, Source, Topic};
