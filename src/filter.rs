//! Search, facet filtering and sorting over a topic list.
//!
//! Stages run in a fixed order: text search, domain, level, time bucket,
//! then sort. Each facet with an empty selection is a pass-through.

use std::cmp::Reverse;

use chrono::NaiveDateTime;

use crate::domain::{FilterState, SortMode, Topic};

/// Select and order topics according to `state`.
///
/// The input slice is never reordered. Sorting is stable, so ties keep
/// their input order.
pub fn apply_filters<'a>(topics: &'a [Topic], state: &FilterState) -> Vec<&'a Topic> {
    let query = state.search_query.trim().to_lowercase();

    let mut selected: Vec<&Topic> = topics
        .iter()
        .filter(|topic| query.is_empty() || matches_query(topic, &query))
        .filter(|topic| {
            state.selected_domains.is_empty() || state.selected_domains.contains(&topic.domain)
        })
        .filter(|topic| {
            state.selected_levels.is_empty() || state.selected_levels.contains(&topic.level)
        })
        .filter(|topic| {
            state.selected_time_buckets.is_empty()
                || state
                    .selected_time_buckets
                    .iter()
                    .any(|bucket| bucket.contains(minutes_or_zero(topic)))
        })
        .collect();

    match state.sort_mode {
        SortMode::Relevance => {}
        SortMode::Shortest => selected.sort_by_key(|topic| minutes_or_zero(topic)),
        SortMode::Newest => selected.sort_by_key(|topic| Reverse(updated_or_min(topic))),
    }

    selected
}

/// Case-insensitive substring match over title, summary and tags.
/// `query` must already be lowercased.
fn matches_query(topic: &Topic, query: &str) -> bool {
    topic.title.to_lowercase().contains(query)
        || topic.summary.to_lowercase().contains(query)
        || topic.tags.iter().any(|t| t.to_lowercase().contains(query))
}

fn minutes_or_zero(topic: &Topic) -> u32 {
    topic.minutes().unwrap_or(0)
}

fn updated_or_min(topic: &Topic) -> NaiveDateTime {
    topic.updated_at().unwrap_or(NaiveDateTime::MIN)
}
