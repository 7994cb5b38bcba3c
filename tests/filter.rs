//! Filter/Sort Integration Tests
//!
//! Properties of `apply_filters` over generated topic lists, plus the
//! worked example from the browsing view.

use learnhub::domain::{FilterState, SortMode, TimeBucket, Topic};
use learnhub::filter::apply_filters;
use proptest::prelude::*;

fn topic(slug: &str, time: &str, updated: &str, domain: &str, level: &str) -> Topic {
    Topic {
        slug: slug.to_string(),
        title: slug.to_uppercase(),
        summary: String::new(),
        domain: domain.to_string(),
        level: level.to_string(),
        time_to_read: time.to_string(),
        updated: updated.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_worked_example() {
    let topics = vec![
        topic("a", "5m", "2024-01-01", "X", "Beginner"),
        topic("b", "20m", "2025-01-01", "Y", "Advanced"),
    ];

    let short = FilterState::new().with_time_bucket(TimeBucket::UpTo5);
    let result: Vec<&str> = apply_filters(&topics, &short)
        .iter()
        .map(|t| t.slug.as_str())
        .collect();
    assert_eq!(result, vec!["a"]);

    let newest = FilterState::new().with_sort(SortMode::Newest);
    let result: Vec<&str> = apply_filters(&topics, &newest)
        .iter()
        .map(|t| t.slug.as_str())
        .collect();
    assert_eq!(result, vec!["b", "a"]);
}

fn arb_topic() -> impl Strategy<Value = Topic> {
    (
        prop_oneof![Just("X"), Just("Y"), Just("Z")],
        prop_oneof![Just("Beginner"), Just("Intermediate"), Just("Advanced")],
        prop_oneof![
            (0u32..40).prop_map(|m| format!("{}m", m)),
            Just("soon".to_string()),
        ],
        prop_oneof![
            (2020i32..2026, 1u32..13, 1u32..29)
                .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d)),
            Just("whenever".to_string()),
        ],
        prop::collection::vec(prop_oneof![Just("rust"), Just("cloud"), Just("Ops")], 0..3),
    )
        .prop_map(|(domain, level, time, updated, tags)| Topic {
            title: format!("{} {}", domain, level),
            summary: format!("{} minutes", time),
            domain: domain.to_string(),
            level: level.to_string(),
            time_to_read: time,
            updated,
            tags: tags.into_iter().map(str::to_string).collect(),
            ..Default::default()
        })
}

/// Topics with positional slugs so input order is observable
fn arb_topics() -> impl Strategy<Value = Vec<Topic>> {
    prop::collection::vec(arb_topic(), 0..24).prop_map(|mut topics| {
        for (i, topic) in topics.iter_mut().enumerate() {
            topic.slug = format!("t{}", i);
        }
        topics
    })
}

fn arb_state() -> impl Strategy<Value = FilterState> {
    (
        prop::collection::btree_set(prop_oneof![Just("X"), Just("Y")], 0..2),
        prop::collection::btree_set(prop_oneof![Just("Beginner"), Just("Advanced")], 0..2),
        prop::collection::btree_set(
            prop_oneof![
                Just(TimeBucket::UpTo5),
                Just(TimeBucket::From5To15),
                Just(TimeBucket::Over15)
            ],
            0..3,
        ),
        prop_oneof![Just(""), Just("rust"), Just("OPS"), Just("beginner")],
    )
        .prop_map(|(domains, levels, buckets, query)| FilterState {
            search_query: query.to_string(),
            selected_domains: domains.into_iter().map(str::to_string).collect(),
            selected_levels: levels.into_iter().map(str::to_string).collect(),
            selected_time_buckets: buckets,
            sort_mode: SortMode::Relevance,
        })
}

fn slugs(topics: &[&Topic]) -> Vec<String> {
    topics.iter().map(|t| t.slug.clone()).collect()
}

/// Keep the topics of `base` that satisfy one facet of `state`
fn facet<'a>(base: Vec<&'a Topic>, state: FilterState) -> Vec<&'a Topic> {
    let owned: Vec<Topic> = base.iter().map(|t| (*t).clone()).collect();
    let kept: Vec<String> = slugs(&apply_filters(&owned, &state));
    base.into_iter().filter(|t| kept.contains(&t.slug)).collect()
}

proptest! {
    #[test]
    fn test_empty_state_is_identity(topics in arb_topics()) {
        let result = apply_filters(&topics, &FilterState::default());
        let expected: Vec<&Topic> = topics.iter().collect();
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn test_facet_order_does_not_matter(topics in arb_topics(), state in arb_state()) {
        let all = slugs(&apply_filters(&topics, &state));

        let domains = FilterState { selected_domains: state.selected_domains.clone(), ..Default::default() };
        let levels = FilterState { selected_levels: state.selected_levels.clone(), ..Default::default() };
        let buckets = FilterState { selected_time_buckets: state.selected_time_buckets.clone(), ..Default::default() };
        let query = FilterState::new().with_query(state.search_query.clone());

        let start: Vec<&Topic> = topics.iter().collect();
        let forward = facet(facet(facet(facet(start.clone(), query.clone()), domains.clone()), levels.clone()), buckets.clone());
        let backward = facet(facet(facet(facet(start, buckets), levels), domains), query);

        prop_assert_eq!(&slugs(&forward), &all);
        prop_assert_eq!(&slugs(&backward), &all);
    }

    #[test]
    fn test_shortest_is_non_decreasing_and_stable(topics in arb_topics()) {
        let state = FilterState::new().with_sort(SortMode::Shortest);
        let result = apply_filters(&topics, &state);

        for pair in result.windows(2) {
            let (a, b) = (pair[0].minutes().unwrap_or(0), pair[1].minutes().unwrap_or(0));
            prop_assert!(a <= b);
            if a == b {
                prop_assert!(position(&topics, pair[0]) < position(&topics, pair[1]));
            }
        }
    }

    #[test]
    fn test_newest_is_non_increasing_and_stable(topics in arb_topics()) {
        let state = FilterState::new().with_sort(SortMode::Newest);
        let result = apply_filters(&topics, &state);

        for pair in result.windows(2) {
            let (a, b) = (pair[0].updated_at(), pair[1].updated_at());
            prop_assert!(a >= b);
            if a == b {
                prop_assert!(position(&topics, pair[0]) < position(&topics, pair[1]));
            }
        }
    }

    #[test]
    fn test_idempotent_and_input_untouched(topics in arb_topics(), state in arb_state()) {
        let before = topics.clone();
        let first = slugs(&apply_filters(&topics, &state));
        let second = slugs(&apply_filters(&topics, &state));

        prop_assert_eq!(first, second);
        prop_assert_eq!(topics, before);
    }
}

fn position(topics: &[Topic], topic: &Topic) -> usize {
    topics.iter().position(|t| t.slug == topic.slug).unwrap()
}
