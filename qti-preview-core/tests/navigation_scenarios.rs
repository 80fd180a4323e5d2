//! End-to-end preview scenarios: build a map, navigate it, serve items.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Map};
use std::sync::Arc;

use qti_preview_core::{
    CategoryOptionsResolver, CategoryPreset, InMemoryItemResolver, ItemData, ItemRef,
    NavigationMode, NavigationRequest, PartRef, PreviewProxy, ResolvedItem, RouteEntry,
    SectionRef, SessionState, Stats, StaticLabelResolver, TestDefinition, TestMap,
    TestMapBuilder, TestPreviewNavigator,
};

fn route(layout: &[(&str, &str, &str)]) -> Vec<RouteEntry> {
    layout
        .iter()
        .map(|(item, section, part)| {
            RouteEntry::new(
                ItemRef::new(*item, format!("http://bank/{item}")),
                SectionRef::new(*section, format!("Section {section}")),
                PartRef::new(*part, NavigationMode::Linear),
            )
        })
        .collect()
}

fn build(route: &[RouteEntry]) -> TestMap {
    let labels = StaticLabelResolver::new();
    TestMapBuilder::new(&labels)
        .build(&TestDefinition::new("test-1", "Preview"), route, &[])
        .unwrap()
}

fn navigator(layout: &[(&str, &str, &str)]) -> TestPreviewNavigator {
    TestPreviewNavigator::init(
        Arc::new(build(&route(layout))),
        CategoryOptionsResolver::default(),
    )
}

// =============================================================================
// MAP SHAPE
// =============================================================================

#[test]
fn empty_route_has_no_stats_or_jumps() {
    let map = build(&[]);
    let value = serde_json::to_value(&map).unwrap();

    assert_eq!(
        value,
        json!({
            "scope": "test",
            "parts": {},
            "title": "Preview",
            "identifier": "test-1",
            "className": "AssessmentTest",
            "toolName": "tao",
            "exclusivelyLinear": false,
            "hasTimeLimits": false
        })
    );
}

#[test]
fn single_item_stats_at_every_level() {
    let map = build(&route(&[("i1", "s1", "p1")]));
    let expected = Stats {
        questions: 1,
        answered: 0,
        flagged: 0,
        viewed: 0,
        total: 1,
        questions_viewed: 0,
    };

    assert_eq!(map.stats, Some(expected));
    let part = map.part("p1").unwrap();
    assert_eq!(part.stats, expected);
    assert_eq!(part.sections["s1"].stats, expected);

    let value = serde_json::to_value(&map).unwrap();
    assert_eq!(
        value["stats"],
        json!({
            "questions": 1, "answered": 0, "flagged": 0,
            "viewed": 0, "total": 1, "questionsViewed": 0
        })
    );
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[test]
fn move_next_at_part_end_enters_next_part() {
    let mut nav = navigator(&[("i1", "s1", "p1"), ("i2", "s1", "p1"), ("i3", "s2", "p2")]);

    let response = nav.navigate(&NavigationRequest::next_part()).unwrap();
    let ctx = &response.test_context;
    assert_eq!(ctx.item_identifier.as_deref(), Some("i3"));
    assert_eq!(ctx.item_position, Some(2));
    assert_eq!(ctx.test_part_id.as_deref(), Some("p2"));
    assert_eq!(ctx.state, SessionState::Interacting);

    let response = nav.navigate(&NavigationRequest::next_part()).unwrap();
    assert_eq!(response.test_context.state, SessionState::Closed);
}

const TWO_PARTS: [(&str, &str, &str); 4] = [
    ("i1", "s1", "p1"),
    ("i2", "s1", "p1"),
    ("i3", "s2", "p2"),
    ("i4", "s2", "p2"),
];

#[test]
fn last_item_of_part_moves_into_next_part() {
    for request in [NavigationRequest::next(), NavigationRequest::next_part()] {
        let mut nav = navigator(&TWO_PARTS);
        nav.jump(1).unwrap();

        let response = nav.navigate(&request).unwrap();
        let ctx = &response.test_context;
        assert_eq!(ctx.item_identifier.as_deref(), Some("i3"), "{request:?}");
        assert_eq!(ctx.item_position, Some(2));
        assert_eq!(ctx.test_part_id.as_deref(), Some("p2"));
        assert_eq!(ctx.section_id.as_deref(), Some("s2"));
        assert_eq!(ctx.state, SessionState::Interacting);
    }
}

#[test]
fn last_item_of_test_closes_without_moving() {
    let requests = [
        NavigationRequest::next(),
        NavigationRequest::next_part(),
        NavigationRequest::next_part().skip(),
    ];
    for request in requests {
        let mut nav = navigator(&TWO_PARTS);
        nav.jump(3).unwrap();

        let response = nav.navigate(&request).unwrap();
        let ctx = &response.test_context;
        assert_eq!(ctx.state, SessionState::Closed, "{request:?}");
        assert_eq!(ctx.item_position, Some(3));
        assert_eq!(ctx.item_identifier.as_deref(), Some("i4"));
        assert_eq!(ctx.test_part_id.as_deref(), Some("p2"));
    }
}

#[test]
fn move_next_at_test_end_closes_in_place() {
    let mut nav = navigator(&[("i1", "s1", "p1"), ("i2", "s1", "p1")]);
    nav.move_next().unwrap();

    let response = nav.move_next().unwrap();
    assert_eq!(response.test_context.state, SessionState::Closed);
    assert_eq!(response.test_context.item_position, Some(1));
    assert_eq!(response.test_context.item_identifier.as_deref(), Some("i2"));
}

#[test]
fn backward_is_floored_at_first_item() {
    let mut nav = navigator(&[("i1", "s1", "p1"), ("i2", "s1", "p1")]);

    let response = nav.move_previous().unwrap();
    assert_eq!(response.test_context.item_position, Some(0));
    assert_eq!(response.test_context.item_identifier.as_deref(), Some("i1"));
}

#[test]
fn jump_refreshes_identifiers_from_jump_table() {
    let layout = [("i1", "s1", "p1"), ("i2", "s2", "p1"), ("i3", "s3", "p2")];
    let mut nav = navigator(&layout);
    let map = Arc::clone(nav.map());

    for k in [2usize, 0, 1] {
        let response = nav.jump(k).unwrap();
        let ctx = &response.test_context;
        let jump = &map.jumps[k];
        assert_eq!(ctx.item_position, Some(k));
        assert_eq!(ctx.item_identifier.as_ref(), Some(&jump.identifier));
        assert_eq!(ctx.section_id.as_ref(), Some(&jump.section));
        assert_eq!(ctx.test_part_id.as_ref(), Some(&jump.part));
    }

    assert!(nav.jump(3).is_err());
    assert_eq!(nav.context().item_position, Some(1));
}

#[test]
fn item_categories_drive_context_options() {
    let entries = vec![RouteEntry::new(
        ItemRef::new("i1", "http://bank/i1").with_category("x-tao-scoring-new"),
        SectionRef::new("s1", "S1"),
        PartRef::new("p1", NavigationMode::Nonlinear),
    )];
    let options =
        CategoryOptionsResolver::new(vec![CategoryPreset::new("scoring", "x-tao-scoring-new")]);
    let nav = TestPreviewNavigator::init(Arc::new(build(&entries)), options);

    let expected: qti_preview_core::ItemOptions = [("scoring".to_string(), true)].into();
    assert_eq!(nav.context().options, expected);
}

// =============================================================================
// PROXY
// =============================================================================

#[tokio::test]
async fn second_fetch_reuses_cached_item() {
    let map = build(&route(&[("i1", "s1", "p1")]));
    let resolver = Arc::new(InMemoryItemResolver::new());
    resolver
        .insert(
            "i1",
            ResolvedItem {
                item_data: ItemData {
                    item_type: "qti".into(),
                    data: json!({"body": "<p>Hello</p>"}),
                    assets: json!({}),
                    base_url: "memory://i1/".into(),
                },
                item_state: Map::new(),
            },
        )
        .await;

    let proxy = PreviewProxy::new(
        Arc::new(map),
        CategoryOptionsResolver::default(),
        resolver.clone(),
    );
    proxy.init().await.unwrap();

    let first = proxy.get_item("i1").await.unwrap();
    let second = proxy.get_item("i1").await.unwrap();

    assert!(Arc::ptr_eq(&first.item_data, &second.item_data));
    assert_eq!(first.item_state, second.item_state);
    assert_eq!(resolver.fetch_count(), 1);
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// Small routes with item ids drawn from a pool of six, so repeated
/// references occur.
fn layout_strategy() -> impl Strategy<Value = Vec<(String, String, String)>> {
    prop::collection::vec(
        prop::collection::vec(prop::collection::vec(0u8..6, 1..4), 1..3),
        0..3,
    )
    .prop_map(|parts| {
        let mut layout = Vec::new();
        for (p, sections) in parts.iter().enumerate() {
            for (s, items) in sections.iter().enumerate() {
                for item in items {
                    layout.push((format!("item{item}"), format!("s{p}-{s}"), format!("p{p}")));
                }
            }
        }
        layout
    })
}

fn owned_route(layout: &[(String, String, String)]) -> Vec<RouteEntry> {
    let borrowed: Vec<(&str, &str, &str)> = layout
        .iter()
        .map(|(i, s, p)| (i.as_str(), s.as_str(), p.as_str()))
        .collect();
    route(&borrowed)
}

proptest! {
    #[test]
    fn jumps_agree_with_nested_items(layout in layout_strategy()) {
        let map = build(&owned_route(&layout));

        prop_assert_eq!(map.total(), layout.len());
        prop_assert!(map.check_jumps().is_ok());
        for (k, jump) in map.jumps.iter().enumerate() {
            let item = &map.parts[&jump.part].sections[&jump.section].items[&jump.identifier];
            prop_assert_eq!(item.position, k);
            prop_assert_eq!(jump.position, k);
        }
        match map.stats {
            Some(stats) => prop_assert_eq!(stats.total, layout.len()),
            None => prop_assert!(layout.is_empty()),
        }
    }

    #[test]
    fn build_is_deterministic(layout in layout_strategy()) {
        let entries = owned_route(&layout);
        prop_assert_eq!(build(&entries), build(&entries));
    }

    #[test]
    fn navigation_stays_in_bounds(
        layout in layout_strategy(),
        steps in prop::collection::vec(0u8..3, 0..20)
    ) {
        prop_assume!(!layout.is_empty());
        let map = Arc::new(build(&owned_route(&layout)));
        let total = map.total();
        let mut nav =
            TestPreviewNavigator::init(Arc::clone(&map), CategoryOptionsResolver::default());

        for step in steps {
            if nav.context().is_closed() {
                break;
            }
            let request = match step {
                0 => NavigationRequest::next(),
                1 => NavigationRequest::previous(),
                _ => NavigationRequest::next_part(),
            };
            let ctx = nav.navigate(&request).unwrap().test_context;
            let position = ctx.item_position.unwrap();
            prop_assert!(position < total);
            prop_assert_eq!(ctx.item_identifier.as_ref(), Some(&map.jumps[position].identifier));
        }
    }
}
