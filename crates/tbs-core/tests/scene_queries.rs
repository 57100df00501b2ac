//! Integration tests: JSON scene → workspace queries → hierarchy resolution.

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use tbs_core::hierarchy::{
    ancestors, containing_frame, descendant_ids, is_descendant_of_selected, is_trailing,
    members_of, top_level_of,
};
use tbs_core::{BlockScene, Category, ElementId, Link, Point, Rect, Workspace};

fn scene() -> BlockScene {
    BlockScene::from_json(include_str!("fixtures/stacks.json")).unwrap()
}

fn id(s: &str) -> ElementId {
    ElementId::intern(s)
}

fn names(ids: &[ElementId]) -> Vec<&str> {
    ids.iter().map(|id| id.as_str()).collect()
}

// ─── Loading ─────────────────────────────────────────────────────────────

#[test]
fn fixture_loads_blocks_and_frames() {
    let ws = scene();
    assert_eq!(ws.block_ids().len(), 8);
    assert_eq!(names(&ws.frame_ids()), vec!["q_frame", "q_vault"]);
    assert!(ws.frame(id("q_vault")).unwrap().locked);
    assert!(!ws.block(id("q_note")).unwrap().selectable);
    assert_eq!(ws.block(id("q_forever")).unwrap().category, Category::Control);
    assert!(!ws.is_locked());
}

#[test]
fn viewport_maps_surface_to_canvas() {
    let ws = scene();
    let vp = ws.viewport();
    assert_eq!(vp.to_canvas(Point::new(20.0, 10.0)), Point::ZERO);
    assert_eq!(
        vp.to_canvas_rect(Rect::new(70.0, 60.0, 120.0, 110.0)),
        Rect::new(100.0, 100.0, 200.0, 200.0)
    );
}

#[test]
fn unknown_frame_reference_is_an_error() {
    let json = r#"{ "blocks": [ { "id": "q_orphan", "category": "looks", "frame": "q_nowhere" } ] }"#;
    let err = BlockScene::from_json(json).unwrap_err();
    assert!(err.contains("q_nowhere"), "got: {err}");
}

#[test]
fn malformed_json_is_an_error() {
    let err = BlockScene::from_json("{ blocks: ").unwrap_err();
    assert!(err.starts_with("Error parsing scene"), "got: {err}");
}

// ─── Hierarchy ───────────────────────────────────────────────────────────

#[test]
fn descendants_follow_both_link_kinds() {
    let ws = scene();
    assert_eq!(
        names(&descendant_ids(&ws, id("q_forever"))),
        vec!["q_move", "q_steps", "q_turn", "q_say"]
    );
    assert!(descendant_ids(&ws, id("q_say")).is_empty());
}

#[test]
fn ancestor_chain_is_nearest_first() {
    let ws = scene();
    assert_eq!(
        ancestors(&ws, id("q_turn")),
        vec![
            (id("q_move"), Link::Next),
            (id("q_forever"), Link::Input),
            (id("q_start"), Link::Next),
        ]
    );
    assert_eq!(top_level_of(&ws, id("q_turn")), id("q_start"));
    assert_eq!(top_level_of(&ws, id("q_note")), id("q_note"));
}

#[test]
fn selected_ancestor_is_detected() {
    let ws = scene();
    let selected: HashSet<ElementId> = [id("q_forever")].into_iter().collect();
    assert!(is_descendant_of_selected(&ws, id("q_turn"), &selected));
    assert!(!is_descendant_of_selected(&ws, id("q_forever"), &selected));
    assert!(!is_descendant_of_selected(&ws, id("q_note"), &selected));
}

#[test]
fn nested_blocks_reach_frame_through_top_level() {
    let ws = scene();
    assert_eq!(containing_frame(&ws, id("q_turn")), Some(id("q_frame")));
    assert_eq!(containing_frame(&ws, id("q_note")), None);

    let all = ws.block_ids();
    let mut members = members_of(&ws, id("q_frame"), &all);
    members.sort();
    assert_eq!(
        names(&members),
        vec!["q_forever", "q_move", "q_say", "q_start", "q_steps", "q_turn"]
    );
    assert_eq!(names(&members_of(&ws, id("q_vault"), &all)), vec!["q_safe"]);
}

#[test]
fn trailing_versus_nested_links() {
    let ws = scene();
    assert!(is_trailing(&ws, id("q_say")));
    assert!(is_trailing(&ws, id("q_turn")));
    assert!(!is_trailing(&ws, id("q_move")));
    assert!(!is_trailing(&ws, id("q_start")));
}
