use std::collections::HashSet;

use planboard::model::{ContainerMap, PlacedItem, Template};
use planboard::ops::move_ops::{DragSource, MoveOutcome, NoopReason, apply_move, apply_move_detailed};
use planboard::ops::resolve::Sentinels;
use pretty_assertions::assert_eq;

fn item(template_id: &str, placement_id: &str) -> PlacedItem {
    PlacedItem {
        template_id: template_id.into(),
        name: template_id.to_uppercase(),
        color: "#3b82f6".into(),
        placement_id: placement_id.into(),
        notes: None,
    }
}

/// Board from (key, placement ids) pairs
fn board(layout: &[(&str, &[&str])]) -> ContainerMap {
    let keys: Vec<String> = layout.iter().map(|(k, _)| k.to_string()).collect();
    let persisted = layout
        .iter()
        .map(|(k, ids)| (k.to_string(), ids.iter().map(|id| item("t", id)).collect()))
        .collect();
    ContainerMap::from_persisted(&keys, persisted).0
}

fn ids(map: &ContainerMap, key: &str) -> Vec<String> {
    map.items(key).iter().map(|i| i.placement_id.clone()).collect()
}

fn all_ids(map: &ContainerMap) -> Vec<String> {
    map.iter()
        .flat_map(|(_, items)| items.iter().map(|i| i.placement_id.clone()))
        .collect()
}

fn math() -> Template {
    Template::new("math", "Matemática", "#3b82f6")
}

/// Deterministic pseudo-random stream for move sequences
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_library_drop_materializes() {
    let s = Sentinels::default();
    let map = ContainerMap::new(["Monday"]);
    let template = math();
    let library = vec![template.clone()];

    let next = apply_move(&map, &DragSource::Library(template.clone()), Some("Monday"), &s);

    let placed = &next.items("Monday")[0];
    assert_eq!(next.items("Monday").len(), 1);
    assert_eq!(placed.name, "Matemática");
    assert_eq!(placed.color, "#3b82f6");
    assert_eq!(placed.template_id, "math");
    assert_ne!(placed.placement_id, "math");
    assert_eq!(library, vec![math()]);
    assert!(map.is_empty());
}

#[test]
fn scenario_b_reorder_onto_first() {
    let s = Sentinels::default();
    let map = board(&[("Monday", &["A", "B", "C"])]);
    let next = apply_move(&map, &DragSource::placed("B"), Some("A"), &s);
    assert_eq!(ids(&next, "Monday"), vec!["B", "A", "C"]);
}

#[test]
fn scenario_c_transfer_onto_empty_container() {
    let s = Sentinels::default();
    let map = board(&[("Monday", &["A"]), ("Tuesday", &[])]);
    let next = apply_move(&map, &DragSource::placed("A"), Some("Tuesday"), &s);
    assert!(next.items("Monday").is_empty());
    assert_eq!(next.items("Tuesday"), map.items("Monday"));
}

#[test]
fn scenario_d_delete() {
    let s = Sentinels::default();
    let map = board(&[("todo", &["T1", "T2"]), ("done", &["D1"])]);
    let next = apply_move(&map, &DragSource::placed("T1"), Some("delete-zone"), &s);
    assert_eq!(ids(&next, "todo"), vec!["T2"]);
    assert_eq!(next.items("done"), map.items("done"));
}

#[test]
fn scenario_e_unknown_source() {
    let s = Sentinels::default();
    let map = board(&[("Monday", &["A"]), ("Tuesday", &[])]);
    let (next, outcome) = apply_move_detailed(&map, &DragSource::placed("ghost"), Some("Monday"), &s);
    assert_eq!(next, map);
    assert_eq!(outcome, MoveOutcome::Unchanged(NoopReason::UnresolvedSource));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn p1_rapid_library_drags_get_distinct_ids() {
    let s = Sentinels::default();
    let mut map = ContainerMap::new(["Monday", "Tuesday"]);
    for i in 0..300 {
        let key = if i % 2 == 0 { "Monday" } else { "Tuesday" };
        map = apply_move(&map, &DragSource::Library(math()), Some(key), &s);
    }
    let all = all_ids(&map);
    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(all.len(), 300);
    assert_eq!(unique.len(), 300);
    assert!(all.iter().all(|id| id != "math"));
}

#[test]
fn p2_p4_random_sequences_keep_ids_in_one_container() {
    let s = Sentinels::default();
    let keys = ["Monday", "Tuesday", "Wednesday"];
    let mut map = ContainerMap::new(keys);
    let mut rng = Lcg(7);

    for _ in 0..400 {
        let existing = all_ids(&map);
        let source = if existing.is_empty() || rng.next(4) == 0 {
            DragSource::Library(math())
        } else {
            DragSource::placed(existing[rng.next(existing.len())].clone())
        };
        let mut targets: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        targets.extend(existing.iter().cloned());
        targets.push("delete-zone".into());
        targets.push("lib-math".into());
        let target = targets[rng.next(targets.len())].clone();

        let before_len = map.len();
        let (next, outcome) = apply_move_detailed(&map, &source, Some(target.as_str()), &s);

        // P2: every placement id sits in exactly one container
        let all = all_ids(&next);
        let unique: HashSet<&String> = all.iter().collect();
        assert_eq!(all.len(), unique.len(), "duplicate after {:?} -> {}", source, target);
        assert_eq!(next.keys().collect::<Vec<_>>(), keys.to_vec());

        match &outcome {
            MoveOutcome::Transferred { from, to, .. } => {
                // P4: destination grows by one, source shrinks by one
                assert_eq!(next.items(to).len(), map.items(to).len() + 1);
                match from {
                    Some(from) => {
                        assert_eq!(next.items(from).len() + 1, map.items(from).len());
                        assert_eq!(next.len(), before_len);
                    }
                    None => assert_eq!(next.len(), before_len + 1),
                }
            }
            MoveOutcome::Deleted { .. } => assert_eq!(next.len() + 1, before_len),
            MoveOutcome::Reordered { .. } => assert_eq!(next.len(), before_len),
            MoveOutcome::Unchanged(_) => assert_eq!(next, map),
        }
        map = next;
    }
}

#[test]
fn p3_reorder_is_a_shift() {
    let s = Sentinels::default();
    let original = ["A", "B", "C", "D", "E"];
    let map = board(&[("Monday", &original)]);

    for from in 0..original.len() {
        for to in 0..original.len() {
            if from == to {
                continue;
            }
            let next = apply_move(&map, &DragSource::placed(original[from]), Some(original[to]), &s);
            let mut expected: Vec<&str> = original.to_vec();
            let moved = expected.remove(from);
            expected.insert(to, moved);
            assert_eq!(ids(&next, "Monday"), expected, "from {} to {}", from, to);
        }
    }
}

#[test]
fn p5_delete_touches_one_container() {
    let s = Sentinels::default();
    let map = board(&[("a", &["x1", "x2"]), ("b", &["y1", "y2", "y3"]), ("c", &[])]);
    let next = apply_move(&map, &DragSource::placed("y2"), Some("delete-zone"), &s);
    assert_eq!(ids(&next, "b"), vec!["y1", "y3"]);
    assert_eq!(next.items("a"), map.items("a"));
    assert_eq!(next.items("c"), map.items("c"));
    assert_eq!(next.len(), map.len() - 1);
}

#[test]
fn p6_noops_are_value_identical() {
    let s = Sentinels::default();
    let map = board(&[("Monday", &["A", "B"]), ("Tuesday", &["C"])]);
    let cases: Vec<(DragSource, Option<&str>)> = vec![
        (DragSource::placed("A"), Some("A")),
        (DragSource::placed("A"), None),
        (DragSource::placed("A"), Some("Sunday")),
        (DragSource::placed("A"), Some("lib-math")),
        (DragSource::Library(math()), Some("delete-zone")),
        (DragSource::Library(math()), None),
    ];
    for (source, target) in cases {
        let (next, outcome) = apply_move_detailed(&map, &source, target, &s);
        assert!(!outcome.is_change(), "{:?} -> {:?}", source, target);
        assert_eq!(next, map);
    }
}

#[test]
fn p7_json_round_trip_of_reachable_board() {
    let s = Sentinels::default();
    let mut map = ContainerMap::new(["todo", "in-progress", "done"]);
    map = apply_move(&map, &DragSource::Library(math()), Some("todo"), &s);
    map = apply_move(&map, &DragSource::Library(math()), Some("todo"), &s);
    let first = ids(&map, "todo")[0].clone();
    map = apply_move(&map, &DragSource::placed(first), Some("done"), &s);

    let text = serde_json::to_string(&map).unwrap();
    let back: ContainerMap = serde_json::from_str(&text).unwrap();
    assert_eq!(back, map);
}

#[test]
fn custom_sentinels_are_honored() {
    let s = Sentinels {
        library_prefix: "tpl:".into(),
        deletion_key: "trash".into(),
    };
    let map = board(&[("am", &["A"]), ("pm", &[])]);
    let next = apply_move(&map, &DragSource::placed("A"), Some("trash"), &s);
    assert!(next.is_empty());
    let next = apply_move(&map, &DragSource::placed("A"), Some("tpl:math"), &s);
    assert_eq!(next, map);
    // the default deletion key is an ordinary unknown target here
    let next = apply_move(&map, &DragSource::placed("A"), Some("delete-zone"), &s);
    assert_eq!(next, map);
}
