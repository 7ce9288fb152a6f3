//! Session behavior through the executor

use crate::common::*;
use proptest::prelude::*;
use quarry::{SessionState, ViewStatePatch};
use serde_json::json;
use std::collections::HashSet;

#[test]
fn selection_round_trip_restores_prior_set() {
    let (_dir, executor) = create_executor(reference_items());
    executor.select("s", &json!([5, 2]), true).unwrap();
    let before: HashSet<u32> = executor.state("s").selected.into_iter().collect();

    executor.select("s", &json!([1, "3"]), true).unwrap();
    executor.select("s", &json!([1, "3"]), false).unwrap();

    let after: HashSet<u32> = executor.state("s").selected.into_iter().collect();
    assert_eq!(before, after);
}

#[test]
fn selection_rejects_non_array_payload() {
    let (_dir, executor) = create_executor(reference_items());
    let err = executor.select("s", &json!({"ids": [1]}), true).unwrap_err();
    assert!(err.is_input());
    let err = executor.select("s", &json!(["one"]), true).unwrap_err();
    assert!(err.is_input());
}

#[test]
fn reorder_unknown_id_is_not_found() {
    let (_dir, executor) = create_executor(reference_items());
    assert!(executor.reorder("s", 6, 1).unwrap_err().is_not_found());
    assert!(executor.reorder("s", 1, 6).unwrap_err().is_not_found());
    assert_eq!(executor.search("s", "").ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn update_order_rejects_non_permutation() {
    let (_dir, executor) = create_executor(reference_items());
    assert!(executor
        .update_order("s", vec![1, 2, 3, 4, 4])
        .unwrap_err()
        .is_input());
}

#[test]
fn matching_follows_order_then_pin() {
    let (_dir, executor) = create_executor(reference_items());
    executor.update_order("s", vec![5, 4, 3, 2, 1]).unwrap();
    assert_eq!(executor.matching("s", "gamma"), vec![5, 3, 2]);

    executor.pin_search_order("s", "gamma", vec![2, 5]);
    assert_eq!(executor.matching("s", " gamma "), vec![2, 5]);

    // A global reorder clears the cache; the pin is recombined with the
    // new order and unpinned matches are appended
    executor.reorder("s", 3, 5).unwrap();
    assert_eq!(executor.matching("s", "gamma"), vec![2, 5, 3]);
}

#[test]
fn sessions_do_not_share_state() {
    let (_dir, executor) = create_executor(reference_items());
    executor.update_order("a", vec![5, 4, 3, 2, 1]).unwrap();
    executor.select("a", &json!([1]), true).unwrap();

    assert_eq!(executor.search("b", "").ids, vec![1, 2, 3, 4, 5]);
    assert!(executor.state("b").selected.is_empty());
}

#[test]
fn view_state_patch_merges() {
    let (_dir, executor) = create_executor(reference_items());
    executor.update_view_state(
        "s",
        serde_json::from_value::<ViewStatePatch>(json!({"search": "beta", "sortBy": "name"}))
            .unwrap(),
    );
    let state = executor.update_view_state(
        "s",
        serde_json::from_value::<ViewStatePatch>(json!({"sortDir": "desc"})).unwrap(),
    );
    assert_eq!(state.search, "beta");
    assert_eq!(state.sort_by.as_deref(), Some("name"));
    assert_eq!(
        serde_json::to_value(&state).unwrap(),
        json!({"search": "beta", "sortBy": "name", "sortDir": "desc"})
    );
}

#[test]
fn rebuild_with_new_size_resets_sessions() {
    let (_dir, executor) = create_executor(reference_items());
    executor.update_order("s", vec![5, 4, 3, 2, 1]).unwrap();
    executor.select("s", &json!([1, 5]), true).unwrap();

    executor.rebuild(reference_items()[..3].to_vec()).unwrap();

    assert_eq!(executor.search("s", "").ids, vec![1, 2, 3]);
    assert_eq!(executor.state("s").selected, vec![1]);
}

#[test]
fn failed_rebuild_keeps_active_dataset() {
    let (_dir, executor) = create_executor(reference_items());
    let sparse = vec![quarry::Item::new(1, "only"), quarry::Item::new(3, "gap")];
    assert!(executor.rebuild(sparse).unwrap_err().is_input());
    assert_eq!(executor.item_count(), 5);
    assert_eq!(executor.search("s", "zeta").ids, vec![4]);
}

fn moves() -> impl Strategy<Value = (usize, Vec<(u32, u32)>)> {
    (1usize..30).prop_flat_map(|n| {
        let id = 1..=n as u32;
        (Just(n), prop::collection::vec((id.clone(), id), 0..40))
    })
}

proptest! {
    #[test]
    fn reorder_keeps_permutation_and_inverse((n, steps) in moves()) {
        let mut session = SessionState::new();
        session.initialize(n);
        for (source, destination) in steps {
            session.reorder(source, destination).unwrap();
        }

        let mut sorted = session.order().to_vec();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (1..=n as u32).collect::<Vec<_>>());
        for (pos, &id) in session.order().iter().enumerate() {
            prop_assert_eq!(session.position(id), Some(pos));
        }
    }

    #[test]
    fn update_order_accepts_any_permutation(order in Just((1..=20u32).collect::<Vec<_>>()).prop_shuffle()) {
        let mut session = SessionState::new();
        session.initialize(20);
        session.update_order(order.clone()).unwrap();
        prop_assert_eq!(session.order(), order.as_slice());
        for (pos, &id) in order.iter().enumerate() {
            prop_assert_eq!(session.position(id), Some(pos));
        }
    }
}
