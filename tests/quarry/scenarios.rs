//! Reference scenarios

use crate::common::*;
use quarry::{search, SessionState};

#[test]
fn two_token_query_ranks_positional_match_first() {
    let (_dir, executor) = create_executor(reference_items());
    let result = executor.search("s", "alpha beta");
    assert_eq!(result.ids, vec![1, 5]);
    assert_eq!(result.total_found, 2);
}

#[test]
fn empty_query_returns_session_order_unchanged() {
    let (_dir, executor) = create_executor(reference_items());
    executor.update_order("s", vec![3, 1, 4, 2, 5]).unwrap();

    let result = executor.search("s", "");
    assert_eq!(result.ids, vec![3, 1, 4, 2, 5]);
    assert_eq!(result.total_found, 5);
}

#[test]
fn reorder_moves_before_destination() {
    let (_dir, executor) = create_executor(reference_items());
    executor.update_order("s", vec![3, 1, 4, 2, 5]).unwrap();
    executor.reorder("s", 4, 1).unwrap();

    let order = executor.search("s", "  ").ids;
    assert_eq!(order, vec![3, 4, 1, 2, 5]);
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
}

#[test]
fn trailing_token_matches_by_prefix() {
    let (_dir, executor) = create_executor(reference_items());
    assert_eq!(executor.search("s", "alpha gam").ids.len(), 2);
    // Non-trailing tokens need an exact (or short n-gram) hit
    assert!(executor.search("s", "gam alpha").ids.is_empty());
}

#[test]
fn unmatched_token_voids_query() {
    let (_dir, executor) = create_executor(reference_items());
    let result = executor.search("s", "alpha omega");
    assert!(result.ids.is_empty());
    assert_eq!(result.total_found, 0);
}

#[test]
fn entry_point_without_session_or_index() {
    let items = reference_items();
    let result = search("", None, &items, None);
    assert_eq!(result.ids, vec![1, 2, 3, 4, 5]);

    let mut session = SessionState::new();
    session.initialize(items.len());
    let result = search("alpha", Some(&session), &items, None);
    assert!(result.ids.is_empty());
}

#[test]
fn total_found_counts_past_ranking_cap() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.search.ranking_cap = 10;
    let items = generated_items(200);
    let executor = quarry::Executor::open(items, config).unwrap();

    let result = executor.search("s", "street");
    assert_eq!(result.ids.len(), 10);
    assert_eq!(result.total_found, 200);
}

#[test]
fn paging_walks_all_results() {
    let (_dir, executor) = create_executor(generated_items(45));
    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let page = executor.page("s", "", offset, 20);
        seen.extend(page.items.iter().map(|item| item.id));
        offset += page.items.len();
        if !page.has_more {
            break;
        }
    }
    assert_eq!(seen, (1..=45).collect::<Vec<_>>());
}
