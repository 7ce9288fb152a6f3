//! JSON command dispatch

use crate::common::*;
use quarry::{Command, Output};
use serde_json::json;

fn run(executor: &quarry::Executor, command: serde_json::Value) -> quarry::Result<Output> {
    let command: Command = serde_json::from_value(command).unwrap();
    executor.execute(command)
}

#[test]
fn search_command_serializes_total_found() {
    let (_dir, executor) = create_executor(reference_items());
    let out = run(&executor, json!({"Search": {"session": "s", "query": "alpha beta"}})).unwrap();
    assert_eq!(
        serde_json::to_value(&out).unwrap(),
        json!({"Search": {"ids": [1, 5], "totalFound": 2}})
    );
}

#[test]
fn session_commands_round_trip() {
    let (_dir, executor) = create_executor(reference_items());

    let out = run(
        &executor,
        json!({"UpdateOrder": {"session": "s", "order": [3, 1, 4, 2, 5]}}),
    )
    .unwrap();
    assert_eq!(out, Output::Unit);

    run(
        &executor,
        json!({"Reorder": {"session": "s", "source": 4, "destination": 1}}),
    )
    .unwrap();

    let out = run(
        &executor,
        json!({"Select": {"session": "s", "ids": ["2", 4], "selected": true}}),
    )
    .unwrap();
    assert_eq!(out, Output::Ids(vec![2, 4]));

    match run(&executor, json!({"State": {"session": "s"}})).unwrap() {
        Output::State(view) => {
            let ids: Vec<u32> = view.first_page.iter().map(|item| item.id).collect();
            assert_eq!(ids, vec![3, 4, 1, 2, 5]);
            assert_eq!(view.selected, vec![2, 4]);
        }
        other => panic!("expected State, got {:?}", other),
    }
}

#[test]
fn invalid_selection_payload_is_input_error() {
    let (_dir, executor) = create_executor(reference_items());
    let err = run(
        &executor,
        json!({"Select": {"session": "s", "ids": "1,2", "selected": true}}),
    )
    .unwrap_err();
    assert!(err.is_input());
}

#[test]
fn rebuild_command_reports_stats() {
    let (_dir, executor) = create_executor(reference_items());
    let items = serde_json::to_value(generated_items(10)).unwrap();
    match run(&executor, json!({"Rebuild": {"items": items}})).unwrap() {
        Output::Stats(stats) => assert_eq!(stats.items, 10),
        other => panic!("expected Stats, got {:?}", other),
    }
    assert_eq!(executor.item_count(), 10);
}

#[test]
fn page_command_defaults_limit() {
    let (_dir, executor) = create_executor(generated_items(30));
    match run(&executor, json!({"Page": {"session": "s", "query": ""}})).unwrap() {
        Output::Page(page) => {
            assert_eq!(page.items.len(), 20);
            assert!(page.has_more);
            assert_eq!(page.total_found, 30);
        }
        other => panic!("expected Page, got {:?}", other),
    }
}
