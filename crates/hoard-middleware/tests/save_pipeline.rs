//! End-to-end tests of the storage middleware inside a store.
//!
//! Each test builds its own store and engine. Timing tests run on a paused
//! tokio clock so debounce windows are exact.

use std::sync::Arc;
use std::time::Duration;

use hoard_core::{Action, MiddlewareOptions, SaveEvent, LOAD, SAVE};
use hoard_middleware::reducer::{merge_shallow, persisted};
use hoard_middleware::store::reducer;
use hoard_middleware::{load, ActionFilter, Middleware, Store, StorageMiddleware, Whitelist};
use hoard_storage::{FilterEngine, JsonFileEngine, MemoryEngine};
use serde_json::{json, Value};

// =============================================================================
// Helpers
// =============================================================================

/// Counts dispatched record actions per type.
fn counting_reducer() -> hoard_middleware::Reducer {
    reducer(|state, action| {
        let mut next = state.clone();
        if let Some(t) = action.get("type").and_then(Value::as_str) {
            let seen = next["counts"][t].as_i64().unwrap_or(0);
            next["counts"][t] = json!(seen + 1);
        }
        next
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn build(
    engine: Arc<MemoryEngine>,
    filter: ActionFilter,
    options: MiddlewareOptions,
) -> (Store, Arc<StorageMiddleware>) {
    let middleware = Arc::new(StorageMiddleware::new(engine, filter, options));
    let store = Store::with_middleware(
        counting_reducer(),
        json!({"counts": {}}),
        vec![middleware.clone() as Arc<dyn Middleware>],
    )
    .unwrap();
    (store, middleware)
}

fn debounced(ms: u64) -> MiddlewareOptions {
    MiddlewareOptions::default().with_debounce(Duration::from_millis(ms))
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// =============================================================================
// Classification
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_malformed_actions_never_schedule_a_save() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(
        engine.clone(),
        ActionFilter::new(vec![], Whitelist::predicate(|_| true)),
        MiddlewareOptions::default(),
    );

    store.dispatch(Action::thunk(|_| json!("deferred")));
    store.dispatch(Action::from(json!("A")));
    store.dispatch(Action::from(json!(42)));
    store.dispatch(Action::from(json!({"payload": {"no": "type"}})));

    sleep_ms(100).await;
    middleware.settled().await;
    assert_eq!(engine.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_whitelist_restricts_triggers() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(
        engine.clone(),
        ActionFilter::new(vec![], Whitelist::types(["B"])),
        MiddlewareOptions::default(),
    );

    store.dispatch(Action::new("A"));
    sleep_ms(10).await;
    middleware.settled().await;
    assert_eq!(engine.save_count(), 0);

    store.dispatch(Action::new("B"));
    sleep_ms(10).await;
    middleware.settled().await;
    assert_eq!(engine.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sentinels_never_schedule_even_when_whitelisted() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(
        engine.clone(),
        ActionFilter::new(vec![], Whitelist::types([LOAD, SAVE])),
        MiddlewareOptions::default(),
    );

    store.dispatch(Action::new(LOAD).with("payload", json!({})));
    store.dispatch(Action::new(SAVE).with("payload", json!({})));
    sleep_ms(10).await;
    middleware.settled().await;
    assert_eq!(engine.save_count(), 0);
}

// =============================================================================
// Transparency
// =============================================================================

#[tokio::test]
async fn test_dispatch_results_match_unwrapped_store() {
    let engine = Arc::new(MemoryEngine::new());
    let (wrapped, middleware) = build(engine, ActionFilter::default(), MiddlewareOptions::default());
    let plain = Store::new(counting_reducer(), json!({"counts": {}}));

    let actions = vec![
        Action::new("A").with("payload", json!({"n": 1})),
        Action::from(json!({"type": 5})),
        Action::from(json!("scalar")),
        Action::from(json!({"no_type": true})),
        Action::thunk(|_| json!(1)),
    ];
    for action in actions {
        assert_eq!(wrapped.dispatch(action.clone()), plain.dispatch(action));
    }

    middleware.settled().await;
    // SAVE actions dispatched after saves are the only extra traffic.
    let mut wrapped_counts = wrapped.state()["counts"].clone();
    if let Some(counts) = wrapped_counts.as_object_mut() {
        counts.remove(SAVE);
    }
    assert_eq!(wrapped_counts, plain.state()["counts"]);
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_of_five_saves_once() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(engine.clone(), ActionFilter::default(), debounced(50));

    for _ in 0..5 {
        store.dispatch(Action::new("TICK"));
        sleep_ms(10).await;
    }
    sleep_ms(100).await;
    middleware.settled().await;

    assert_eq!(engine.save_count(), 1);
    assert_eq!(engine.saves()[0]["counts"]["TICK"], json!(5));
}

#[tokio::test(start_paused = true)]
async fn test_save_reads_state_at_fire_time() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(
        engine.clone(),
        ActionFilter::new(strings(&["A"]), Whitelist::default()),
        debounced(50),
    );

    for _ in 0..3 {
        store.dispatch(Action::new("A"));
        sleep_ms(10).await;
    }
    assert_eq!(engine.save_count(), 0);

    store.dispatch(Action::new("B"));
    sleep_ms(20).await;
    // Blacklisted, so it does not re-arm the window, but it does change state
    // before the window closes.
    store.dispatch(Action::new("A"));

    sleep_ms(100).await;
    middleware.settled().await;

    let saves = engine.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0]["counts"]["A"], json!(4));
    assert_eq!(saves[0]["counts"]["B"], json!(1));
}

#[tokio::test(start_paused = true)]
async fn test_no_save_before_window_closes() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(engine.clone(), ActionFilter::default(), debounced(50));

    store.dispatch(Action::new("A"));
    sleep_ms(49).await;
    assert_eq!(engine.save_count(), 0);

    sleep_ms(2).await;
    middleware.settled().await;
    assert_eq!(engine.save_count(), 1);
}

#[tokio::test]
async fn test_zero_debounce_saves_outside_dispatch_call() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(engine.clone(), ActionFilter::default(), MiddlewareOptions::default());

    store.dispatch(Action::new("A"));
    store.dispatch(Action::new("B"));
    assert_eq!(engine.save_count(), 0);

    middleware.settled().await;
    assert_eq!(engine.save_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_saves_are_not_serialized() {
    let engine = Arc::new(MemoryEngine::new());
    engine.set_latency(Duration::from_millis(200));
    let (store, middleware) = build(engine.clone(), ActionFilter::default(), debounced(10));

    store.dispatch(Action::new("A"));
    sleep_ms(50).await;
    store.dispatch(Action::new("B"));
    sleep_ms(50).await;
    middleware.settled().await;

    assert_eq!(engine.save_count(), 2);
    assert_eq!(engine.peak_in_flight(), 2);
}

// =============================================================================
// SAVE notification and failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_save_action_dispatched_once_and_does_not_loop() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(engine.clone(), ActionFilter::default(), debounced(20));

    store.dispatch(Action::new("A"));
    sleep_ms(100).await;
    middleware.settled().await;
    sleep_ms(100).await;
    middleware.settled().await;

    assert_eq!(store.state()["counts"][SAVE], json!(1));
    assert_eq!(engine.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_save_action_dispatches_nothing() {
    let engine = Arc::new(MemoryEngine::new());
    let (store, middleware) = build(
        engine.clone(),
        ActionFilter::default(),
        debounced(20).without_save_action(),
    );

    store.dispatch(Action::new("A"));
    sleep_ms(100).await;
    middleware.settled().await;

    assert_eq!(engine.save_count(), 1);
    assert!(store.state()["counts"].get(SAVE).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_engine_failure_is_silent() {
    let engine = Arc::new(MemoryEngine::new());
    engine.set_failing(true);
    let (store, middleware) = build(engine.clone(), ActionFilter::default(), debounced(20));
    let mut events = middleware.subscribe();

    let result = store.dispatch(Action::new("A"));
    assert_eq!(result, json!({"type": "A"}));
    sleep_ms(100).await;
    middleware.settled().await;

    assert_eq!(engine.save_count(), 1);
    assert!(store.state()["counts"].get(SAVE).is_none());
    match events.recv().await.unwrap() {
        SaveEvent::Failed { reason, .. } => assert!(reason.contains("failing")),
        other => panic!("expected failure event, got {:?}", other),
    }

    // The pipeline keeps working after a failure.
    engine.set_failing(false);
    store.dispatch(Action::new("B"));
    sleep_ms(100).await;
    middleware.settled().await;
    assert!(!events.recv().await.unwrap().is_failure());
    assert_eq!(store.state()["counts"][SAVE], json!(1));
}

// =============================================================================
// Load path with a file engine
// =============================================================================

#[tokio::test]
async fn test_state_survives_store_rebuild_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let todos_reducer = || {
        persisted(
            reducer(|state, action| {
                let mut next = state.clone();
                if action.get("type").and_then(Value::as_str) == Some("ADD") {
                    if let (Some(list), Some(item)) =
                        (next["todos"].as_array_mut(), action.get("payload"))
                    {
                        list.push(item.clone());
                    }
                    next["draft"] = json!("");
                }
                next
            }),
            merge_shallow,
        )
    };

    {
        let engine = FilterEngine::new(
            JsonFileEngine::new(&path),
            vec![],
            strings(&["draft"]),
        );
        let middleware = Arc::new(StorageMiddleware::with_defaults(engine));
        let store = Store::with_middleware(
            todos_reducer(),
            json!({"todos": [], "draft": "typing"}),
            vec![middleware.clone() as Arc<dyn Middleware>],
        )
        .unwrap();

        store.dispatch(Action::new("ADD").with("payload", json!("milk")));
        store.dispatch(Action::new("ADD").with("payload", json!("eggs")));
        middleware.settled().await;
    }

    let store = Store::new(todos_reducer(), json!({"todos": [], "draft": "fresh"}));
    let loaded = load(&JsonFileEngine::new(&path), store.api().as_ref())
        .await
        .unwrap();

    assert_eq!(loaded, json!({"todos": ["milk", "eggs"]}));
    assert_eq!(
        store.state(),
        json!({"todos": ["milk", "eggs"], "draft": "fresh"})
    );
}
