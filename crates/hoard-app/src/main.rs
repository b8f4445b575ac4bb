//! Hoard binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build the JSON file engine (optionally key-filtered)
//! 3. Build a store with the storage middleware and hydrate it
//! 4. Replay actions, or print what is persisted

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hoard_core::config::{HoardConfig, StorageConfig};
use hoard_core::{Action, HoardError, SaveEvent, LOAD, SAVE};
use hoard_middleware::reducer::{merge_shallow, merge_tree, persisted};
use hoard_middleware::store::reducer;
use hoard_middleware::{ActionFilter, Middleware, Reducer, Store, StorageMiddleware};
use hoard_storage::{FilterEngine, JsonFileEngine, StorageEngine};
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::TryRecvError;

use cli::{CliArgs, Command};

/// File engine for the configured path, wrapped in a key filter when the
/// config asks for one.
fn build_engine(storage: &StorageConfig, state_file: Option<&Path>) -> Arc<dyn StorageEngine> {
    let path = state_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| storage.resolve_path());
    tracing::info!(path = %path.display(), "Using state file");

    let file = JsonFileEngine::new(path);
    if storage.filters_keys() {
        Arc::new(FilterEngine::new(
            file,
            storage.key_whitelist.clone(),
            storage.key_blacklist.clone(),
        ))
    } else {
        Arc::new(file)
    }
}

/// Shallow-merges each action's object payload into the state. Sentinel
/// actions are left to the LOAD merger.
fn payload_reducer() -> Reducer {
    reducer(|state, action| {
        let action_type = action.get("type").and_then(Value::as_str);
        if matches!(action_type, Some(LOAD) | Some(SAVE)) {
            return state.clone();
        }
        match action.get("payload") {
            Some(payload) if payload.is_object() => merge_shallow(state, payload),
            _ => state.clone(),
        }
    })
}

/// One action per non-blank line.
fn parse_actions(content: &str) -> hoard_core::Result<Vec<Action>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Value>(line)
                .map(Action::from)
                .map_err(|e| HoardError::Serialization(format!("line {}: {}", idx + 1, e)))
        })
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq)]
struct SaveTally {
    saved: usize,
    failed: usize,
}

async fn replay(
    config: &HoardConfig,
    engine: Arc<dyn StorageEngine>,
    actions: Vec<Action>,
    interval: Duration,
) -> hoard_core::Result<(Value, SaveTally)> {
    let middleware = Arc::new(StorageMiddleware::new(
        Arc::clone(&engine),
        ActionFilter::from_config(&config.middleware),
        config.middleware.options(),
    ));
    let mut events = middleware.subscribe();

    let store = Store::with_middleware(
        persisted(payload_reducer(), merge_tree),
        Value::Object(Map::new()),
        vec![middleware.clone() as Arc<dyn Middleware>],
    )?;
    hoard_middleware::load(engine.as_ref(), store.api().as_ref()).await?;

    let total = actions.len();
    for action in actions {
        store.dispatch(action);
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
    middleware.settled().await;

    let mut tally = SaveTally::default();
    loop {
        match events.try_recv() {
            Ok(SaveEvent::Saved { .. }) => tally.saved += 1,
            Ok(SaveEvent::Failed { .. }) => tally.failed += 1,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    tracing::info!(
        actions = total,
        saved = tally.saved,
        failed = tally.failed,
        "Replay finished"
    );
    Ok((store.state(), tally))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config before tracing so the configured level applies.
    let config_path = args.resolve_config_path();
    let loaded = HoardConfig::load(&config_path);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => HoardConfig::default(),
    };

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Hoard v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!("Configuration loaded from {}", config_path.display()),
        Err(e) => tracing::warn!(
            "Failed to load config from {}: {}. Using defaults.",
            config_path.display(),
            e
        ),
    }

    let engine = build_engine(&config.storage, args.state_file.as_deref());

    match args.command {
        Command::Replay {
            actions,
            interval_ms,
            debounce_ms,
        } => {
            if let Some(ms) = debounce_ms {
                config.middleware.debounce_ms = ms;
            }
            let content = tokio::fs::read_to_string(&actions).await?;
            let actions = parse_actions(&content)?;
            let (state, tally) = replay(
                &config,
                engine,
                actions,
                Duration::from_millis(interval_ms),
            )
            .await?;
            if tally.failed > 0 {
                tracing::warn!(failed = tally.failed, "Some saves did not reach the state file");
            }
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Show => {
            let state = engine.load().await.map_err(HoardError::from)?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }

    Ok(())
}
