//! Walks through local and session storage and prints the change events.
//!
//! Run with `RUST_LOG=debug` to see the storage layer's own logging.

use std::sync::Arc;

use gosub_webstorage::storage::{InMemorySessionStore, SessionId, SqliteLocalStore, StorageService};
use gosub_webstorage::{StorageConfig, StorageError};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Serialize, Deserialize)]
struct Preferences {
    theme: String,
    font_size: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = StorageConfig::default();
    let db_path = std::env::temp_dir().join("gosub-webstorage-demo.db");
    let storage = StorageService::new(
        Arc::new(SqliteLocalStore::with_config(&db_path, &config)?),
        Arc::new(InMemorySessionStore::with_config(&config)),
    );

    let mut events = storage.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            let ev = match events.recv().await {
                Ok(ev) => ev,
                Err(RecvError::Lagged(missed)) => {
                    println!("(listener fell behind, {missed} events skipped)");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            println!(
                "[{:?}] {} {:?}: {:?} -> {:?}",
                ev.scope,
                ev.origin.ascii_serialization(),
                ev.key,
                ev.old_value,
                ev.new_value
            );
        }
    });

    let origin = url::Url::parse("https://example.com/app")?.origin();
    let local = storage.local_for(&origin)?;
    let session_id = SessionId::new();
    let session = storage.session_for(session_id, &origin)?;

    let visits = local.get::<u64>("visits")?.unwrap_or(0) + 1;
    local.set("visits", &visits)?;
    local.set(
        "prefs",
        &Preferences {
            theme: "dark".into(),
            font_size: 14,
        },
    )?;
    println!("visit #{visits}, prefs = {:?}", local.get::<Preferences>("prefs")?);

    session.set("draft", "unsent message")?;
    for index in 0..session.len()? {
        println!("session key {index}: {:?}", session.key_at(index)?);
    }

    // corrupt text written behind the wrapper's back is reported, not hidden
    local.area().set_item("broken", "{oops")?;
    match local.get_value("broken") {
        Err(StorageError::Parse { key, source }) => println!("'{key}' is corrupt: {source}"),
        other => println!("unexpected: {other:?}"),
    }
    local.delete("broken")?;

    storage.drop_session(session_id);
    drop(storage);
    drop(local);
    drop(session);
    listener.await?;

    Ok(())
}
