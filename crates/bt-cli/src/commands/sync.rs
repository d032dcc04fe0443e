//! Pushing finalized events to and pulling events from the sync endpoint.

use std::io::Write;

use anyhow::{Context, Result, bail};
use bt_core::Event;
use bt_db::Database;
use bt_sync::{SyncClient, SyncError};

use crate::config::Config;

/// Pushes a newly finalized event when a sync endpoint is configured.
///
/// The push runs on a spawned task that is joined before returning; failures
/// are routed through the configured sync policy.
pub fn push_finalized(config: &Config, event: Event) -> Result<()> {
    let Some(url) = config.sync_url.as_deref() else {
        return Ok(());
    };

    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    let outcome: Result<(), SyncError> = rt.block_on(async {
        let client = SyncClient::new(url)?;
        client.spawn_push(event).await?
    });
    config
        .sync_policy
        .handle(outcome)
        .context("failed to sync event")
}

/// Fetches remote events and merges them with the local store.
///
/// Remote events come first in remote order; local events the remote does
/// not have are kept after them.
pub fn pull<W: Write>(writer: &mut W, db: &mut Database, config: &Config) -> Result<()> {
    let Some(url) = config.sync_url.as_deref() else {
        bail!("no sync_url configured; set it in config.toml or BT_SYNC_URL");
    };
    let client = SyncClient::new(url)?;

    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    let remote = rt
        .block_on(client.load_all())
        .context("failed to load remote events")?;
    let remote_count = remote.len();

    let mut store = db.load_events().context("failed to load events")?;
    let kept = store.merge_loaded(remote);
    db.save_events(&store).context("failed to save events")?;

    tracing::info!(remote = remote_count, local_only = kept, "merged remote events");
    writeln!(
        writer,
        "Pulled {remote_count} events ({kept} local-only kept, {} total)",
        store.len()
    )?;
    Ok(())
}
