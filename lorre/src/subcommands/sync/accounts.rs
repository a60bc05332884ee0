use lorre_core::{decode_account, decode_delegate};
use sqlx::SqlitePool;

use crate::{config::Config, db, rpc::NodeClient};

/// Drains the accounts checkpoint: every distinct queued account is re-read
/// against the highest block that touched it, persisted, and its queue rows
/// pruned. A failed or undecodable fetch leaves the entry queued for the
/// next cycle; some ids belong to operations that failed on-chain and never
/// materialized as contracts.
pub(super) async fn drain_accounts(
    config: &Config,
    client: &NodeClient,
    pool: &SqlitePool,
) -> anyhow::Result<usize> {
    let pending = db::checkpoint::pending_accounts(pool).await?;
    if pending.is_empty() {
        return Ok(0);
    }
    tracing::info!("Draining {} checkpointed accounts.", pending.len());

    let results = client
        .batched_try_get(
            pending,
            |entry| format!("blocks/{}/context/contracts/{}", entry.block_id, entry.id),
            config.accounts_fetch_concurrency(),
        )
        .await?;

    let mut drained = 0;
    for (entry, result) in results {
        let body = match result {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("Account fetch failed for {}: {err:#}", entry.id);
                continue;
            }
        };
        let account = match decode_account(&body) {
            Ok(account) => account,
            Err(err) => {
                tracing::warn!("Discarding undecodable account {}: {err}", entry.id);
                continue;
            }
        };

        db::account::upsert(pool, &entry.id, &account, &entry.block_id, entry.block_level).await?;
        db::checkpoint::prune_accounts(pool, &entry.id, entry.block_level).await?;
        drained += 1;
    }

    Ok(drained)
}

/// Same protocol for delegates, keyed by pkh.
pub(super) async fn drain_delegates(
    config: &Config,
    client: &NodeClient,
    pool: &SqlitePool,
) -> anyhow::Result<usize> {
    let pending = db::checkpoint::pending_delegates(pool).await?;
    if pending.is_empty() {
        return Ok(0);
    }
    tracing::info!("Draining {} checkpointed delegates.", pending.len());

    let results = client
        .batched_try_get(
            pending,
            |entry| format!("blocks/{}/context/delegates/{}", entry.block_id, entry.id),
            config.accounts_fetch_concurrency(),
        )
        .await?;

    let mut drained = 0;
    for (entry, result) in results {
        let body = match result {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("Delegate fetch failed for {}: {err:#}", entry.id);
                continue;
            }
        };
        let delegate = match decode_delegate(&body) {
            Ok(delegate) => delegate,
            Err(err) => {
                tracing::warn!("Discarding undecodable delegate {}: {err}", entry.id);
                continue;
            }
        };

        db::delegate::upsert(pool, &entry.id, &delegate, &entry.block_id, entry.block_level)
            .await?;
        db::checkpoint::prune_delegates(pool, &entry.id, entry.block_level).await?;
        drained += 1;
    }

    Ok(drained)
}
