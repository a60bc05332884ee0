use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::bail;
use lorre_core::{
    decode_ballots, decode_baking_rights, decode_block, decode_current_proposal,
    decode_current_quorum, decode_endorsing_rights, decode_listings, decode_operation_groups,
    decode_proposals, extract_account_ids, extract_delegate_keys, Block, BlockData, BlockVotes,
};
use sqlx::SqlitePool;

use super::{accounts, with_retries};
use crate::{config::Config, db, fetch::Fetcher, rpc::NodeClient};

/// Compares the stored chain against the node's view of the head's ancestry.
/// On a mismatch, walks back to the most recent common block and drops
/// everything above it in one transaction.
pub(super) async fn check_reorg(
    config: &Config,
    client: &NodeClient,
    pool: &SqlitePool,
    head: &Block,
) -> anyhow::Result<()> {
    let Some(top) = db::block::max_level(pool).await? else {
        return Ok(());
    };

    let mut level = top.min(head.level);
    while level >= 0 {
        let Some(stored) = db::block::at_level(pool, level).await? else {
            level -= 1;
            continue;
        };
        let offset = head.level - level;
        let path = format!("blocks/{}~{offset}", head.hash);
        let body = with_retries(config.max_attempts(), || client.get(&path)).await?;
        let node_block = decode_block(&body)?;

        if node_block.hash == stored.hash {
            if level < top {
                tracing::info!(
                    "Reorg: discarding stored levels above {level} (old top {top})."
                );
                db::rewind(pool, level).await?;
            }
            return Ok(());
        }

        tracing::info!(
            "Stale block {} at level {level}, node now has {}.",
            stored.hash,
            node_block.hash
        );
        level -= 1;
    }

    // No common ancestor among stored rows: start over.
    tracing::warn!("No common ancestor with the node's chain, clearing the store.");
    db::rewind(pool, -1).await?;
    Ok(())
}

/// Walks offsets `0..(head.level - known_top)` against the head hash, fetching
/// in batches and committing strictly in ascending level order. Account and
/// delegate checkpoints are drained after every batch.
pub(super) async fn walk(
    config: &Config,
    client: &NodeClient,
    pool: &SqlitePool,
    head: &Block,
    known_top: i64,
    stop: &AtomicBool,
) -> anyhow::Result<usize> {
    let total = head.level - known_top;
    if total <= 0 {
        return Ok(0);
    }

    // Offset 0 is the head itself; the highest offset is the oldest missing
    // block. Reversed, batches come out oldest first.
    let mut offsets: Vec<i64> = (0..total).collect();
    offsets.reverse();

    let mut prev_hash = db::block::at_level(pool, known_top).await?.map(|b| b.hash);
    let mut next_level = known_top + 1;
    let mut written = 0usize;

    tracing::info!(
        "Walking {total} blocks from level {next_level} up to head {}.",
        head.level
    );

    let head_hash = head.hash.clone();
    let block_fetcher: Fetcher<i64, Block> = Fetcher::new(
        move |offset| format!("blocks/{head_hash}~{offset}"),
        decode_block,
    );

    for chunk in offsets.chunks(config.batch_size()) {
        if stop.load(Ordering::SeqCst) {
            tracing::info!("Stopping walk after level {}.", next_level - 1);
            break;
        }

        let fetched = with_retries(config.max_attempts(), || {
            block_fetcher.run(client, chunk.to_vec(), config.fetch_concurrency())
        })
        .await?;
        let mut blocks: Vec<Block> = fetched.into_iter().map(|(_, block)| block).collect();
        blocks.sort_by_key(|block| block.level);

        for data in assemble(config, client, blocks).await? {
            if data.block.level != next_level {
                bail!(
                    "level gap while walking: expected {next_level}, got {}",
                    data.block.level
                );
            }
            if let Some(prev) = &prev_hash {
                if data.block.predecessor != *prev {
                    bail!(
                        "predecessor mismatch at level {}: expected {prev}, got {} (chain reorganized mid-walk)",
                        data.block.level,
                        data.block.predecessor
                    );
                }
            }

            db::block::insert_block_data(pool, &data).await?;
            prev_hash = Some(data.block.hash.clone());
            next_level += 1;
            written += 1;
        }

        accounts::drain_accounts(config, client, pool).await?;
        accounts::drain_delegates(config, client, pool).await?;
    }

    Ok(written)
}

/// Fans out over one batch of blocks: operations (with touched account ids
/// decoded from the same body), rights, and votes.
async fn assemble(
    config: &Config,
    client: &NodeClient,
    blocks: Vec<Block>,
) -> anyhow::Result<Vec<BlockData>> {
    let hashes: Vec<String> = blocks.iter().map(|block| block.hash.clone()).collect();
    let concurrency = config.fetch_concurrency();

    let ops_fetcher = Fetcher::new(
        |hash: &String| format!("blocks/{hash}/operations"),
        decode_operation_groups,
    )
    .decode_both(|body| {
        let groups = decode_operation_groups(body)?;
        Ok(extract_account_ids(&groups))
    });
    let operations = with_retries(config.max_attempts(), || {
        ops_fetcher.run(client, hashes.clone(), concurrency)
    })
    .await?;

    // Rights decode failures are tolerated: older protocols answer these
    // endpoints with junk or nothing at all.
    let baking_fetcher = Fetcher::new(
        |hash: &String| format!("blocks/{hash}/helpers/baking_rights"),
        |body| {
            Ok(decode_baking_rights(body).unwrap_or_else(|err| {
                tracing::warn!("Discarding undecodable baking rights: {err}");
                Vec::new()
            }))
        },
    );
    let baking = with_retries(config.max_attempts(), || {
        baking_fetcher.run(client, hashes.clone(), concurrency)
    })
    .await?;

    let endorsing_fetcher = Fetcher::new(
        |hash: &String| format!("blocks/{hash}/helpers/endorsing_rights"),
        |body| {
            Ok(decode_endorsing_rights(body).unwrap_or_else(|err| {
                tracing::warn!("Discarding undecodable endorsing rights: {err}");
                Vec::new()
            }))
        },
    );
    let endorsing = with_retries(config.max_attempts(), || {
        endorsing_fetcher.run(client, hashes.clone(), concurrency)
    })
    .await?;

    let votes = fetch_votes(config, client, &hashes).await?;

    let mut out = Vec::with_capacity(blocks.len());
    for (block, ops, baking, endorsing, votes) in
        itertools::izip!(blocks, operations, baking, endorsing, votes)
    {
        let (_, (operation_groups, touched_accounts)) = ops;
        let touched_delegates =
            extract_delegate_keys(block.baker.as_deref(), &operation_groups);
        out.push(BlockData {
            block,
            operation_groups,
            touched_accounts,
            touched_delegates,
            baking_rights: baking.1,
            endorsing_rights: endorsing.1,
            votes,
        });
    }
    Ok(out)
}

/// The five votes endpoints, each batched over the block hashes. Bodies that
/// fail to decode count as no voting data; transport failures fail the batch.
async fn fetch_votes(
    config: &Config,
    client: &NodeClient,
    hashes: &[String],
) -> anyhow::Result<Vec<BlockVotes>> {
    let quorum = votes_bodies(config, client, hashes, "current_quorum").await?;
    let proposal = votes_bodies(config, client, hashes, "current_proposal").await?;
    let proposals = votes_bodies(config, client, hashes, "proposals").await?;
    let listings = votes_bodies(config, client, hashes, "listings").await?;
    let ballots = votes_bodies(config, client, hashes, "ballot_list").await?;

    let mut out = Vec::with_capacity(hashes.len());
    for i in 0..hashes.len() {
        out.push(BlockVotes {
            current_quorum: tolerant("current_quorum", decode_current_quorum(&quorum[i])),
            current_proposal: tolerant("current_proposal", decode_current_proposal(&proposal[i])),
            proposals: tolerant("proposals", decode_proposals(&proposals[i])),
            listings: tolerant("listings", decode_listings(&listings[i])),
            ballots: tolerant("ballot_list", decode_ballots(&ballots[i])),
        });
    }
    Ok(out)
}

async fn votes_bodies(
    config: &Config,
    client: &NodeClient,
    hashes: &[String],
    endpoint: &'static str,
) -> anyhow::Result<Vec<String>> {
    let inputs = hashes.to_vec();
    let fetched = with_retries(config.max_attempts(), || {
        client.batched_get(
            inputs.clone(),
            |hash| format!("blocks/{hash}/votes/{endpoint}"),
            config.fetch_concurrency(),
        )
    })
    .await?;
    Ok(fetched.into_iter().map(|(_, body)| body).collect())
}

fn tolerant<T: Default>(what: &str, result: Result<T, lorre_core::DecodeError>) -> T {
    result.unwrap_or_else(|err| {
        tracing::warn!("Discarding undecodable {what}: {err}");
        T::default()
    })
}
