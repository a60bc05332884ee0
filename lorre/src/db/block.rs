#![allow(clippy::module_name_repetitions)]

use lorre_core::{Block, BlockData, BlockVotes};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::{checkpoint, operation, rights, votes};

/// The slice of a stored block the sync worker reads back: enough to detect
/// reorgs and continue the walk.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredBlock {
    pub level: i64,
    pub hash: String,
    pub predecessor: String,
}

pub async fn max_level(conn: &SqlitePool) -> anyhow::Result<Option<i64>> {
    let (level,) = sqlx::query_as::<_, (Option<i64>,)>("SELECT MAX(level) FROM blocks;")
        .fetch_one(conn)
        .await?;
    Ok(level)
}

pub async fn at_level(conn: &SqlitePool, level: i64) -> anyhow::Result<Option<StoredBlock>> {
    let block = sqlx::query_as::<_, StoredBlock>(
        "SELECT level, hash, predecessor FROM blocks WHERE level = ?;",
    )
    .bind(level)
    .fetch_optional(conn)
    .await?;
    Ok(block)
}

pub async fn block_count(conn: &SqlitePool) -> anyhow::Result<i64> {
    let (count,) = sqlx::query_as::<_, (i64,)>("SELECT count(*) FROM blocks;")
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Writes one block and everything fetched with it in a single transaction,
/// in FK order: block, groups, operations, rights, votes, checkpoint rows.
/// A block already present is skipped entirely, which makes a crashed cycle
/// safe to re-run. Returns whether the block was new.
pub async fn insert_block_data(conn: &SqlitePool, data: &BlockData) -> anyhow::Result<bool> {
    let mut tx = conn.begin().await?;

    if !insert_block(&mut tx, &data.block, &data.votes).await? {
        tx.commit().await?;
        return Ok(false);
    }

    let block = &data.block;
    for group in &data.operation_groups {
        operation::insert_operation_group(&mut tx, group, block).await?;
        for op in &group.contents {
            for flat in op.flatten() {
                operation::insert_operation(&mut tx, &flat, &group.hash, block).await?;
            }
        }
    }

    for right in &data.baking_rights {
        rights::insert_baking_right(&mut tx, &block.hash, right).await?;
    }
    for right in &data.endorsing_rights {
        rights::insert_endorsing_right(&mut tx, &block.hash, right).await?;
    }

    votes::insert_block_votes(&mut tx, &block.hash, block.level, &data.votes).await?;

    checkpoint::enqueue_accounts(&mut tx, &data.touched_accounts, &block.hash, block.level)
        .await?;
    checkpoint::enqueue_delegates(&mut tx, &data.touched_delegates, &block.hash, block.level)
        .await?;

    tx.commit().await?;
    Ok(true)
}

async fn insert_block(
    tx: &mut Transaction<'_, Sqlite>,
    block: &Block,
    votes: &BlockVotes,
) -> anyhow::Result<bool> {
    let result = sqlx::query(include_str!("./queries/insert_block.sql"))
        .bind(block.level)
        .bind(block.proto)
        .bind(&block.predecessor)
        .bind(block.timestamp)
        .bind(&block.fitness)
        .bind(&block.context)
        .bind(&block.signature)
        .bind(&block.protocol)
        .bind(&block.chain_id)
        .bind(&block.hash)
        .bind(&block.operations_hash)
        .bind(block.priority)
        .bind(&block.period_kind)
        .bind(votes.current_quorum)
        .bind(&votes.current_proposal)
        .bind(&block.baker)
        .bind(block.consumed_gas)
        .bind(block.meta_level)
        .bind(block.meta_level_position)
        .bind(block.meta_cycle)
        .bind(block.meta_cycle_position)
        .bind(block.meta_voting_period)
        .bind(block.meta_voting_period_position)
        .execute(&mut *tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    pub(crate) fn block_data(level: i64, hash: &str, predecessor: &str) -> BlockData {
        BlockData {
            block: Block {
                level,
                proto: 1,
                predecessor: predecessor.to_string(),
                timestamp: 1_530_619_288 + level,
                fitness: "00,0503".to_string(),
                context: None,
                signature: None,
                protocol: "Psd".to_string(),
                chain_id: "NetXdQprcVkpaWU".to_string(),
                hash: hash.to_string(),
                operations_hash: None,
                priority: Some(0),
                period_kind: Some("proposal".to_string()),
                baker: Some("tz1baker".to_string()),
                consumed_gas: None,
                meta_level: Some(level),
                meta_level_position: Some(level - 1),
                meta_cycle: Some(0),
                meta_cycle_position: Some(level - 1),
                meta_voting_period: Some(0),
                meta_voting_period_position: Some(level - 1),
            },
            operation_groups: Vec::new(),
            touched_accounts: Vec::new(),
            touched_delegates: Vec::new(),
            baking_rights: Vec::new(),
            endorsing_rights: Vec::new(),
            votes: BlockVotes::default(),
        }
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let pool = db::test_pool().await;
        let data = block_data(1, "B1", "B0");

        assert!(insert_block_data(&pool, &data).await.unwrap());
        assert!(!insert_block_data(&pool, &data).await.unwrap());
        assert_eq!(block_count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_max_level_and_lookup() {
        let pool = db::test_pool().await;
        assert_eq!(max_level(&pool).await.unwrap(), None);

        insert_block_data(&pool, &block_data(1, "B1", "B0"))
            .await
            .unwrap();
        insert_block_data(&pool, &block_data(2, "B2", "B1"))
            .await
            .unwrap();

        assert_eq!(max_level(&pool).await.unwrap(), Some(2));
        let stored = at_level(&pool, 2).await.unwrap().unwrap();
        assert_eq!(stored.hash, "B2");
        assert_eq!(stored.predecessor, "B1");
        assert!(at_level(&pool, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rewind_drops_rows_above_level() {
        let pool = db::test_pool().await;
        for level in 1..=4 {
            let mut data = block_data(level, &format!("B{level}"), &format!("B{}", level - 1));
            data.touched_accounts = vec!["tz1a".to_string()];
            insert_block_data(&pool, &data).await.unwrap();
        }
        db::fees::insert(
            &pool,
            "transaction",
            lorre_core::AverageFees {
                low: 10,
                medium: 20,
                high: 30,
            },
            1_530_619_288,
            Some(0),
            Some(4),
        )
        .await
        .unwrap();

        db::rewind(&pool, 2).await.unwrap();
        assert_eq!(max_level(&pool).await.unwrap(), Some(2));
        assert!(db::checkpoint::pending_accounts(&pool)
            .await
            .unwrap()
            .iter()
            .all(|entry| entry.block_level <= 2));
        // fee rows stamped above the cut go with the blocks
        assert!(db::fees::latest(&pool, "transaction")
            .await
            .unwrap()
            .is_none());
    }
}
