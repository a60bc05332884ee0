#![allow(clippy::module_name_repetitions)]

use sqlx::{Sqlite, SqlitePool, Transaction};

/// A queued re-read: this account (or delegate) was touched at this block and
/// its fresh state still has to be fetched and persisted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckpointEntry {
    pub id: String,
    pub block_id: String,
    pub block_level: i64,
}

pub async fn enqueue_accounts(
    tx: &mut Transaction<'_, Sqlite>,
    account_ids: &[String],
    block_hash: &str,
    block_level: i64,
) -> anyhow::Result<()> {
    for id in account_ids {
        sqlx::query(
            "INSERT INTO accounts_checkpoint (account_id, block_id, block_level) VALUES (?, ?, ?);",
        )
        .bind(id)
        .bind(block_hash)
        .bind(block_level)
        .execute(&mut *tx)
        .await?;
    }
    Ok(())
}

pub async fn enqueue_delegates(
    tx: &mut Transaction<'_, Sqlite>,
    pkhs: &[String],
    block_hash: &str,
    block_level: i64,
) -> anyhow::Result<()> {
    for pkh in pkhs {
        sqlx::query(
            "INSERT INTO delegates_checkpoint (pkh, block_id, block_level) VALUES (?, ?, ?);",
        )
        .bind(pkh)
        .bind(block_hash)
        .bind(block_level)
        .execute(&mut *tx)
        .await?;
    }
    Ok(())
}

/// Each distinct queued account at its maximum queued level: the state read
/// against that block supersedes every older queued read.
pub async fn pending_accounts(conn: &SqlitePool) -> anyhow::Result<Vec<CheckpointEntry>> {
    let entries = sqlx::query_as::<_, CheckpointEntry>(
        "SELECT account_id AS id, block_id, MAX(block_level) AS block_level
         FROM accounts_checkpoint GROUP BY account_id ORDER BY account_id;",
    )
    .fetch_all(conn)
    .await?;
    Ok(entries)
}

pub async fn pending_delegates(conn: &SqlitePool) -> anyhow::Result<Vec<CheckpointEntry>> {
    let entries = sqlx::query_as::<_, CheckpointEntry>(
        "SELECT pkh AS id, block_id, MAX(block_level) AS block_level
         FROM delegates_checkpoint GROUP BY pkh ORDER BY pkh;",
    )
    .fetch_all(conn)
    .await?;
    Ok(entries)
}

/// Drops queue rows made obsolete by a persisted account row at `level`.
pub async fn prune_accounts(conn: &SqlitePool, account_id: &str, level: i64) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM accounts_checkpoint WHERE account_id = ? AND block_level <= ?;")
        .bind(account_id)
        .bind(level)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn prune_delegates(conn: &SqlitePool, pkh: &str, level: i64) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM delegates_checkpoint WHERE pkh = ? AND block_level <= ?;")
        .bind(pkh)
        .bind(level)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn checkpoint_depth(conn: &SqlitePool) -> anyhow::Result<i64> {
    let (count,) = sqlx::query_as::<_, (i64,)>("SELECT count(*) FROM accounts_checkpoint;")
        .fetch_one(conn)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn enqueue(pool: &SqlitePool, ids: &[&str], hash: &str, level: i64) {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        let mut tx = pool.begin().await.unwrap();
        enqueue_accounts(&mut tx, &ids, hash, level).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_pending_takes_max_level_per_account() {
        let pool = db::test_pool().await;
        enqueue(&pool, &["tz1a", "tz1b"], "B1", 1).await;
        enqueue(&pool, &["tz1a"], "B3", 3).await;

        let pending = pending_accounts(&pool).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "tz1a");
        assert_eq!(pending[0].block_level, 3);
        assert_eq!(pending[0].block_id, "B3");
        assert_eq!(pending[1].id, "tz1b");
        assert_eq!(pending[1].block_level, 1);
    }

    #[tokio::test]
    async fn test_prune_keeps_newer_entries() {
        let pool = db::test_pool().await;
        enqueue(&pool, &["tz1a"], "B1", 1).await;
        enqueue(&pool, &["tz1a"], "B3", 3).await;

        prune_accounts(&pool, "tz1a", 1).await.unwrap();
        let pending = pending_accounts(&pool).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].block_level, 3);

        prune_accounts(&pool, "tz1a", 3).await.unwrap();
        assert!(pending_accounts(&pool).await.unwrap().is_empty());
    }
}
