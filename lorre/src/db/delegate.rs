#![allow(clippy::module_name_repetitions)]

use lorre_core::Delegate;
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DelegateRow {
    pub pkh: String,
    pub block_id: String,
    pub block_level: i64,
    pub balance: Option<i64>,
    pub frozen_balance: Option<i64>,
    pub staking_balance: Option<i64>,
    pub delegated_balance: Option<i64>,
    pub deactivated: Option<bool>,
    pub grace_period: Option<i64>,
}

pub async fn upsert(
    conn: &SqlitePool,
    pkh: &str,
    delegate: &Delegate,
    block_hash: &str,
    block_level: i64,
) -> anyhow::Result<()> {
    sqlx::query(include_str!("./queries/insert_delegate.sql"))
        .bind(pkh)
        .bind(block_hash)
        .bind(block_level)
        .bind(delegate.balance)
        .bind(delegate.frozen_balance)
        .bind(delegate.staking_balance)
        .bind(delegate.delegated_balance)
        .bind(delegate.deactivated)
        .bind(delegate.grace_period)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn latest(conn: &SqlitePool, pkh: &str) -> anyhow::Result<Option<DelegateRow>> {
    let row = sqlx::query_as::<_, DelegateRow>(
        "SELECT * FROM delegates WHERE pkh = ? ORDER BY block_level DESC LIMIT 1;",
    )
    .bind(pkh)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}
