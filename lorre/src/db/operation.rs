#![allow(clippy::module_name_repetitions)]

use lorre_core::{Block, FlatOperation, OperationGroup};
use sqlx::{Executor, Sqlite, SqlitePool};

pub async fn insert_operation_group(
    conn: impl Executor<'_, Database = Sqlite>,
    group: &OperationGroup,
    block: &Block,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO operation_groups (hash, branch, signature, protocol, chain_id, block_id, block_level)
         VALUES (?, ?, ?, ?, ?, ?, ?) ON CONFLICT DO NOTHING;",
    )
    .bind(&group.hash)
    .bind(&group.branch)
    .bind(&group.signature)
    .bind(&group.protocol)
    .bind(&group.chain_id)
    .bind(&block.hash)
    .bind(block.level)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_operation(
    conn: impl Executor<'_, Database = Sqlite>,
    flat: &FlatOperation,
    group_hash: &str,
    block: &Block,
) -> anyhow::Result<()> {
    sqlx::query(include_str!("./queries/insert_operation.sql"))
        .bind(group_hash)
        .bind(&flat.kind)
        .bind(flat.level)
        .bind(&flat.nonce)
        .bind(&flat.pkh)
        .bind(&flat.secret)
        .bind(&flat.source)
        .bind(&flat.destination)
        .bind(&flat.delegate)
        .bind(flat.amount)
        .bind(flat.fee)
        .bind(flat.counter)
        .bind(flat.gas_limit)
        .bind(flat.storage_limit)
        .bind(&flat.public_key)
        .bind(&flat.manager_pubkey)
        .bind(flat.balance)
        .bind(flat.spendable)
        .bind(flat.delegatable)
        .bind(&flat.script)
        .bind(&flat.storage)
        .bind(&flat.parameters)
        .bind(&flat.status)
        .bind(flat.consumed_gas)
        .bind(&flat.originated_contracts)
        .bind(flat.period)
        .bind(&flat.proposal)
        .bind(&flat.ballot)
        .bind(flat.internal)
        .bind(&block.hash)
        .bind(block.level)
        .bind(block.timestamp)
        .bind(block.meta_cycle)
        .execute(conn)
        .await?;
    Ok(())
}

/// Kinds present in the store, for the fee aggregation sweep.
pub async fn distinct_kinds(conn: &SqlitePool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT DISTINCT kind FROM operations WHERE fee IS NOT NULL ORDER BY kind;",
    )
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(kind,)| kind).collect())
}

/// Fees of the most recent `window` operations of one kind, newest first.
pub async fn recent_fees(
    conn: &SqlitePool,
    kind: &str,
    window: usize,
) -> anyhow::Result<Vec<i64>> {
    let rows = sqlx::query_as::<_, (i64,)>(
        "SELECT fee FROM operations WHERE kind = ? AND fee IS NOT NULL
         ORDER BY timestamp DESC, operation_id DESC LIMIT ?;",
    )
    .bind(kind)
    .bind(window as i64)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(fee,)| fee).collect())
}

pub async fn operation_count(conn: &SqlitePool) -> anyhow::Result<i64> {
    let (count,) = sqlx::query_as::<_, (i64,)>("SELECT count(*) FROM operations;")
        .fetch_one(conn)
        .await?;
    Ok(count)
}
