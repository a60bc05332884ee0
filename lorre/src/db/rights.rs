use lorre_core::{BakingRight, EndorsingRight};
use sqlx::{Executor, Sqlite, Transaction};

pub async fn insert_baking_right(
    conn: impl Executor<'_, Database = Sqlite>,
    block_hash: &str,
    right: &BakingRight,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO baking_rights (block_hash, level, delegate, priority, estimated_time)
         VALUES (?, ?, ?, ?, ?);",
    )
    .bind(block_hash)
    .bind(right.level)
    .bind(&right.delegate)
    .bind(right.priority)
    .bind(right.estimated_unix())
    .execute(conn)
    .await?;
    Ok(())
}

/// One row per slot.
pub async fn insert_endorsing_right(
    tx: &mut Transaction<'_, Sqlite>,
    block_hash: &str,
    right: &EndorsingRight,
) -> anyhow::Result<()> {
    for slot in &right.slots {
        sqlx::query(
            "INSERT INTO endorsing_rights (block_hash, level, delegate, slot, estimated_time)
             VALUES (?, ?, ?, ?, ?);",
        )
        .bind(block_hash)
        .bind(right.level)
        .bind(&right.delegate)
        .bind(slot)
        .bind(right.estimated_unix())
        .execute(&mut *tx)
        .await?;
    }
    Ok(())
}
