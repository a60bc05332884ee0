#![allow(clippy::module_name_repetitions)]

use lorre_core::Account;
use sqlx::SqlitePool;

/// One versioned account row; reads return the row at the highest
/// block_level for the id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub account_id: String,
    pub block_id: String,
    pub block_level: i64,
    pub manager: Option<String>,
    pub balance: i64,
    pub spendable: Option<bool>,
    pub delegate_setable: Option<bool>,
    pub delegate_value: Option<String>,
    pub counter: Option<i64>,
    pub script: Option<String>,
    pub storage: Option<String>,
}

/// A repeated read at the same level replaces the row; a read at a newer
/// level adds a version.
pub async fn upsert(
    conn: &SqlitePool,
    account_id: &str,
    account: &Account,
    block_hash: &str,
    block_level: i64,
) -> anyhow::Result<()> {
    sqlx::query(include_str!("./queries/insert_account.sql"))
        .bind(account_id)
        .bind(block_hash)
        .bind(block_level)
        .bind(&account.manager)
        .bind(account.balance)
        .bind(account.spendable)
        .bind(account.delegate_setable)
        .bind(&account.delegate_value)
        .bind(account.counter)
        .bind(&account.script)
        .bind(&account.storage)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn latest(conn: &SqlitePool, account_id: &str) -> anyhow::Result<Option<AccountRow>> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT * FROM accounts WHERE account_id = ? ORDER BY block_level DESC LIMIT 1;",
    )
    .bind(account_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn account_count(conn: &SqlitePool) -> anyhow::Result<i64> {
    let (count,) =
        sqlx::query_as::<_, (i64,)>("SELECT count(DISTINCT account_id) FROM accounts;")
            .fetch_one(conn)
            .await?;
    Ok(count)
}
