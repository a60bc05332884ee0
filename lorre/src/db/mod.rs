use crate::config::Config;

use sqlx::SqlitePool;

pub mod account;
pub mod attributes;
pub mod block;
pub mod checkpoint;
pub mod delegate;
pub mod fees;
pub mod operation;
pub mod rights;
pub mod votes;

static MIGRATIONS: [&str; 17] = [
    "CREATE TABLE blocks (level INTEGER PRIMARY KEY, proto, predecessor, timestamp, fitness, context, signature, protocol, chain_id, hash UNIQUE, operations_hash, priority, period_kind, current_expected_quorum, active_proposal, baker, consumed_gas, meta_level, meta_level_position, meta_cycle, meta_cycle_position, meta_voting_period, meta_voting_period_position);",
    "CREATE TABLE operation_groups (hash PRIMARY KEY, branch, signature, protocol, chain_id, block_id, block_level);",
    "CREATE TABLE operations (operation_id INTEGER PRIMARY KEY, operation_group_hash, kind, level, nonce, pkh, secret, source, destination, delegate, amount, fee, counter, gas_limit, storage_limit, public_key, manager_pubkey, balance, spendable, delegatable, script, storage, parameters, status, consumed_gas, originated_contracts, period, proposal, ballot, internal, block_hash, block_level, timestamp, cycle);",
    "CREATE INDEX operations_kind_timestamp_idx ON operations (kind, timestamp DESC);",
    "CREATE INDEX operations_group_idx ON operations (operation_group_hash);",
    "CREATE INDEX operations_block_level_idx ON operations (block_level);",
    "CREATE TABLE accounts (account_id, block_id, block_level, manager, balance, spendable, delegate_setable, delegate_value, counter, script, storage, PRIMARY KEY (account_id, block_level));",
    "CREATE TABLE accounts_checkpoint (account_id, block_id, block_level INTEGER);",
    "CREATE INDEX accounts_checkpoint_id_idx ON accounts_checkpoint (account_id);",
    "CREATE TABLE delegates (pkh, block_id, block_level, balance, frozen_balance, staking_balance, delegated_balance, deactivated, grace_period, PRIMARY KEY (pkh, block_level));",
    "CREATE TABLE delegates_checkpoint (pkh, block_id, block_level INTEGER);",
    "CREATE TABLE baking_rights (block_hash, level, delegate, priority, estimated_time);",
    "CREATE TABLE endorsing_rights (block_hash, level, delegate, slot, estimated_time);",
    "CREATE TABLE proposals (protocol_hash, block_id, block_level, supporters);",
    "CREATE TABLE ballots (pkh, ballot, block_id, block_level);",
    "CREATE TABLE rolls (pkh, rolls, block_id, block_level);",
    "CREATE TABLE fees (id INTEGER PRIMARY KEY, low, medium, high, timestamp, kind, cycle, level);",
];

pub async fn initialize(config: &Config) -> anyhow::Result<SqlitePool> {
    let conn = config.sqlite().await?;
    migrate(&conn).await?;
    Ok(conn)
}

async fn migrate(conn: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query("CREATE TABLE IF NOT EXISTS schema (version);")
        .execute(conn)
        .await?;

    let (version,) =
        sqlx::query_as::<_, (i64,)>("SELECT COALESCE(MAX(version) + 1, 0) FROM schema;")
            .fetch_one(conn)
            .await?;

    for (idx, migration) in MIGRATIONS[version as usize..].iter().enumerate() {
        let version = idx as i64 + version;
        let mut tx = conn.begin().await?;
        tracing::debug!("Migrations schema version {version}");
        sqlx::query(migration).execute(&mut tx).await?;
        sqlx::query("INSERT INTO schema (version) VALUES (?);")
            .bind(version)
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}

/// Drops every indexed row above `level`, in one transaction. Used both by
/// the `rewind` subcommand and the reorg recovery path.
pub async fn rewind(conn: &SqlitePool, level: i64) -> anyhow::Result<()> {
    let mut tx = conn.begin().await?;
    sqlx::query("DELETE FROM operations WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM operation_groups WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM baking_rights WHERE block_hash IN (SELECT hash FROM blocks WHERE level > ?);")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM endorsing_rights WHERE block_hash IN (SELECT hash FROM blocks WHERE level > ?);")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM proposals WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM ballots WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM rolls WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM accounts WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM accounts_checkpoint WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM delegates WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM delegates_checkpoint WHERE block_level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM fees WHERE level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    sqlx::query("DELETE FROM blocks WHERE level > ?;")
        .bind(level)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
