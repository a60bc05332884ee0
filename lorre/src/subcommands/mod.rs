mod sync;

pub use sync::*;
use sqlx::SqlitePool;

use crate::{config::ConfigFile, db};

pub(crate) fn init() -> anyhow::Result<()> {
    let config_file = ConfigFile::example();
    let cfg = toml::to_string(&config_file)?;
    println!("{cfg} ");
    Ok(())
}

pub(crate) async fn rewind(pool: &SqlitePool, level: i64) -> anyhow::Result<()> {
    println!("Rewinding index to block level {level}.");
    db::rewind(pool, level).await?;
    Ok(())
}

pub(crate) async fn status(pool: &SqlitePool) -> anyhow::Result<()> {
    match db::block::max_level(pool).await? {
        Some(level) => {
            if let Some(block) = db::block::at_level(pool, level).await? {
                println!(
                    "Stored head: level {}, hash {}, predecessor {}",
                    block.level, block.hash, block.predecessor
                );
            }
        }
        None => println!("The store is empty."),
    }
    println!("Blocks: {}", db::block::block_count(pool).await?);
    println!("Operations: {}", db::operation::operation_count(pool).await?);
    println!("Accounts: {}", db::account::account_count(pool).await?);
    println!(
        "Checkpoint backlog: {}",
        db::checkpoint::checkpoint_depth(pool).await?
    );
    for kind in db::operation::distinct_kinds(pool).await? {
        if let Some(fees) = db::fees::latest(pool, &kind).await? {
            println!(
                "Fees for {}: low {}, medium {}, high {} (cycle {:?}, level {:?}, computed at {})",
                fees.kind, fees.low, fees.medium, fees.high, fees.cycle, fees.level, fees.timestamp
            );
        }
    }
    Ok(())
}

pub(crate) async fn lookup(pool: &SqlitePool, id: &str) -> anyhow::Result<()> {
    match db::account::latest(pool, id).await? {
        Some(account) => {
            println!(
                "Account {} as of level {} (block {}):",
                account.account_id, account.block_level, account.block_id
            );
            println!("  balance: {}", account.balance);
            println!("  manager: {:?}", account.manager);
            println!("  counter: {:?}", account.counter);
            println!("  spendable: {:?}", account.spendable);
            println!(
                "  delegate: {:?} (setable {:?})",
                account.delegate_value, account.delegate_setable
            );
            println!(
                "  script: {}",
                if account.script.is_some() || account.storage.is_some() {
                    "yes"
                } else {
                    "no"
                }
            );
        }
        None => println!("No stored account {id}."),
    }

    if let Some(delegate) = db::delegate::latest(pool, id).await? {
        println!(
            "Delegate {} as of level {} (block {}):",
            delegate.pkh, delegate.block_level, delegate.block_id
        );
        println!("  balance: {:?}", delegate.balance);
        println!("  frozen balance: {:?}", delegate.frozen_balance);
        println!("  staking balance: {:?}", delegate.staking_balance);
        println!("  delegated balance: {:?}", delegate.delegated_balance);
        println!("  deactivated: {:?}", delegate.deactivated);
        println!("  grace period: {:?}", delegate.grace_period);
    }
    Ok(())
}

pub(crate) async fn values(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    prefix: Option<&str>,
) -> anyhow::Result<()> {
    for value in db::attributes::distinct_values(pool, table, column, prefix).await? {
        println!("{value}");
    }
    Ok(())
}

pub(crate) fn version() {
    let version = env!("CARGO_PKG_VERSION");
    println!("Current version is {version}");
}
