use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::bail;
use lorre_core::DecodeError;
use sqlx::SqlitePool;

use crate::{config::Config, db, rpc::NodeClient};

mod accounts;
mod blocks;
mod fees;
#[cfg(test)]
mod testnode;

#[derive(Debug)]
pub(crate) enum CycleOutcome {
    /// The store already holds the head level.
    Idle,
    Advanced {
        blocks: usize,
    },
    /// Shutdown was requested mid-walk; whatever committed stays.
    Interrupted,
}

/// The indexing loop: fetch head, compare, walk, drain, aggregate, sleep.
/// Failed cycles back off exponentially; an unknown operation kind halts the
/// loop outright.
pub(crate) async fn sync(config: &Config, pool: &SqlitePool) -> anyhow::Result<()> {
    let client = NodeClient::new(config)?;
    // Translate SIGINT/SIGTERM into a shutdown the guards below observe.
    tokio::spawn(elegant_departure::tokio::depart().on_termination());
    let stop = shutdown_flag();
    let guard = elegant_departure::get_shutdown_guard();
    let mut backoff = Backoff::new(config.idle_interval());

    tracing::info!(
        "Syncing {} from {}",
        config.network(),
        config.node_base_url()
    );

    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let sleep_for = match cycle(config, &client, pool, &stop).await {
            Ok(CycleOutcome::Idle) => {
                backoff.reset();
                config.idle_interval()
            }
            Ok(CycleOutcome::Advanced { blocks }) => {
                tracing::info!("Indexed {blocks} blocks.");
                backoff.reset();
                config.idle_interval()
            }
            Ok(CycleOutcome::Interrupted) => break,
            Err(err) if is_fatal(&err) => {
                tracing::error!("Halting sync: {err:#}");
                return Err(err);
            }
            Err(err) => {
                tracing::error!("Indexing cycle failed: {err:#}");
                backoff.bump()
            }
        };

        tokio::select! {
            () = tokio::time::sleep(sleep_for) => {}
            _ = guard.wait() => break,
        }
    }

    tracing::info!("Sync loop stopped.");
    Ok(())
}

/// Run exactly one indexing cycle.
pub(crate) async fn once(config: &Config, pool: &SqlitePool) -> anyhow::Result<()> {
    let client = NodeClient::new(config)?;
    let stop = shutdown_flag();

    match cycle(config, &client, pool, &stop).await? {
        CycleOutcome::Idle => println!("Nothing to do, store is at the chain head."),
        CycleOutcome::Advanced { blocks } => println!("Indexed {blocks} blocks."),
        CycleOutcome::Interrupted => println!("Interrupted."),
    }
    Ok(())
}

async fn cycle(
    config: &Config,
    client: &NodeClient,
    pool: &SqlitePool,
    stop: &AtomicBool,
) -> anyhow::Result<CycleOutcome> {
    let head_body = with_retries(config.max_attempts(), || client.get("blocks/head")).await?;
    let head = lorre_core::decode_block(&head_body)?;

    let known_top = db::block::max_level(pool).await?;
    if let Some(top) = known_top {
        if head.level <= top {
            tracing::debug!("Stored level {top} is at or ahead of head {}.", head.level);
            return Ok(CycleOutcome::Idle);
        }
    }

    blocks::check_reorg(config, client, pool, &head).await?;
    // A rewind may have moved the top.
    let known_top = db::block::max_level(pool).await?.unwrap_or(-1);

    let written = blocks::walk(config, client, pool, &head, known_top, stop).await?;
    fees::aggregate(config, pool, &head).await?;

    if stop.load(Ordering::SeqCst) {
        return Ok(CycleOutcome::Interrupted);
    }
    Ok(CycleOutcome::Advanced { blocks: written })
}

/// True when the failure means more retries can only repeat the damage.
fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<DecodeError>()
            .is_some_and(DecodeError::is_fatal)
    })
}

fn shutdown_flag() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    tokio::spawn(async move {
        elegant_departure::get_shutdown_guard().wait().await;
        flag.store(true, Ordering::SeqCst);
    });
    stop
}

/// Transport-level retry inside a cycle. Decode failures are not retried;
/// the body will not get better.
async fn with_retries<T, F, Fut>(max_attempts: u32, op: F) -> anyhow::Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<T>>,
{
    let mut delay = Duration::from_millis(500);
    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.chain().any(|c| c.downcast_ref::<DecodeError>().is_some()) => {
                return Err(err)
            }
            Err(err) if attempt == max_attempts => return Err(err),
            Err(err) => {
                tracing::warn!("Fetch attempt {attempt}/{max_attempts} failed: {err:#}");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(30));
            }
        }
    }
    bail!("retry loop exhausted")
}

/// Exponential backoff between failed cycles, capped at five minutes.
struct Backoff {
    base: Duration,
    current: Duration,
}

impl Backoff {
    fn new(base: Duration) -> Backoff {
        Backoff {
            base,
            current: base,
        }
    }

    fn bump(&mut self) -> Duration {
        let sleep = self.current;
        self.current = (self.current * 2).min(Duration::from_secs(300));
        sleep
    }

    fn reset(&mut self) {
        self.current = self.base;
    }
}
