use lorre_core::{average_fees, Block};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::{config::Config, db};

/// Once per cycle: for every operation kind with fees in the store, compute
/// one-sigma bands over the most recent window and append a fees row stamped
/// with the head's cycle and level.
pub(super) async fn aggregate(
    config: &Config,
    pool: &SqlitePool,
    head: &Block,
) -> anyhow::Result<()> {
    let kinds = db::operation::distinct_kinds(pool).await?;
    if kinds.is_empty() {
        return Ok(());
    }

    let now = OffsetDateTime::now_utc().unix_timestamp();
    for kind in kinds {
        let window = db::operation::recent_fees(pool, &kind, config.fee_window()).await?;
        let Some(average) = average_fees(&window) else {
            continue;
        };
        tracing::debug!(
            "Fees for {kind}: low {}, medium {}, high {} over {} operations.",
            average.low,
            average.medium,
            average.high,
            window.len()
        );
        db::fees::insert(pool, &kind, average, now, head.meta_cycle, Some(head.level)).await?;
    }
    Ok(())
}
