use lorre_core::AverageFees;
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeeRow {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub timestamp: i64,
    pub kind: String,
    pub cycle: Option<i64>,
    pub level: Option<i64>,
}

pub async fn insert(
    conn: &SqlitePool,
    kind: &str,
    fees: AverageFees,
    timestamp: i64,
    cycle: Option<i64>,
    level: Option<i64>,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO fees (low, medium, high, timestamp, kind, cycle, level)
         VALUES (?, ?, ?, ?, ?, ?, ?);",
    )
    .bind(fees.low)
    .bind(fees.medium)
    .bind(fees.high)
    .bind(timestamp)
    .bind(kind)
    .bind(cycle)
    .bind(level)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn latest(conn: &SqlitePool, kind: &str) -> anyhow::Result<Option<FeeRow>> {
    let row = sqlx::query_as::<_, FeeRow>(
        "SELECT low, medium, high, timestamp, kind, cycle, level
         FROM fees WHERE kind = ? ORDER BY timestamp DESC, id DESC LIMIT 1;",
    )
    .bind(kind)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}
