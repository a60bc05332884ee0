use anyhow::bail;
use sqlx::SqlitePool;

/// How a column may be queried by the value-listing read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Text,
    Integer,
    Boolean,
    DateTime,
}

/// The queryable surface, table by table. Identifiers used in generated SQL
/// are taken from this listing, never from the caller.
static ATTRIBUTES: &[(&str, &[(&str, AttributeType)])] = &[
    (
        "blocks",
        &[
            ("hash", AttributeType::Text),
            ("predecessor", AttributeType::Text),
            ("baker", AttributeType::Text),
            ("protocol", AttributeType::Text),
            ("period_kind", AttributeType::Text),
            ("level", AttributeType::Integer),
            ("timestamp", AttributeType::DateTime),
        ],
    ),
    (
        "operations",
        &[
            ("kind", AttributeType::Text),
            ("source", AttributeType::Text),
            ("destination", AttributeType::Text),
            ("delegate", AttributeType::Text),
            ("status", AttributeType::Text),
            ("fee", AttributeType::Integer),
            ("amount", AttributeType::Integer),
            ("internal", AttributeType::Boolean),
            ("timestamp", AttributeType::DateTime),
        ],
    ),
    (
        "operation_groups",
        &[
            ("hash", AttributeType::Text),
            ("branch", AttributeType::Text),
            ("block_id", AttributeType::Text),
        ],
    ),
    (
        "accounts",
        &[
            ("account_id", AttributeType::Text),
            ("manager", AttributeType::Text),
            ("delegate_value", AttributeType::Text),
            ("balance", AttributeType::Integer),
        ],
    ),
    (
        "fees",
        &[
            ("kind", AttributeType::Text),
            ("low", AttributeType::Integer),
            ("medium", AttributeType::Integer),
            ("high", AttributeType::Integer),
            ("timestamp", AttributeType::DateTime),
        ],
    ),
];

fn attribute_type(table: &str, column: &str) -> anyhow::Result<AttributeType> {
    let Some((_, columns)) = ATTRIBUTES.iter().find(|(name, _)| *name == table) else {
        bail!("unknown table: {table}");
    };
    let Some((_, ty)) = columns.iter().find(|(name, _)| *name == column) else {
        bail!("unknown attribute: {table}.{column}");
    };
    Ok(*ty)
}

/// Distinct values of a text attribute, optionally restricted to a prefix.
/// The prefix is bound as a parameter, so filter text never reaches the SQL
/// layer as syntax. Numeric and datetime attributes are refused outright.
pub async fn distinct_values(
    conn: &SqlitePool,
    table: &str,
    column: &str,
    prefix: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    match attribute_type(table, column)? {
        AttributeType::Text => {}
        other => bail!(
            "cannot list distinct values of {table}.{column}: non-enumerable data type {other:?} (high cardinality)"
        ),
    }

    // Identifiers come from the static listing above, validated just now.
    let sql = format!(
        "SELECT DISTINCT {column} FROM {table} WHERE {column} IS NOT NULL AND {column} LIKE ? ESCAPE '\\' ORDER BY {column};"
    );
    let escaped = prefix
        .unwrap_or_default()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = format!("{escaped}%");
    let rows = sqlx::query_as::<_, (String,)>(&sql)
        .bind(pattern)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(|(value,)| value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use lorre_core::AverageFees;

    async fn seeded_pool() -> SqlitePool {
        let pool = db::test_pool().await;
        for (kind, medium) in [("transaction", 30), ("origination", 90)] {
            db::fees::insert(
                &pool,
                kind,
                AverageFees {
                    low: medium - 10,
                    medium,
                    high: medium + 10,
                },
                1_530_619_288,
                Some(0),
                Some(4),
            )
            .await
            .unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_distinct_values() {
        let pool = seeded_pool().await;
        let kinds = distinct_values(&pool, "fees", "kind", None).await.unwrap();
        assert_eq!(kinds, vec!["origination", "transaction"]);

        let kinds = distinct_values(&pool, "fees", "kind", Some("trans"))
            .await
            .unwrap();
        assert_eq!(kinds, vec!["transaction"]);
    }

    #[tokio::test]
    async fn test_numeric_attributes_are_not_enumerable() {
        let pool = seeded_pool().await;
        let err = distinct_values(&pool, "fees", "medium", None)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("non-enumerable data type"));
        assert!(message.contains("high cardinality"));
    }

    #[tokio::test]
    async fn test_unknown_identifiers_are_rejected() {
        let pool = seeded_pool().await;
        assert!(distinct_values(&pool, "fees", "kind; --", None)
            .await
            .is_err());
        assert!(distinct_values(&pool, "sqlite_master", "name", None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_injection_shaped_prefix_is_inert() {
        let pool = seeded_pool().await;
        let values = distinct_values(
            &pool,
            "fees",
            "kind",
            Some("'; DELETE FROM fees WHERE kind LIKE '"),
        )
        .await
        .unwrap();
        assert!(values.is_empty());

        // and the table is untouched
        let row = db::fees::latest(&pool, "transaction").await.unwrap();
        assert!(row.is_some());
    }
}
