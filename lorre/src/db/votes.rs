use lorre_core::BlockVotes;
use sqlx::{Sqlite, Transaction};

/// The per-block voting subtables: proposals under vote, ballots cast, and
/// the roll listings. Quorum and active proposal land on the block row.
pub async fn insert_block_votes(
    tx: &mut Transaction<'_, Sqlite>,
    block_hash: &str,
    block_level: i64,
    votes: &BlockVotes,
) -> anyhow::Result<()> {
    for proposal in &votes.proposals {
        sqlx::query(
            "INSERT INTO proposals (protocol_hash, block_id, block_level, supporters)
             VALUES (?, ?, ?, ?);",
        )
        .bind(&proposal.protocol_hash)
        .bind(block_hash)
        .bind(block_level)
        .bind(proposal.supporters)
        .execute(&mut *tx)
        .await?;
    }

    for ballot in &votes.ballots {
        sqlx::query("INSERT INTO ballots (pkh, ballot, block_id, block_level) VALUES (?, ?, ?, ?);")
            .bind(&ballot.pkh)
            .bind(&ballot.ballot)
            .bind(block_hash)
            .bind(block_level)
            .execute(&mut *tx)
            .await?;
    }

    for listing in &votes.listings {
        sqlx::query("INSERT INTO rolls (pkh, rolls, block_id, block_level) VALUES (?, ?, ?, ?);")
            .bind(&listing.pkh)
            .bind(listing.rolls)
            .bind(block_hash)
            .bind(block_level)
            .execute(&mut *tx)
            .await?;
    }

    Ok(())
}
