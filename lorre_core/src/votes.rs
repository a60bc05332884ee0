use serde::Deserialize;

use crate::{is_empty_body, DecodeError};

/// Voting state fetched per block from the five `votes/` endpoints.
#[derive(Debug, Clone, Default)]
pub struct BlockVotes {
    pub current_quorum: Option<i64>,
    pub current_proposal: Option<String>,
    pub proposals: Vec<Proposal>,
    pub listings: Vec<Listing>,
    pub ballots: Vec<BallotVote>,
}

#[derive(Debug, Clone)]
pub struct Proposal {
    pub protocol_hash: String,
    pub supporters: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub pkh: String,
    pub rolls: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BallotVote {
    pub pkh: String,
    pub ballot: String,
}

pub fn decode_current_quorum(body: &str) -> Result<Option<i64>, DecodeError> {
    if is_empty_body(body) {
        return Ok(None);
    }
    Ok(serde_json::from_str(body)?)
}

pub fn decode_current_proposal(body: &str) -> Result<Option<String>, DecodeError> {
    if is_empty_body(body) {
        return Ok(None);
    }
    Ok(serde_json::from_str(body)?)
}

/// Proposals arrive as `[["<protocol hash>", <supporter rolls>], ...]`.
pub fn decode_proposals(body: &str) -> Result<Vec<Proposal>, DecodeError> {
    if is_empty_body(body) {
        return Ok(Vec::new());
    }
    let pairs: Vec<(String, i64)> = serde_json::from_str(body)?;
    Ok(pairs
        .into_iter()
        .map(|(protocol_hash, supporters)| Proposal {
            protocol_hash,
            supporters,
        })
        .collect())
}

pub fn decode_listings(body: &str) -> Result<Vec<Listing>, DecodeError> {
    if is_empty_body(body) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}

pub fn decode_ballots(body: &str) -> Result<Vec<BallotVote>, DecodeError> {
    if is_empty_body(body) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}
