use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    json::string_to_i64, BakingRight, BlockVotes, DecodeError, EndorsingRight, OperationGroup,
};

/// Block JSON as the node serves it: a header that is always present and
/// metadata that pruned nodes may omit.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    pub protocol: String,
    pub chain_id: String,
    pub hash: String,
    pub header: RawBlockHeader,
    #[serde(default)]
    pub metadata: Option<RawBlockMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBlockHeader {
    pub level: i64,
    pub proto: i64,
    pub predecessor: String,
    pub timestamp: String,
    #[serde(default)]
    pub operations_hash: Option<String>,
    #[serde(default)]
    pub fitness: Vec<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBlockMetadata {
    #[serde(default)]
    pub baker: Option<String>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub consumed_gas: Option<i64>,
    #[serde(default)]
    pub voting_period_kind: Option<String>,
    #[serde(default)]
    pub level: Option<RawLevelInfo>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawLevelInfo {
    pub level: i64,
    #[serde(default)]
    pub level_position: Option<i64>,
    pub cycle: i64,
    #[serde(default)]
    pub cycle_position: Option<i64>,
    pub voting_period: i64,
    #[serde(default)]
    pub voting_period_position: Option<i64>,
}

/// The flattened block record the store persists.
#[derive(Debug, Clone)]
pub struct Block {
    pub level: i64,
    pub proto: i64,
    pub predecessor: String,
    pub timestamp: i64,
    pub fitness: String,
    pub context: Option<String>,
    pub signature: Option<String>,
    pub protocol: String,
    pub chain_id: String,
    pub hash: String,
    pub operations_hash: Option<String>,
    pub priority: Option<i64>,
    pub period_kind: Option<String>,
    pub baker: Option<String>,
    pub consumed_gas: Option<i64>,
    pub meta_level: Option<i64>,
    pub meta_level_position: Option<i64>,
    pub meta_cycle: Option<i64>,
    pub meta_cycle_position: Option<i64>,
    pub meta_voting_period: Option<i64>,
    pub meta_voting_period_position: Option<i64>,
}

impl Block {
    pub fn from_raw(raw: RawBlock) -> Result<Block, DecodeError> {
        let timestamp = OffsetDateTime::parse(&raw.header.timestamp, &Rfc3339)?.unix_timestamp();
        let meta = raw.metadata;
        let level_info = meta.as_ref().and_then(|m| m.level);

        Ok(Block {
            level: raw.header.level,
            proto: raw.header.proto,
            predecessor: raw.header.predecessor,
            timestamp,
            fitness: raw.header.fitness.join(","),
            context: raw.header.context,
            signature: raw.header.signature,
            protocol: raw.protocol,
            chain_id: raw.chain_id,
            hash: raw.hash,
            operations_hash: raw.header.operations_hash,
            priority: raw.header.priority,
            period_kind: meta.as_ref().and_then(|m| m.voting_period_kind.clone()),
            baker: meta.as_ref().and_then(|m| m.baker.clone()),
            consumed_gas: meta.as_ref().and_then(|m| m.consumed_gas),
            meta_level: level_info.map(|l| l.level),
            meta_level_position: level_info.and_then(|l| l.level_position),
            meta_cycle: level_info.map(|l| l.cycle),
            meta_cycle_position: level_info.and_then(|l| l.cycle_position),
            meta_voting_period: level_info.map(|l| l.voting_period),
            meta_voting_period_position: level_info.and_then(|l| l.voting_period_position),
        })
    }
}

pub fn decode_block(body: &str) -> Result<Block, DecodeError> {
    let raw: RawBlock = serde_json::from_str(body)?;
    Block::from_raw(raw)
}

/// Everything fetched for one block before it is written: the block itself,
/// its operation groups, the account ids those operations touch, rights and
/// voting data.
#[derive(Debug, Clone)]
pub struct BlockData {
    pub block: Block,
    pub operation_groups: Vec<OperationGroup>,
    pub touched_accounts: Vec<String>,
    pub touched_delegates: Vec<String>,
    pub baking_rights: Vec<BakingRight>,
    pub endorsing_rights: Vec<EndorsingRight>,
    pub votes: BlockVotes,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK_JSON: &str = r#"{
        "protocol": "PsddFKi32cMJ2qPjf43Qv5GDWLDPZb3T3bF6fLKiF5HtvHNU7aP",
        "chain_id": "NetXdQprcVkpaWU",
        "hash": "BLockGenesisGenesisGenesisGenesisGenesisf79b5d1CoW2",
        "header": {
            "level": 1407,
            "proto": 1,
            "predecessor": "BKpbfCvh777DQHnXjU2sqHvVUNZ7dBAdqEfKkdw8EGSkD9LSYXb",
            "timestamp": "2018-07-03T12:01:28Z",
            "operations_hash": "LLoa7bxRTKaQN2bLYoitYB6bU2DvLnBAqrVjZcvJ364cTcX2PZYKU",
            "fitness": ["00", "0000000000000503"],
            "context": "CoVDyf9y9gHfAkPWofBJffo4X4bWjmehH2LeVonDcCKKzyQYwqdk",
            "priority": 0,
            "signature": "sigbQ5ZNvkjvGssJgoAnUAfY4Wvvg3QZqawBeB1nmx6gTij6kTFvR"
        },
        "metadata": {
            "baker": "tz1Yju7jmmsaUiG9qQLoYv35v5pHgnWoLWbt",
            "consumed_gas": "100",
            "voting_period_kind": "proposal",
            "level": {
                "level": 1407,
                "level_position": 1406,
                "cycle": 0,
                "cycle_position": 1406,
                "voting_period": 0,
                "voting_period_position": 1406,
                "expected_commitment": false
            }
        }
    }"#;

    #[test]
    fn test_decode_block() {
        let block = decode_block(BLOCK_JSON).unwrap();
        assert_eq!(block.level, 1407);
        assert_eq!(
            block.predecessor,
            "BKpbfCvh777DQHnXjU2sqHvVUNZ7dBAdqEfKkdw8EGSkD9LSYXb"
        );
        assert_eq!(block.fitness, "00,0000000000000503");
        assert_eq!(block.timestamp, 1_530_619_288);
        assert_eq!(
            block.baker.as_deref(),
            Some("tz1Yju7jmmsaUiG9qQLoYv35v5pHgnWoLWbt")
        );
        assert_eq!(block.consumed_gas, Some(100));
        assert_eq!(block.meta_cycle, Some(0));
        assert_eq!(block.period_kind.as_deref(), Some("proposal"));
    }

    #[test]
    fn test_decode_block_without_metadata() {
        let mut v: serde_json::Value = serde_json::from_str(BLOCK_JSON).unwrap();
        v.as_object_mut().unwrap().remove("metadata");
        let block = decode_block(&v.to_string()).unwrap();
        assert_eq!(block.baker, None);
        assert_eq!(block.meta_cycle, None);
    }

    #[test]
    fn test_decode_block_bad_timestamp() {
        let mut v: serde_json::Value = serde_json::from_str(BLOCK_JSON).unwrap();
        v["header"]["timestamp"] = serde_json::json!("yesterday");
        assert!(decode_block(&v.to_string()).is_err());
    }
}
