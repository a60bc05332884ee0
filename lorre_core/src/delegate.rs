use serde::Deserialize;

use crate::{json::string_to_i64, DecodeError};

/// State of one delegate (baker) as read at a specific block.
#[derive(Debug, Clone, Deserialize)]
pub struct Delegate {
    #[serde(default, deserialize_with = "string_to_i64")]
    pub balance: Option<i64>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub frozen_balance: Option<i64>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub staking_balance: Option<i64>,
    #[serde(default, deserialize_with = "string_to_i64")]
    pub delegated_balance: Option<i64>,
    #[serde(default)]
    pub deactivated: Option<bool>,
    #[serde(default)]
    pub grace_period: Option<i64>,
}

pub fn decode_delegate(body: &str) -> Result<Delegate, DecodeError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_delegate() {
        let body = r#"{
            "balance": "5976016305",
            "frozen_balance": "2321368219",
            "staking_balance": "5902081315",
            "delegated_balance": "1061207",
            "deactivated": false,
            "grace_period": 146
        }"#;
        let delegate = decode_delegate(body).unwrap();
        assert_eq!(delegate.balance, Some(5_976_016_305));
        assert_eq!(delegate.frozen_balance, Some(2_321_368_219));
        assert_eq!(delegate.deactivated, Some(false));
        assert_eq!(delegate.grace_period, Some(146));
    }

    #[test]
    fn test_decode_delegate_partial() {
        let delegate = decode_delegate(r#"{"balance": "1"}"#).unwrap();
        assert_eq!(delegate.balance, Some(1));
        assert_eq!(delegate.staking_balance, None);
    }
}
