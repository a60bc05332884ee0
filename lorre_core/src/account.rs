use serde::Deserialize;
use serde_json::Value;

use crate::{json::string_to_i64, DecodeError};

#[derive(Debug, Clone, Deserialize)]
struct RawAccount {
    #[serde(default)]
    manager: Option<String>,
    #[serde(default, deserialize_with = "string_to_i64")]
    balance: Option<i64>,
    #[serde(default)]
    spendable: Option<bool>,
    #[serde(default)]
    delegate: Option<RawAccountDelegate>,
    #[serde(default, deserialize_with = "string_to_i64")]
    counter: Option<i64>,
    #[serde(default)]
    script: Option<RawScript>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAccountDelegate {
    #[serde(default)]
    setable: Option<bool>,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawScript {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    storage: Option<Value>,
}

/// State of one contract as read at a specific block.
#[derive(Debug, Clone, Default)]
pub struct Account {
    pub manager: Option<String>,
    pub balance: i64,
    pub spendable: Option<bool>,
    pub delegate_setable: Option<bool>,
    pub delegate_value: Option<String>,
    pub counter: Option<i64>,
    pub script: Option<String>,
    pub storage: Option<String>,
}

pub fn decode_account(body: &str) -> Result<Account, DecodeError> {
    let raw: RawAccount = serde_json::from_str(body)?;
    Ok(Account {
        manager: raw.manager,
        balance: raw.balance.unwrap_or(0),
        spendable: raw.spendable,
        delegate_setable: raw.delegate.as_ref().and_then(|d| d.setable),
        delegate_value: raw.delegate.and_then(|d| d.value),
        counter: raw.counter,
        script: raw
            .script
            .as_ref()
            .and_then(|s| s.code.as_ref())
            .map(ToString::to_string),
        storage: raw
            .script
            .and_then(|s| s.storage)
            .map(|s| s.to_string()),
    })
}
