use serde_json::Value;

/// Older protocol versions spell the origination manager key `managerPubkey`;
/// later ones use `manager_pubkey`. Rename the legacy spelling everywhere so a
/// single decoder shape covers both.
#[must_use]
pub fn normalize_manager_pubkey(mut value: Value) -> Value {
    rename_keys(&mut value);
    value
}

fn rename_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.remove("managerPubkey") {
                map.insert("manager_pubkey".to_string(), v);
            }
            for v in map.values_mut() {
                rename_keys(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                rename_keys(v);
            }
        }
        _ => {}
    }
}

/// Some node versions answer votes/rights queries with an empty string or a
/// bare `null` instead of an empty list.
#[must_use]
pub fn is_empty_body(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.is_empty() || trimmed == "null" || trimmed == "\"\""
}

/// Mutez amounts and counters arrive as JSON strings; gas occasionally as a
/// plain number.
pub(crate) fn string_to_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_i64()),
        Some(Value::String(s)) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected numeric string, got {other}"
        ))),
    }
}
