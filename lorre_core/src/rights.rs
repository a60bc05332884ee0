use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{is_empty_body, DecodeError};

#[derive(Debug, Clone, Deserialize)]
pub struct BakingRight {
    pub level: i64,
    pub delegate: String,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndorsingRight {
    pub level: i64,
    pub delegate: String,
    #[serde(default)]
    pub slots: Vec<i64>,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

impl BakingRight {
    #[must_use]
    pub fn estimated_unix(&self) -> Option<i64> {
        parse_estimate(self.estimated_time.as_deref())
    }
}

impl EndorsingRight {
    #[must_use]
    pub fn estimated_unix(&self) -> Option<i64> {
        parse_estimate(self.estimated_time.as_deref())
    }
}

fn parse_estimate(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|v| OffsetDateTime::parse(v, &Rfc3339).ok())
        .map(OffsetDateTime::unix_timestamp)
}

/// Rights endpoints answer an empty string on some protocol versions; that
/// decodes to no rights rather than an error.
pub fn decode_baking_rights(body: &str) -> Result<Vec<BakingRight>, DecodeError> {
    if is_empty_body(body) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}

pub fn decode_endorsing_rights(body: &str) -> Result<Vec<EndorsingRight>, DecodeError> {
    if is_empty_body(body) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_baking_rights() {
        let body = r#"[
            {"level": 1407, "delegate": "tz1Yju7jmmsaUiG9qQLoYv35v5pHgnWoLWbt", "priority": 0,
             "estimated_time": "2018-07-03T12:01:28Z"},
            {"level": 1407, "delegate": "tz1hoKtAhPf5PYHkGfPfGTPtV9pK31B1nCVC", "priority": 1}
        ]"#;
        let rights = decode_baking_rights(body).unwrap();
        assert_eq!(rights.len(), 2);
        assert_eq!(rights[0].priority, Some(0));
        assert_eq!(rights[0].estimated_unix(), Some(1_530_619_288));
        assert_eq!(rights[1].estimated_unix(), None);
    }

    #[test]
    fn test_decode_endorsing_rights_slots() {
        let body = r#"[{"level": 1406, "delegate": "tz1Yju7jmmsaUiG9qQLoYv35v5pHgnWoLWbt", "slots": [30, 21, 3]}]"#;
        let rights = decode_endorsing_rights(body).unwrap();
        assert_eq!(rights[0].slots, vec![30, 21, 3]);
    }

    #[test]
    fn test_empty_bodies_are_no_rights() {
        assert!(decode_baking_rights("").unwrap().is_empty());
        assert!(decode_endorsing_rights("null").unwrap().is_empty());
        assert!(decode_endorsing_rights("\"\"").unwrap().is_empty());
    }
}
