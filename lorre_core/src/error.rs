#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported operation kind: {0}")]
    UnknownOperationKind(String),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] time::error::Parse),
}

impl DecodeError {
    /// Unknown operation kinds are the one decode failure the indexer must
    /// never paper over: dropping them would corrupt the stored chain state.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecodeError::UnknownOperationKind(_))
    }
}
