use thiserror::Error;

/// Everything that can go wrong while configuring a cache or feeding it a trace
///
/// Configuration errors are fatal to the run they belong to only, a sweep carries on with the
/// remaining configurations
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown replacement policy: {0:?}")]
    UnknownPolicy(String),

    #[error("Malformed trace record {record} at token {token:?}: {reason}")]
    MalformedTraceRecord {
        record: usize,
        token: String,
        reason: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CacheError::InvalidConfiguration(message.into())
    }
}
