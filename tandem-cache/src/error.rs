use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The default key function could not serialize the arguments.
    #[error("failed to serialize cache key: {0}")]
    Key(#[from] serde_json::Error),

    /// A custom key function rejected the arguments.
    #[error("cache key rejected: {0}")]
    Rejected(String),
}
