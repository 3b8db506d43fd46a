use std::path::PathBuf;
use thiserror::Error;

/// Failures while assembling an `EngineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {var}: expected milliseconds")]
    Env { var: &'static str, value: String },
}
