//! Config loading/validation errors. Fatal before tick 1 (§7a).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for worldhist_core::EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
