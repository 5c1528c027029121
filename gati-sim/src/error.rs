//! Error types for gati-sim

use thiserror::Error;

/// gati-sim error type
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Engine error: {0}")]
    Gati(#[from] gati::GatiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for SimError {
    fn from(e: toml::de::Error) -> Self {
        SimError::Config(e.to_string())
    }
}

impl From<gati::ConfigError> for SimError {
    fn from(e: gati::ConfigError) -> Self {
        SimError::Gati(e.into())
    }
}

impl From<gati::LookupError> for SimError {
    fn from(e: gati::LookupError) -> Self {
        SimError::Gati(e.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
