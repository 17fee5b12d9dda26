use thiserror::Error;

/// Canonical result for core.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    // Table and column mutators never fail; only builders fed external
    // input report this.
    #[error("Malformed input: {0}")]
    Input(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Input(e.to_string())
    }
}
