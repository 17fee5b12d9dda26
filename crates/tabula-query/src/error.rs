use tabula_modifiers::{ConditionError, ModifierError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("modifier: {0}")]
    Modifier(#[from] ModifierError),

    #[error("invalid filter: {0}")]
    Condition(#[from] ConditionError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("query state: {0}")]
    State(String),
}

impl From<tabula_core::Error> for QueryError {
    fn from(e: tabula_core::Error) -> Self {
        QueryError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        QueryError::State(e.to_string())
    }
}

impl From<serde_yaml::Error> for QueryError {
    fn from(e: serde_yaml::Error) -> Self {
        QueryError::State(e.to_string())
    }
}
