use serde::Deserialize;
use thiserror::Error;

/// One message per field the store rejected, as reported inside a batch result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldIssue {
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum FlowCrmError {
    #[error("Transport error: {0}")]
    Transport(Box<reqwest::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record {id} not found in {table}")]
    NotFound { table: String, id: i64 },

    #[error("{message}")]
    Validation { message: String, errors: Vec<FieldIssue> },

    #[error("{failed} of {total} records failed: {message}")]
    PartialBatch { failed: usize, total: usize, message: String },

    #[error("FlowCrmError: {0}")]
    Custom(String),
}

impl FlowCrmError {
    pub fn validation(message: impl Into<String>) -> Self {
        FlowCrmError::Validation { message: message.into(), errors: Vec::new() }
    }
}

impl From<reqwest::Error> for FlowCrmError {
    fn from(error: reqwest::Error) -> Self {
        FlowCrmError::Transport(Box::new(error))
    }
}
