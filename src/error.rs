// src/error.rs
//! Error taxonomy for backend calls and stage control

use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Backend answered with a non-success status. `detail` is the
    /// server-provided message and is displayed verbatim.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Error connecting to backend: {0}")]
    Transport(String),

    #[error("Unexpected response from backend: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failure of a stage-control operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Input or prerequisite missing; no request was sent.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
