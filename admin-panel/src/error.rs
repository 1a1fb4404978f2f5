use serde::{Deserialize, Serialize};

/// The single failure kind the panel knows about: the data couldn't be fetched.
///
/// Network errors, non-success statuses and undecodable bodies all end up here,
/// the message is only kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("fetch failed: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e.to_string())
    }
}
