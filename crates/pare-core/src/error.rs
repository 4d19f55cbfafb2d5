//! Error types for Pare

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error came from talking to the backend
    ///
    /// Network errors put the planner into its error state and can be retried.
    /// Everything else is a local problem that retrying will not fix.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Api { .. })
    }

    /// Message suitable for showing next to a "try again" action
    pub fn user_message(&self) -> String {
        match self {
            Error::Http(e) if e.is_timeout() => "The request timed out".to_string(),
            Error::Http(e) if e.is_connect() => "Could not reach the finance service".to_string(),
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_is_network() {
        let err = Error::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(err.is_network());
        assert_eq!(err.user_message(), "boom");
        assert_eq!(err.to_string(), "API error (500): boom");
    }

    #[test]
    fn test_invalid_input_is_not_network() {
        let err = Error::InvalidInput("abc".into());
        assert!(!err.is_network());
        assert_eq!(err.user_message(), "Invalid input: abc");
    }
}
