//! Error taxonomy for the forecast core.
//!
//! Every fallible operation in the crate returns [`ForecastError`]. Use
//! [`crate::notification::user_message`] to turn one into UI text.

use thiserror::Error;

use crate::config::MISSING_API_KEY;

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    /// Bad or missing user input; raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// The request was sent but no response came back.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status.
    #[error("provider returned status {status}")]
    Api { status: u16, message: Option<String> },

    /// Missing credential or unusable configuration.
    #[error("{0}")]
    Configuration(String),

    /// Read/write failure at the storage boundary.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("{0}")]
    Message(String),

    #[error("unknown error")]
    Unknown,
}

impl ForecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ForecastError::Validation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        ForecastError::Persistence(msg.into())
    }

    pub fn api(status: u16, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty());
        ForecastError::Api { status, message }
    }

    /// The credential is absent or blank.
    pub fn missing_api_key() -> Self {
        ForecastError::Configuration(MISSING_API_KEY.to_string())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ForecastError::Transport(_))
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ForecastError::api(status.as_u16(), None);
        }

        if err.is_decode() {
            return ForecastError::Message(format!("Failed to parse provider response: {err}"));
        }

        // No response was received: connect failures, timeouts, aborted sends.
        ForecastError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_drops_blank_message() {
        let err = ForecastError::api(500, Some("   ".into()));
        assert_eq!(err, ForecastError::Api { status: 500, message: None });
    }

    #[test]
    fn api_keeps_message() {
        let err = ForecastError::api(404, Some("city not found".into()));
        assert_eq!(
            err,
            ForecastError::Api { status: 404, message: Some("city not found".into()) }
        );
    }

    #[test]
    fn io_error_becomes_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::Persistence(msg) if msg.contains("denied")));
    }

    #[test]
    fn missing_api_key_is_configuration() {
        let err = ForecastError::missing_api_key();
        assert!(matches!(err, ForecastError::Configuration(_)));
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn validation_displays_plain_message() {
        let err = ForecastError::validation("Please enter a city name.");
        assert_eq!(err.to_string(), "Please enter a city name.");
    }
}
