//! Portal API client error types.

use serde::Deserialize;

/// Fallback toast text when the server gave no usable message.
pub const NETWORK_ERROR_MESSAGE: &str = "Network Error!";

/// Errors from portal API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The backend returned a non-2xx status.
    #[error("{endpoint} returned {status}: {}", .message.as_deref().unwrap_or(.body))]
    Api {
        endpoint: String,
        status: u16,
        /// Message extracted from the error body, if it had one.
        message: Option<String>,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// A cached or decoded body did not match the expected type.
    #[error("unexpected response shape from {endpoint}: {source}")]
    Shape {
        endpoint: String,
        source: serde_json::Error,
    },
    /// The token was rejected and refreshing it failed.
    #[error("session expired calling {endpoint}; sign in again")]
    SessionExpired { endpoint: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// `{"error": {"code", "message"}}` or `{"message"}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Envelope { error: ErrorDetail },
    Flat { message: String },
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ClientError {
    pub(crate) fn from_response(endpoint: String, status: u16, body: String) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody::Envelope { error }) => Some(error.message),
            Ok(ErrorBody::Flat { message }) => Some(message),
            Err(_) => None,
        }
        .filter(|m| !m.trim().is_empty());
        Self::Api {
            endpoint,
            status,
            message,
            body,
        }
    }

    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The record changed server-side since it was read.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Text for a toast: the server's message, or [`NETWORK_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::SessionExpired { .. } => "Your session has expired. Please sign in again.".into(),
            _ => NETWORK_ERROR_MESSAGE.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_message_extracted() {
        let err = ClientError::from_response(
            "PUT /applications/a1".into(),
            409,
            r#"{"error":{"code":"CONFLICT","message":"application was modified"}}"#.into(),
        );
        assert!(err.is_conflict());
        assert_eq!(err.user_message(), "application was modified");
    }

    #[test]
    fn flat_message_extracted() {
        let err = ClientError::from_response("GET /users".into(), 400, r#"{"message":"bad"}"#.into());
        assert_eq!(err.user_message(), "bad");
    }

    #[test]
    fn unparseable_body_falls_back() {
        let err = ClientError::from_response("GET /users".into(), 502, "<html>".into());
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
        assert!(err.to_string().contains("<html>"));
    }

    #[test]
    fn blank_message_falls_back() {
        let err = ClientError::from_response("GET /users".into(), 500, r#"{"message":" "}"#.into());
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
    }
}
