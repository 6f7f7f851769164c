use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in - a session is required for this call")]
    MissingSession,

    #[error("Stored token cannot be sent as an Authorization header")]
    InvalidToken,

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error bodies the backend sends look like `{ "message": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Prefer the server's `message` field, fall back to the raw body.
    fn server_message(body: &str) -> String {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        Self::truncate_body(message.as_deref().unwrap_or(body))
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::ServerError(message),
            code => ApiError::Rejected { status: code, message },
        }
    }

    /// Classify a transport failure, pulling timeouts out of the generic case.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }

    /// HTTP status of a server rejection, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for 401/403, the responses a stale or revoked token produces.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::AccessDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no"),
            ApiError::AccessDenied(m) if m == "no"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "down"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad"),
            ApiError::Rejected { status: 422, .. }
        ));
    }

    #[test]
    fn test_server_message_is_preserved() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Menu not available","statusCode":400}"#,
        );
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Menu not available");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "é".repeat(400);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let ApiError::ServerError(message) = err else {
            panic!("expected server error");
        };
        assert!(message.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(ApiError::Unauthorized.is_auth_failure());
        assert!(ApiError::AccessDenied(String::new()).is_auth_failure());
        assert!(!ApiError::MissingSession.is_auth_failure());
        assert!(!ApiError::NotFound(String::new()).is_auth_failure());
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert_eq!(ApiError::Timeout.status(), None);
    }
}
