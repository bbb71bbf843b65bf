/// Error types for the Trash Mboa API client
///
/// This module groups every error the client can return:
/// 1. Domain-specific error types (network, storage, validation, refresh, routing)
/// 2. The unified `ApiError` returned by every client operation
/// 3. Translation of errors into user-facing messages and categories
/// 4. Structured error logging with context

use reqwest::StatusCode;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Transport-level failures: the backend could not be reached or did not answer in time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,
    #[error("could not connect to the server: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Connect(err.to_string())
        } else {
            NetworkError::Other(err.to_string())
        }
    }
}

/// Token persistence failures
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("token storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("token storage is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}

/// Client-side input validation failures, raised before any request is sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
}

/// Failures of the refresh-token exchange.
///
/// Every caller waiting on a refresh receives the same value, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("no refresh token is stored")]
    MissingRefreshToken,
    #[error("refresh rejected with status {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error("refresh request failed: {0}")]
    Network(NetworkError),
    #[error("refresh response could not be decoded: {0}")]
    Malformed(String),
    #[error("session tokens could not be updated: {0}")]
    Storage(String),
    #[error("refresh was interrupted before completing")]
    Interrupted,
}

/// Directions service failures
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("directions request failed: {0}")]
    Network(#[from] NetworkError),
    #[error("directions service returned {status}")]
    Status { status: StatusCode, body: String },
    #[error("directions response could not be decoded: {0}")]
    Decode(String),
    #[error("no route found between the given points")]
    NoRoute,
}

// ============================================================================
// 2. UNIFIED CLIENT ERROR TYPE
// ============================================================================

/// Central error type returned by every client operation
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-success status that the client does not recover from.
    #[error("backend returned {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
        body: Vec<u8>,
    },
    /// The session could not be refreshed and has been torn down.
    #[error("session expired: {0}")]
    SessionExpired(#[from] RefreshError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message reported by the backend in its `{ "message": ... }` error body, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            ApiError::SessionExpired(RefreshError::Rejected { message, .. }) => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired(_))
    }
}

// ============================================================================
// 3. USER-FACING TRANSLATION
// ============================================================================

/// Coarse error classification used to pick how an error is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    Validation,
    Network,
    Server,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Status { status, .. } => match status.as_u16() {
                401 | 403 => ErrorCategory::Auth,
                400 | 422 => ErrorCategory::Validation,
                _ => ErrorCategory::Server,
            },
            ApiError::SessionExpired(RefreshError::Network(_)) => ErrorCategory::Network,
            ApiError::SessionExpired(_) => ErrorCategory::Auth,
            ApiError::Network(_) | ApiError::Routing(RoutingError::Network(_)) => {
                ErrorCategory::Network
            }
            ApiError::Validation(_) => ErrorCategory::Validation,
            _ => ErrorCategory::Server,
        }
    }

    /// Sentence suitable for showing to the end user
    pub fn user_message(&self) -> String {
        if let ApiError::SessionExpired(_) = self {
            return SESSION_EXPIRED_MESSAGE.to_string();
        }

        if let Some(message) = self.backend_message() {
            return translate_backend_message(message);
        }

        match self {
            ApiError::Status { status, .. } => match status.as_u16() {
                400 => "The submitted data is incorrect. Please check your information.",
                401 => "Incorrect email or password. Please try again.",
                403 => "You do not have permission to perform this action.",
                404 => "The requested resource does not exist.",
                409 => "This email address is already in use.",
                422 => "The provided data is not valid.",
                429 => "Too many attempts. Please wait before trying again.",
                500 => "Server error. Please try again later.",
                _ => GENERIC_MESSAGE,
            }
            .to_string(),
            ApiError::Network(NetworkError::Timeout) => {
                "The request took too long. Please try again.".to_string()
            }
            ApiError::Network(_) | ApiError::Routing(RoutingError::Network(_)) => {
                "Unable to reach the server. Check your internet connection.".to_string()
            }
            ApiError::Validation(e) => format!("Invalid input: {}.", e),
            ApiError::Routing(RoutingError::NoRoute) => {
                "No route could be found to this location.".to_string()
            }
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    /// Log the error once, at a level matching its category
    pub fn log_error(&self, operation: &str) {
        match self.category() {
            ErrorCategory::Validation => {
                tracing::warn!(operation = operation, error = %self, "Validation error");
            }
            ErrorCategory::Auth => {
                tracing::warn!(operation = operation, error = %self, "Authentication error");
            }
            ErrorCategory::Network => {
                tracing::error!(operation = operation, error = %self, "Network error");
            }
            ErrorCategory::Server => {
                tracing::error!(operation = operation, error = %self, "Request failed");
            }
        }
    }
}

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Known backend messages mapped to friendlier wording; unknown messages pass through.
fn translate_backend_message(message: &str) -> String {
    let translated = match message {
        "Invalid credentials" => "Incorrect email or password. Please check your credentials.",
        "User not found" => "No account found with this email.",
        "User already exists" => "An account already exists with this email address.",
        "Password is required" => "Password is required.",
        "Email is required" => "Email address is required.",
        "Email must be valid" | "Invalid email format" => "Please enter a valid email address.",
        "Password must be at least 6 characters" => {
            "The password must contain at least 6 characters."
        }
        "Name is required" => "Name is required.",
        "Validation failed" => "The provided data is not valid.",
        "Password too short" => "The password is too short.",
        "Password too weak" => "The password is too weak.",
        "Internal server error" => "Internal server error. Please try again later.",
        "Service unavailable" => "Service temporarily unavailable.",
        "Request timeout" => "The request took too long.",
        other => other,
    };
    translated.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(code: u16, message: Option<&str>) -> ApiError {
        ApiError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            message: message.map(str::to_string),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email");
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_status_categories() {
        assert_eq!(status_error(401, None).category(), ErrorCategory::Auth);
        assert_eq!(status_error(403, None).category(), ErrorCategory::Auth);
        assert_eq!(status_error(422, None).category(), ErrorCategory::Validation);
        assert_eq!(status_error(500, None).category(), ErrorCategory::Server);
        assert_eq!(status_error(404, None).category(), ErrorCategory::Server);
    }

    #[test]
    fn test_refresh_network_failure_is_network_category() {
        let err = ApiError::SessionExpired(RefreshError::Network(NetworkError::Timeout));
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_session_expired());
        assert_eq!(err.user_message(), SESSION_EXPIRED_MESSAGE);
    }

    #[test]
    fn test_backend_message_takes_precedence() {
        let err = status_error(401, Some("Invalid credentials"));
        assert_eq!(
            err.user_message(),
            "Incorrect email or password. Please check your credentials."
        );

        let unknown = status_error(400, Some("Quantité invalide"));
        assert_eq!(unknown.user_message(), "Quantité invalide");
    }

    #[test]
    fn test_status_fallback_messages() {
        assert_eq!(
            status_error(429, None).user_message(),
            "Too many attempts. Please wait before trying again."
        );
        assert_eq!(status_error(418, None).user_message(), GENERIC_MESSAGE);
    }

    #[test]
    fn test_network_messages() {
        let timeout = ApiError::Network(NetworkError::Timeout);
        assert_eq!(
            timeout.user_message(),
            "The request took too long. Please try again."
        );
        let refused = ApiError::Network(NetworkError::Connect("refused".to_string()));
        assert_eq!(refused.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_local_failures_fall_back_to_generic_message() {
        let storage = ApiError::from(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )));
        let json = ApiError::from(serde_json::from_str::<u8>("oops").unwrap_err());

        for err in [storage, json] {
            assert_eq!(err.category(), ErrorCategory::Server);
            assert_eq!(err.user_message(), GENERIC_MESSAGE);
            assert!(!err.is_session_expired());
        }
    }
}
