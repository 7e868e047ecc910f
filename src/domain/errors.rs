use thiserror::Error;

/// Shown for any non-2xx `/recommend` response; backend detail is discarded.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";
/// Fallback when a failure carries no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed";
/// Recorded in the QA slot when a question round-trip fails.
pub const QA_FAILURE_MESSAGE: &str = "Failed to fetch answer";

/// Failure of a single advisory-service round-trip.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("server error (HTTP {0})")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    /// The text the recommendation flow surfaces for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status(_) => SERVER_ERROR_MESSAGE.to_string(),
            ApiError::Transport(msg) | ApiError::Decode(msg) => {
                if msg.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    msg.clone()
                }
            }
        }
    }
}

/// Why a device position could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("location permission denied")]
    Denied,
    #[error("geolocation unavailable")]
    Unavailable,
    #[error("geolocation timed out")]
    Timeout,
}

pub type ApiResult<T> = Result<T, ApiError>;
