use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ApiError: everything that can go wrong on a single API call
// ---------------------------------------------------------------------------

/// The four ways a call to the verification API can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request never reached the API (refused, timed out, TLS failure).
    Network,
    /// The API answered but the body was not valid JSON.
    Decode,
    /// The API answered with a non-200 status.
    HttpStatus,
    /// The API answered 200 but the envelope reported `success: false`.
    Application,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Decode => "decode",
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::Application => "application",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid JSON response: {0}")]
    Decode(String),

    #[error("{message}")]
    HttpStatus {
        status: u16,
        message: String,
        code: Option<String>,
        retry_after_seconds: Option<u64>,
    },

    #[error("API Error [{code}]: {message}")]
    Application { code: String, message: String },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ApiError::Application { .. } => ErrorKind::Application,
        }
    }

    /// Human-readable message, suitable for direct display.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Remote error code, when the API supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::HttpStatus { code, .. } => code.as_deref(),
            ApiError::Application { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Only set for HTTP 429.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            ApiError::HttpStatus {
                retry_after_seconds,
                ..
            } => *retry_after_seconds,
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl Serialize for ApiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ApiError", 5)?;
        s.serialize_field("kind", &self.kind())?;
        s.serialize_field("message", &self.message())?;
        s.serialize_field("code", &self.code())?;
        s.serialize_field("status", &self.status())?;
        s.serialize_field("retry_after_seconds", &self.retry_after_seconds())?;
        s.end()
    }
}

// ---------------------------------------------------------------------------
// XcheckError: crate-level failures outside the per-call taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum XcheckError {
    #[error("invalid action kind: {0}")]
    InvalidActionKind(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("transport setup failed: {0}")]
    TransportSetup(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, XcheckError>;
