use crate::dto::ErrorEnvelope;
use std::fmt;

/// Message surfaced when the backend gives nothing more specific.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Classification of a failed API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad request, unauthenticated, timeout or unprocessable (400/401/408/422).
    Client,
    /// Internal server error (500).
    Server,
    /// Transport failure or an unrecognised status.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Client => write!(f, "client"),
            ErrorKind::Server => write!(f, "server"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Maps an HTTP status (or its absence) onto an [`ErrorKind`].
pub fn classify_status(status: Option<u16>) -> ErrorKind {
    match status {
        Some(400) | Some(401) | Some(408) | Some(422) => ErrorKind::Client,
        Some(500) => ErrorKind::Server,
        _ => ErrorKind::Unknown,
    }
}

/// Normalized error raised by every dispatcher call.
///
/// The kind and status are kept alongside the resolved message so callers
/// can branch on them (e.g. send the user back to login on a 401) instead of
/// matching on text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ErrorKind,
    status: Option<u16>,
    message: String,
}

impl ApiError {
    /// Builds the error for a failed HTTP response.
    ///
    /// Client errors read `trace.msg`, server errors read `trace.error`.
    /// Anything unresolvable falls back to [`GENERIC_ERROR_MESSAGE`].
    pub fn from_response(status: u16, body: &str) -> Self {
        let kind = classify_status(Some(status));
        let trace = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.trace);

        let message = match kind {
            ErrorKind::Client => trace.and_then(|t| t.msg),
            ErrorKind::Server => trace.and_then(|t| t.error),
            ErrorKind::Unknown => None,
        }
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

        Self {
            kind,
            status: Some(status),
            message,
        }
    }

    /// Error for a request that never produced a response.
    pub fn transport() -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: None,
            message: GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Error for a 2xx response whose payload could not be understood.
    pub fn invalid_payload() -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: None,
            message: GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the backend rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

impl fmt::Display for ApiError {
    /// Only the resolved message is shown; it is what ends up in alerts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::from_response(status.as_u16(), ""),
            None => ApiError::transport(),
        }
    }
}

/// Errors raised while building the client itself.
#[derive(Debug)]
pub enum ClientError {
    /// The configured base URL could not be parsed or joined.
    InvalidUrl(String),
    /// The underlying HTTP client could not be constructed.
    Http(reqwest::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            ClientError::Http(e) => write!(f, "HTTP client error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            ClientError::InvalidUrl(_) => None,
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}
