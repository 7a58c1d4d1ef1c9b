use std::fmt;
use std::time::Duration;

/// Closed set of failure categories surfaced to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiErrorKind {
    /// Caller-fixable input problem; never retried.
    Validation,
    Timeout,
    Api,
    ServiceUnavailable,
    /// Expected during mode switches; never shown as a failure.
    Cancelled,
    Unknown,
}

impl AiErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AiErrorKind::Validation => "VALIDATION_ERROR",
            AiErrorKind::Timeout => "TIMEOUT_ERROR",
            AiErrorKind::Api => "API_ERROR",
            AiErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            AiErrorKind::Cancelled => "OPERATION_CANCELLED",
            AiErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for AiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure. Built where the failure happens, never parsed back
/// out of a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({code}): {message}")]
pub struct AiError {
    pub kind: AiErrorKind,
    /// Stable machine-readable code, e.g. `EMPTY_PROMPT` or `HTTP_503`.
    pub code: String,
    pub message: String,
    pub retryable: bool,
    /// HTTP status when the failure came from a response.
    pub status: Option<u16>,
}

impl AiError {
    fn new(kind: AiErrorKind, code: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            retryable,
            status: None,
        }
    }

    pub fn validation(code: &str, message: impl Into<String>) -> Self {
        Self::new(AiErrorKind::Validation, code, message, false)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            AiErrorKind::Timeout,
            "TIMEOUT",
            format!("no response within {} ms", after.as_millis()),
            true,
        )
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::new(AiErrorKind::Cancelled, "CANCELLED", reason, false)
    }

    /// Classifies a non-2xx response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let (kind, retryable) = classify_status(status);
        let mut error = Self::new(kind, format!("HTTP_{status}"), message, retryable);
        error.status = Some(status);
        error
    }

    /// Body could not be interpreted as an AI response.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(AiErrorKind::Api, "INVALID_RESPONSE", message, true)
    }

    /// Server answered with `success: false`.
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::new(AiErrorKind::Api, "REQUEST_FAILED", message, true)
    }

    /// The endpoint could not be reached at all.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(AiErrorKind::ServiceUnavailable, "UNREACHABLE", message, true)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(AiErrorKind::Unknown, "UNKNOWN", message, true)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == AiErrorKind::Cancelled
    }
}

/// Maps an HTTP status to an error kind and whether retrying may help.
pub fn classify_status(status: u16) -> (AiErrorKind, bool) {
    match status {
        429 => (AiErrorKind::ServiceUnavailable, true),
        s if s >= 500 => (AiErrorKind::ServiceUnavailable, true),
        408 => (AiErrorKind::Timeout, true),
        _ => (AiErrorKind::Api, false),
    }
}
