use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure category of a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network / client-level failure (DNS, connection reset, broken stream).
    Transport,
    /// Non-200 HTTP status with a provider-supplied body.
    ApiError,
    /// 200 status but the body is not a response envelope at all.
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport error",
            ErrorKind::ApiError => "API error",
            ErrorKind::MalformedResponse => "malformed response",
        };
        f.write_str(s)
    }
}

/// Terminal error of one generation call, carried inside `GenerationResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
}

impl ErrorInfo {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn api(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ApiError,
            message: body.into(),
            status_code: Some(status_code),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedResponse,
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} ({}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ErrorInfo {}

/// Unknown strategy token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy '{0}' (expected 'library' or 'rest')")]
pub struct ParseStrategyError(pub String);
