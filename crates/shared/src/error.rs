use serde::{Deserialize, Serialize};

/// Machine-readable reason carried by every JSON error the dashboard returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
}

impl ErrorCode {
    /// HTTP status the code is served with.
    pub fn status(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::Validation => 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A boolean query parameter that is neither true nor false.
    pub fn invalid_flag(name: &str, raw: &str) -> Self {
        Self::new(
            ErrorCode::Validation,
            format!("{name} must be true or false, got '{raw}'"),
        )
    }

    pub fn unknown_route(path: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("no such route: {path}"))
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
