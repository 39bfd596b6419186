use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Validation,
    Unauthorized,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Validation => "Validation",
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::Internal => "Internal",
        }
    }
}

/// Application-level failure reported by the store next to (possibly present) data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ErrorDetail {
    pub message: String,
    #[serde(
        rename = "errorType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_type: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: Some(code.as_str().to_string()),
        }
    }

    pub fn untyped(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
        }
    }
}

/// Joins a store's error list into one line of user-visible text.
pub fn summarize(errors: &[ErrorDetail]) -> String {
    errors
        .iter()
        .map(|detail| match &detail.error_type {
            Some(kind) => format!("{kind}: {}", detail.message),
            None => detail.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
