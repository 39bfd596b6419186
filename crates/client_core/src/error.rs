//! Error kinds surfaced by controller operations.

use std::fmt;

use shared::domain::RecordField;
use thiserror::Error;

use crate::draft::DraftFieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The list call failed at the transport level or the store reported errors.
    FetchFailed,
    /// The update call failed at the transport level or the store reported errors.
    UpdateFailed,
    /// A draft field holds a value that cannot be saved.
    InvalidDraftField,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::FetchFailed => "failed to fetch data",
            ErrorKind::UpdateFailed => "failed to update data",
            ErrorKind::InvalidDraftField => "invalid field value",
        })
    }
}

/// Failure half of every controller result. The message is meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ControllerError {
    kind: ErrorKind,
    message: String,
    field: Option<RecordField>,
}

impl ControllerError {
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::FetchFailed,
            message: message.into(),
            field: None,
        }
    }

    pub fn update_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UpdateFailed,
            message: message.into(),
            field: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The draft field an `InvalidDraftField` error refers to.
    pub fn field(&self) -> Option<RecordField> {
        self.field
    }
}

impl From<DraftFieldError> for ControllerError {
    fn from(value: DraftFieldError) -> Self {
        Self {
            kind: ErrorKind::InvalidDraftField,
            field: Some(value.field()),
            message: value.to_string(),
        }
    }
}

pub type OpResult<T> = Result<T, ControllerError>;
