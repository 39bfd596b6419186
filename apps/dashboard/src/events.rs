//! Turns controller failures into short text for the terminal.

use client_core::{ControllerError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

pub fn categorize(message: &str) -> FailureCategory {
    let lower = message.to_ascii_lowercase();
    // Status codes alone are not enough: ids and counts can contain "401".
    if lower.contains("unauthorized") || lower.contains("forbidden") {
        FailureCategory::Auth
    } else if lower.contains("invalid")
        || lower.contains("validation")
        || lower.contains("must be")
        || lower.contains("not found")
    {
        FailureCategory::Validation
    } else if lower.contains("connect")
        || lower.contains("connection")
        || lower.contains("dns")
        || lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("unreachable")
    {
        FailureCategory::Transport
    } else {
        FailureCategory::Unknown
    }
}

/// User-facing line for a failed operation.
pub fn describe_failure(error: &ControllerError) -> String {
    let action = match error.kind() {
        ErrorKind::FetchFailed => "Failed to fetch data",
        ErrorKind::UpdateFailed => "Failed to update data",
        ErrorKind::InvalidDraftField => {
            return match error.field() {
                Some(field) => format!("{}: {}", field.label(), error.message()),
                None => error.message().to_string(),
            };
        }
    };
    match categorize(error.message()) {
        FailureCategory::Transport => format!(
            "{action}: store unreachable; check the store URL/network and retry. ({})",
            error.message()
        ),
        FailureCategory::Auth => format!(
            "{action}: the store rejected the request as unauthorized. ({})",
            error.message()
        ),
        FailureCategory::Validation | FailureCategory::Unknown => {
            format!("{action}: {}", error.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{DraftFieldError, EditDraft};
    use shared::domain::{RecordField, SensorRecord};

    #[test]
    fn classifies_common_store_failures() {
        assert_eq!(
            categorize("list request to http://x failed: error trying to connect"),
            FailureCategory::Transport
        );
        assert_eq!(
            categorize("HTTP status client error (401 Unauthorized)"),
            FailureCategory::Auth
        );
        assert_eq!(
            categorize("NotFound: record 9 not found"),
            FailureCategory::Validation
        );
        assert_eq!(
            categorize("NotFound: record 401 not found"),
            FailureCategory::Validation
        );
        assert_eq!(
            categorize("HTTP status client error (403 Forbidden)"),
            FailureCategory::Auth
        );
        assert_eq!(categorize("something odd"), FailureCategory::Unknown);
    }

    #[test]
    fn fetch_failures_get_a_retry_hint() {
        let error = ControllerError::fetch_failed("connection refused");
        let text = describe_failure(&error);
        assert!(text.starts_with("Failed to fetch data"));
        assert!(text.contains("retry"));
    }

    #[test]
    fn invalid_fields_name_the_column() {
        let mut draft = EditDraft::seed(&SensorRecord::new(1));
        let err: DraftFieldError = draft
            .set_field(RecordField::Temperature, "warm")
            .expect_err("invalid");
        let text = describe_failure(&ControllerError::from(err));
        assert_eq!(text, "Temperature: temperature must be a number, got 'warm'");
    }
}
