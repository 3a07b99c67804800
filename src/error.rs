//! Structured error types for ordering operations and API responses.

use crate::quadrant::Quadrant;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingOwner,
    MissingRequiredField,
    InvalidFieldValue,
    UnsupportedReorder,

    // Not found errors
    TaskNotFound,

    // Write errors
    PartialWrite,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Structured error for ordering operations.
#[derive(Debug, Serialize)]
pub struct OrderError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl OrderError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_owner() -> Self {
        Self::new(ErrorCode::MissingOwner, "An owner id is required")
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn unsupported_reorder(from: Quadrant, to: Quadrant) -> Self {
        Self::new(
            ErrorCode::UnsupportedReorder,
            format!(
                "Cannot reorder between quadrants: {} and {}",
                from, to
            ),
        )
    }

    pub fn partial_write(attempted: usize, failed: &[String]) -> Self {
        Self::new(
            ErrorCode::PartialWrite,
            format!(
                "{} of {} order updates failed",
                failed.len(),
                attempted
            ),
        )
        .with_details(failed.join(", "))
    }

    pub fn order_exhausted(quadrant: Quadrant) -> Self {
        Self::new(
            ErrorCode::InvalidFieldValue,
            format!("No order left at the end of {}", quadrant),
        )
        .with_field("order")
        .with_details("run a repair pass to renumber the quadrant")
    }

    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field("body")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OrderError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for OrderError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<OrderError>() {
            Ok(order_err) => order_err,
            Err(err) => OrderError::internal(err),
        }
    }
}

/// Result type for ordering operations.
pub type OrderResult<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_code_in_screaming_snake_case() {
        let err = OrderError::task_not_found("abc");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "TASK_NOT_FOUND");
        assert_eq!(json["message"], "Task not found: abc");
        assert!(json.get("field").is_none());
    }

    #[test]
    fn partial_write_lists_failed_ids() {
        let err = OrderError::partial_write(4, &["b".to_string(), "d".to_string()]);
        assert_eq!(err.code, ErrorCode::PartialWrite);
        assert_eq!(err.message, "2 of 4 order updates failed");
        assert_eq!(err.details.as_deref(), Some("b, d"));
    }

    #[test]
    fn anyhow_round_trip_keeps_code() {
        let wrapped = anyhow::Error::new(OrderError::missing_owner());
        let back: OrderError = wrapped.into();
        assert_eq!(back.code, ErrorCode::MissingOwner);

        let other: OrderError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(other.code, ErrorCode::InternalError);
    }
}
