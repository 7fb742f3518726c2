//! Error taxonomy shared by all route handlers
//!
//! Every failure surfaces exactly once, synchronously, as an envelope
//! with `data: null`. No variant is retried or swallowed; the only
//! logging happens here, at the edge, for the server-side variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::envelope::ApiResponse;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing input, detected before any I/O
    Validation(String),
    /// An identifier failed the format check before touching storage
    InvalidIdentifier(String),
    /// A referenced entity does not exist
    NotFound(String),
    /// Authenticated identity does not own the target
    Forbidden(String),
    /// No valid identity on a request that requires one
    Unauthorized(String),
    /// A uniqueness constraint would be violated
    Conflict(String),
    /// Media store put/delete failed
    Storage(String),
    /// Database failure, or zero-effect result where one row was expected
    Database(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(msg)
            | ApiError::InvalidIdentifier(msg)
            | ApiError::NotFound(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Conflict(msg)
            | ApiError::Storage(msg)
            | ApiError::Database(msg) => write!(f, "{}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body: ApiResponse<serde_json::Value> =
            ApiResponse::new(status, self.to_string(), None);
        body.into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        // A lost uniqueness race (e.g. concurrent registration) is the
        // caller's conflict, not a server fault.
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            return ApiError::Conflict("resource already exists".into());
        }
        ApiError::Database(format!("database error: {}", e))
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e.to_string())
    }
}

/// Ownership gate: the acting identity must equal the stored owner by
/// value. A mismatch is `Forbidden` with the caller's denial message;
/// the check has no side effects, so repeating it rejects identically.
pub fn ensure_owner(
    owner_id: i64,
    actor_id: i64,
    denial: impl Into<String>,
) -> Result<(), ApiError> {
    if owner_id == actor_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(denial.into()))
    }
}

/// Parse a caller-supplied identifier before any query executes.
/// `what` names the identifier in the error message ("videoId" etc).
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::InvalidIdentifier(format!(
            "{} is not a valid identifier",
            what
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidIdentifier("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_parse_id_accepts_positive_integers() {
        assert_eq!(parse_id("42", "videoId").unwrap(), 42);
        assert_eq!(parse_id("  7 ", "videoId").unwrap(), 7);
    }

    #[test]
    fn test_parse_id_rejects_malformed_input() {
        for raw in ["", "abc", "-1", "0", "1.5", "0x10"] {
            assert!(matches!(
                parse_id(raw, "videoId"),
                Err(ApiError::InvalidIdentifier(_))
            ));
        }
    }

    #[test]
    fn test_ensure_owner_accepts_matching_identity() {
        assert!(ensure_owner(7, 7, "nope").is_ok());
    }

    #[test]
    fn test_ensure_owner_rejects_mismatch_repeatedly() {
        // Rejection carries no state; retrying fails the same way.
        for _ in 0..3 {
            match ensure_owner(7, 8, "not the owner of this video") {
                Err(ApiError::Forbidden(msg)) => {
                    assert_eq!(msg, "not the owner of this video");
                }
                other => panic!("expected Forbidden, got {:?}", other),
            }
        }
    }

    #[derive(Debug)]
    struct FakeDbError {
        unique: bool,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let e = sqlx::Error::Database(Box::new(FakeDbError { unique: true }));
        assert!(matches!(ApiError::from(e), ApiError::Conflict(_)));
    }

    #[test]
    fn test_other_database_errors_stay_internal() {
        let e = sqlx::Error::Database(Box::new(FakeDbError { unique: false }));
        assert!(matches!(ApiError::from(e), ApiError::Database(_)));
    }
}
