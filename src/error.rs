use crate::model::attendance::EventKind;
use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Failure modes of the attendance core. Every variant maps to exactly one
/// HTTP status; storage failures always mean the whole transaction rolled
/// back, so callers can retry without seeing partial writes.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Already checked {}", .0.to_string().to_lowercase())]
    DuplicateEvent(EventKind),

    #[error("Employee not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl actix_web::ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::DuplicateEvent(_) => StatusCode::BAD_REQUEST,
            AttendanceError::NotFound => StatusCode::NOT_FOUND,
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AttendanceError::Storage(e) = self {
            tracing::error!(error = %e, "storage failure");
            // internal detail stays out of the response body
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn duplicate_event_message_names_the_kind() {
        let err = AttendanceError::DuplicateEvent(EventKind::In);
        assert_eq!(err.to_string(), "Already checked in");
        let err = AttendanceError::DuplicateEvent(EventKind::Out);
        assert_eq!(err.to_string(), "Already checked out");
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            AttendanceError::DuplicateEvent(EventKind::In).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AttendanceError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AttendanceError::Validation("source must not be empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::Storage(sqlx::Error::PoolClosed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
