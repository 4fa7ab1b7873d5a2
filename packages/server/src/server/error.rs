//! HTTP mapping for `AppError`.
//!
//! Every failure goes out as `{ "error": code, "message": text, "fields": [...] }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::common::{AppError, AuthError, FieldError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl AppError {
    /// Status code and machine-readable error code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Auth(AuthError::AuthenticationRequired) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AppError::Auth(AuthError::PermissionDenied(_)) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Auth(AuthError::CampaignNotFound) | AppError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            AppError::Auth(AuthError::DatabaseError(_) | AuthError::InternalError(_))
            | AppError::Database(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Rejected { code, .. } => (StatusCode::BAD_REQUEST, *code),
            AppError::Conflict { code, .. } => (StatusCode::CONFLICT, *code),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            "Something went wrong".to_string()
        } else {
            self.to_string()
        };

        let fields = match self {
            AppError::Validation(fields) => fields,
            _ => Vec::new(),
        };

        let body = ErrorBody {
            error: code,
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        let cases = [
            (AppError::Auth(AuthError::AuthenticationRequired), StatusCode::UNAUTHORIZED),
            (AppError::Auth(AuthError::PermissionDenied("no".into())), StatusCode::FORBIDDEN),
            (AppError::Auth(AuthError::CampaignNotFound), StatusCode::NOT_FOUND),
            (AppError::NotFound("Claim"), StatusCode::NOT_FOUND),
            (AppError::invalid("email", "is required"), StatusCode::BAD_REQUEST),
            (AppError::rejected("invalid_invite_code", "nope"), StatusCode::BAD_REQUEST),
            (AppError::conflict("campaign_full", "full"), StatusCode::CONFLICT),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_and_code().0, status);
        }
    }

    #[test]
    fn conflicts_carry_their_code() {
        let err = AppError::conflict("already_claimed", "dup");
        assert_eq!(err.status_and_code().1, "already_claimed");
    }

    #[test]
    fn internal_details_stay_out_of_the_response() {
        let response = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
