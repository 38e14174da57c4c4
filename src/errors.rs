// src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::services::mail_service::MailError;
use crate::services::suggestion_service::SuggestError;
use crate::services::user_store::StoreError;

/// Every failure a handler can report. Rendered as `{success: false, message}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("Please verify your account before signing in")]
    NotVerified,

    #[error("Incorrect verification code")]
    InvalidCode,

    #[error("Verification code has expired, please request a new one")]
    Expired,

    #[error("User is not accepting messages")]
    NotAccepting,

    #[error("{0}")]
    BadRequest(String),

    #[error("upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The text shown to clients. Server-side faults collapse to fixed strings.
    fn client_message(&self) -> String {
        match self {
            AppError::UpstreamFailure(_) => "Upstream service failed, please try again later".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotVerified | AppError::NotAccepting => StatusCode::FORBIDDEN,
            AppError::InvalidCode | AppError::Expired | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UpstreamFailure(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.client_message(),
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AppError::Conflict("Username or email is already taken"),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<MailError> for AppError {
    fn from(e: MailError) -> Self {
        AppError::UpstreamFailure(e.to_string())
    }
}

impl From<SuggestError> for AppError {
    fn from(e: SuggestError) -> Self {
        AppError::UpstreamFailure(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {e}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token encoding failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn internal_errors_do_not_leak_detail() {
        let resp = AppError::Internal("connection refused at 10.0.0.3".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Internal server error");
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("User not found").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NotAccepting.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Expired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("taken").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(StoreError::Duplicate).status_code(),
            StatusCode::CONFLICT
        );
    }
}
