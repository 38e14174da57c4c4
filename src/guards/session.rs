// src/guards/session.rs

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::errors::AppError;
use crate::services::auth_service::{self, Claims};
use crate::state::AppState;

/// Name of the cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "session_token";

/// Extracts the raw session token from `Authorization: Bearer ...` or, failing
/// that, from the session cookie.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
}

/// Decodes and validates the request's session token, if any.
pub fn session_claims(req: &HttpRequest) -> Option<Claims> {
    let state = req.app_data::<web::Data<AppState>>()?;
    let token = session_token(req)?;
    auth_service::verify_jwt_token(&token, &state.auth.secret_key).ok()
}

/// The signed-in caller, as captured in their session token at sign-in.
/// Handlers taking this argument reject anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct SessionUser(pub Claims);

impl SessionUser {
    pub fn id(&self) -> &str {
        &self.0.sub
    }
}

impl FromRequest for SessionUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            session_claims(req)
                .map(SessionUser)
                .ok_or(AppError::Unauthenticated),
        )
    }
}
