// src/controllers/auth_controller.rs

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::guards::session::{SessionUser, SESSION_COOKIE};
use crate::models::user::UserView;
use crate::services::auth_service;
use crate::state::AppState;

/// Request structure for the sign-up endpoint.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request structure for the verify-code endpoint.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeForm {
    pub username: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendCodeForm {
    pub username: String,
}

/// Request structure for the sign-in endpoint. `identifier` is a username or an email.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub identifier: String,
    pub password: String,
}

/// POST /sign-up
/// Registers a new user and emails them a verification code. The account is
/// kept even when the email cannot be delivered.
#[post("/sign-up")]
pub async fn sign_up(
    form: web::Json<SignUpForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let registration = auth_service::register(
        data.store.as_ref(),
        data.mailer.as_ref(),
        &data.auth,
        &form.username,
        &form.email,
        &form.password,
        Utc::now(),
    )
    .await?;

    let message = if registration.email_sent {
        "User registered successfully. Please verify your account."
    } else {
        "User registered, but the verification email could not be sent. Please request a new code."
    };
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": message,
    })))
}

/// POST /verify-code
#[post("/verify-code")]
pub async fn verify_code(
    form: web::Json<VerifyCodeForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    auth_service::verify_code(data.store.as_ref(), &form.username, &form.code, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Account verified successfully",
    })))
}

/// POST /resend-code
/// Regenerates the verification code of an unverified account and emails it.
#[post("/resend-code")]
pub async fn resend_code(
    form: web::Json<ResendCodeForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    auth_service::resend_code(
        data.store.as_ref(),
        data.mailer.as_ref(),
        &data.auth,
        &form.username,
        Utc::now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Verification code resent successfully",
    })))
}

/// POST /sign-in
/// Returns a session token in the body and as an HttpOnly cookie.
#[post("/sign-in")]
pub async fn sign_in(
    form: web::Json<SignInForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (user, token) =
        auth_service::authenticate(data.store.as_ref(), &data.auth, &form.identifier, &form.password)
            .await?;

    let cookie = Cookie::build(SESSION_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(data.auth.access_token_ttl.num_seconds()))
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "message": "Signed in successfully",
        "token": token,
        "user": UserView::from(&user),
    })))
}

/// POST /sign-out
#[post("/sign-out")]
pub async fn sign_out() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "message": "Signed out",
    }))
}

/// GET /session
/// The caller's session snapshot, as it was at sign-in.
#[get("/session")]
pub async fn session(user: SessionUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "session": user.0,
    }))
}
