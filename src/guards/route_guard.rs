// src/guards/route_guard.rs

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::middleware::Next;
use actix_web::{Error, HttpResponse};

use crate::guards::session::session_claims;

pub const DASHBOARD_PATH: &str = "/dashboard";
pub const SIGN_IN_PATH: &str = "/sign-in";

const AUTH_PAGES: [&str; 3] = ["/sign-in", "/sign-up", "/verify"];

/// `path` is `prefix` itself or lies beneath it (`/verify/alice`), but not
/// `/verifyx`.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Where a request to `path` should be sent instead, if anywhere.
///
/// Signed-in users have no business on the auth pages; anonymous users are
/// kept out of the dashboard. Everything else passes.
pub fn redirect_for(path: &str, signed_in: bool) -> Option<&'static str> {
    let is_auth_page = AUTH_PAGES.iter().any(|p| under(path, p));
    if signed_in && is_auth_page {
        return Some(DASHBOARD_PATH);
    }
    if !signed_in && under(path, DASHBOARD_PATH) {
        return Some(SIGN_IN_PATH);
    }
    None
}

/// Applies [`redirect_for`] to every request, checking the session token anew
/// each time.
pub async fn route_guard<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let signed_in = session_claims(req.request()).is_some();

    if let Some(target) = redirect_for(req.path(), signed_in) {
        let response = HttpResponse::Found()
            .insert_header((LOCATION, target))
            .finish();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
