// src/routes/auth_routes.rs

use actix_web::web;
use crate::controllers::auth_controller::{
    resend_code, session, sign_in, sign_out, sign_up, verify_code,
};

/// Registers the sign-up, verification and session endpoints.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(sign_up)
        .service(verify_code)
        .service(resend_code)
        .service(sign_in)
        .service(sign_out)
        .service(session);
}
