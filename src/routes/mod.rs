use actix_web::web;

use crate::errors::AppError;

mod auth_routes; // Sign-up, verification and sessions
mod message_routes; // Inbox and suggestions

pub fn init(cfg: &mut web::ServiceConfig) {
    // Malformed bodies get the same `{success, message}` shape as every other failure.
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());
    let path_config = web::PathConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());

    cfg.service(
        web::scope("/api")
            .app_data(json_config)
            .app_data(query_config)
            .app_data(path_config)
            .configure(auth_routes::init)
            .configure(message_routes::init),
    );
}
