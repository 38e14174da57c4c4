// src/routes/message_routes.rs

use actix_web::web;
use crate::controllers::message_controller::{
    delete_message, get_accept_messages, get_messages, send_message, set_accept_messages,
};
use crate::controllers::suggest_controller::suggest_messages;

/// Registers the inbox endpoints and the prompt-suggestion proxy.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(get_accept_messages)
        .service(set_accept_messages)
        .service(send_message)
        .service(get_messages)
        .service(delete_message)
        .service(suggest_messages);
}
