// src/controllers/message_controller.rs

use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::guards::session::SessionUser;
use crate::models::message::{MessageModel, MessageView};
use crate::models::user::UserView;
use crate::services::user_store::{AppendOutcome, Page};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMessagesForm {
    pub accept_messages: bool,
}

/// Request structure for the public intake endpoint.
#[derive(Debug, Deserialize)]
pub struct SendMessageForm {
    pub username: String,
    pub content: String,
}

/// Query parameters for GET /get-messages.
#[derive(Debug, Deserialize)]
pub struct GetMessagesQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// GET /accept-messages
/// Reads the flag from the store rather than the session snapshot.
#[get("/accept-messages")]
pub async fn get_accept_messages(
    user: SessionUser,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let found = data
        .store
        .find_by_id(user.id())
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "isAcceptingMessages": found.is_accepting,
    })))
}

/// POST /accept-messages
#[post("/accept-messages")]
pub async fn set_accept_messages(
    user: SessionUser,
    form: web::Json<AcceptMessagesForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let updated = data
        .store
        .set_accepting(user.id(), form.accept_messages)
        .await?
        .ok_or(AppError::NotFound("User not found or failed to update"))?;
    log::info!(
        "User {} set message acceptance to {}",
        updated.username,
        updated.is_accepting
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Message acceptance status updated successfully",
        "updatedUser": UserView::from(&updated),
    })))
}

/// POST /send-message
/// Public. Anyone may drop a message into an accepting user's inbox.
#[post("/send-message")]
pub async fn send_message(
    form: web::Json<SendMessageForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let content = form.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Message content cannot be empty".into()));
    }

    let message = MessageModel::new(content.to_string(), Utc::now());
    match data.store.append_message(form.username.trim(), message).await? {
        AppendOutcome::Appended => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Message sent successfully",
        }))),
        AppendOutcome::NotAccepting => Err(AppError::NotAccepting),
        AppendOutcome::UserNotFound => Err(AppError::NotFound("User not found")),
    }
}

/// GET /get-messages
/// The caller's messages in arrival order, one page at a time.
#[get("/get-messages")]
pub async fn get_messages(
    user: SessionUser,
    query: web::Query<GetMessagesQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let page = Page::new(query.offset, query.limit);
    let messages: Vec<MessageView> = data
        .store
        .messages(user.id(), page)
        .await?
        .ok_or(AppError::NotFound("User not found"))?
        .into_iter()
        .map(MessageView::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "messages": messages,
        "offset": page.offset,
        "limit": page.limit,
    })))
}

/// DELETE /delete-message/{id}
/// Only ever touches the caller's own inbox. Deleting an id that is not there
/// is not an error.
#[delete("/delete-message/{id}")]
pub async fn delete_message(
    user: SessionUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let message_id = path.into_inner();
    let removed = data.store.remove_message(user.id(), &message_id).await?;

    let message = if removed {
        "Message deleted"
    } else {
        "Message not found or already deleted"
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
    })))
}
