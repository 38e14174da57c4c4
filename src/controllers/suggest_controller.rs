// src/controllers/suggest_controller.rs

use actix_web::{post, web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::services::suggestion_service::{split_suggestions, SuggestError, SUGGESTION_DELIMITER};
use crate::state::AppState;

/// POST /suggest-messages
/// Asks the language model for three prompts. Any request body is ignored.
#[post("/suggest-messages")]
pub async fn suggest_messages(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let raw = data.prompts.generate_prompts().await?;

    let suggestions = split_suggestions(&raw);
    if suggestions.is_empty() {
        return Err(SuggestError::EmptyCompletion.into());
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "suggestions": suggestions.join(SUGGESTION_DELIMITER),
    })))
}
