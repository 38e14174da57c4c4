// src/state.rs

use std::sync::Arc;

use crate::services::auth_service::AuthSettings;
use crate::services::mail_service::VerificationMailer;
use crate::services::suggestion_service::PromptGenerator;
use crate::services::user_store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub mailer: Arc<dyn VerificationMailer>,
    pub prompts: Arc<dyn PromptGenerator>,
    pub auth: AuthSettings,
}
