// src/test_support.rs

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::models::user::UserModel;
use crate::services::auth_service::{self, AuthSettings, Claims};
use crate::services::mail_service::testing::RecordingMailer;
use crate::services::memory_store::MemoryUserStore;
use crate::services::suggestion_service::testing::CannedGenerator;
use crate::services::suggestion_service::PromptGenerator;
use crate::services::user_store::UserStore;
use crate::state::AppState;

pub const PASSWORD: &str = "secret123";

pub fn test_settings() -> AuthSettings {
    AuthSettings {
        secret_key: "test-secret".into(),
        access_token_ttl: Duration::minutes(60),
        verify_code_ttl: Duration::hours(1),
        bcrypt_cost: 4,
    }
}

/// Application state over in-memory collaborators, with handles kept for
/// assertions.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_prompts(Arc::new(CannedGenerator(Some("a||b||c"))))
    }

    pub fn with_prompts(prompts: Arc<dyn PromptGenerator>) -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState {
            store: store.clone(),
            mailer: mailer.clone(),
            prompts,
            auth: test_settings(),
        };
        Self {
            state,
            store,
            mailer,
        }
    }

    /// Inserts a verified user and returns it with a valid session token.
    pub async fn verified_user(&self, username: &str) -> (UserModel, String) {
        let mut user = UserModel::new(
            username.to_string(),
            format!("{username}@example.com"),
            auth_service::get_password_hash(PASSWORD, 4).unwrap(),
            auth_service::generate_verify_code(),
            Utc::now() + Duration::hours(1),
        );
        user.is_verified = true;
        self.store.insert(user.clone()).await.unwrap();

        let token = auth_service::create_access_token(
            Claims::for_user(&user),
            Duration::minutes(5),
            &self.state.auth.secret_key,
        )
        .unwrap();
        (user, token)
    }
}

/// Builds the full application (routes and route guard) around an `AppState`.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .wrap(actix_web::middleware::from_fn(
                    crate::guards::route_guard::route_guard,
                ))
                .configure(crate::routes::init),
        )
    };
}
pub(crate) use test_app;
