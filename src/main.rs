use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

mod config;
mod controllers;
mod db;
mod errors;
mod guards;
mod models;
mod routes;
mod services;
mod state;
#[cfg(test)]
mod test_support;

use config::{Config, EmailProvider, LlmProvider, StoreBackend};
use services::auth_service::AuthSettings;
use services::mail_service::{ResendMailer, SmtpMailer, VerificationMailer};
use services::memory_store::MemoryUserStore;
use services::mongo_store::MongoUserStore;
use services::suggestion_service::{ChatCompletionsGenerator, GeminiGenerator, PromptGenerator};
use services::user_store::UserStore;

async fn build_store(config: &Config) -> Arc<dyn UserStore> {
    match config.store_backend {
        StoreBackend::Mongo => {
            let db_client = db::init_db(&config.mongo_uri)
                .await
                .expect("Failed to connect to MongoDB");

            let db = db_client.database(&config.mongo_db_name);
            let users_collection = db.collection::<models::user::UserModel>("users");
            db::ensure_indexes(&users_collection)
                .await
                .expect("Failed to create user indexes");
            Arc::new(MongoUserStore::new(users_collection))
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    }
}

fn build_mailer(config: &Config, client: reqwest::Client) -> Arc<dyn VerificationMailer> {
    match config.email_provider {
        EmailProvider::Resend => Arc::new(ResendMailer::new(
            client,
            config.resend_api_key.clone(),
            config.email_from.clone(),
        )),
        EmailProvider::Smtp => Arc::new(SmtpMailer::new(
            config.smtp_server.clone(),
            config.smtp_port,
            config.smtp_username.clone(),
            config.smtp_password.clone(),
            config.email_from.clone(),
        )),
    }
}

fn build_prompts(config: &Config, client: reqwest::Client) -> Arc<dyn PromptGenerator> {
    match config.llm_provider {
        LlmProvider::OpenAi => Arc::new(ChatCompletionsGenerator::new(
            client,
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        )),
        LlmProvider::Gemini => Arc::new(GeminiGenerator::new(
            client,
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        )),
    }
}

fn build_cors(allowed_origin: Option<&str>) -> Cors {
    let cors = match allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin).supports_credentials(),
        None => Cors::default().allow_any_origin(),
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file (if exists)
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().expect("SECRET_KEY must be set");

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.llm_timeout_secs))
        .build()
        .expect("Failed to build HTTP client");

    let app_state = state::AppState {
        store: build_store(&config).await,
        mailer: build_mailer(&config, http_client.clone()),
        prompts: build_prompts(&config, http_client),
        auth: AuthSettings {
            secret_key: config.secret_key.clone(),
            access_token_ttl: chrono::Duration::minutes(config.access_token_expire_minutes),
            verify_code_ttl: chrono::Duration::minutes(config.verify_code_ttl_minutes),
            bcrypt_cost: config.bcrypt_cost,
        },
    };

    log::info!("Listening on {}:{}", config.server_host, config.server_port);

    let cors_origin = config.cors_allowed_origin.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(guards::route_guard::route_guard))
            .wrap(build_cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::init)
    })
    .bind((config.server_host.clone(), config.server_port))?
    .run()
    .await
}
