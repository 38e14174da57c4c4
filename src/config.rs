use std::env;

/// Which `UserStore` backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    Resend,
    Smtp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Any OpenAI-compatible chat completions API (Groq by default).
    OpenAi,
    Gemini,
}

pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub cors_allowed_origin: Option<String>,

    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub verify_code_ttl_minutes: i64,
    pub bcrypt_cost: u32,

    pub email_provider: EmailProvider,
    pub email_from: String,
    pub resend_api_key: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,

    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
}

impl Config {
    /// Reads the configuration from the environment. Only `SECRET_KEY` is
    /// mandatory; everything else falls back to a development default.
    pub fn from_env() -> Result<Self, env::VarError> {
        let llm_provider = match env::var("LLM_PROVIDER").as_deref() {
            Ok("gemini") => LlmProvider::Gemini,
            _ => LlmProvider::OpenAi,
        };
        let (default_base_url, default_model) = match llm_provider {
            LlmProvider::OpenAi => ("https://api.groq.com/openai/v1", "llama3-70b-8192"),
            LlmProvider::Gemini => (
                "https://generativelanguage.googleapis.com/v1beta",
                "gemini-1.5-flash",
            ),
        };

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parsed("SERVER_PORT", 8080),
            store_backend: match env::var("STORE_BACKEND").as_deref() {
                Ok("memory") => StoreBackend::Memory,
                _ => StoreBackend::Mongo,
            },
            mongo_uri: env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "anonbox".to_string()),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),

            secret_key: env::var("SECRET_KEY")?,
            access_token_expire_minutes: parsed("ACCESS_TOKEN_EXPIRE_MINUTES", 1440),
            verify_code_ttl_minutes: parsed("VERIFY_CODE_TTL_MINUTES", 60),
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST),

            email_provider: match env::var("EMAIL_PROVIDER").as_deref() {
                Ok("smtp") => EmailProvider::Smtp,
                _ => EmailProvider::Resend,
            },
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| "onboarding@resend.dev".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            smtp_server: env::var("SMTP_SERVER").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: parsed("SMTP_PORT", 587),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),

            llm_provider,
            llm_api_key: env::var("LLM_API_KEY").unwrap_or_default(),
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or_else(|_| default_base_url.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| default_model.to_string()),
            llm_timeout_secs: parsed("LLM_TIMEOUT_SECS", 20),
        })
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid value for {key}: {raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}
