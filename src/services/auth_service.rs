// src/services/auth_service.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::Error as JwtError, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::UserModel;
use crate::services::mail_service::VerificationMailer;
use crate::services::user_store::UserStore;

const MIN_PASSWORD_LEN: usize = 6;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 2..=20;

/// Knobs for hashing, tokens and verification codes.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    pub access_token_ttl: Duration,
    pub verify_code_ttl: Duration,
    pub bcrypt_cost: u32,
}

/// JWT claims: a snapshot of the user taken at sign-in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub is_verified: bool,
    pub is_accepting: bool,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
}

impl Claims {
    pub fn for_user(user: &UserModel) -> Self {
        Self {
            sub: user.id.clone(),
            username: user.username.clone(),
            is_verified: user.is_verified,
            is_accepting: user.is_accepting,
            exp: 0,
        }
    }
}

/// Verifies a plain password against a hashed password.
pub fn verify_password(plain_password: &str, hashed_password: &str) -> bool {
    verify(plain_password, hashed_password).unwrap_or(false)
}

/// Hashes a password using bcrypt.
pub fn get_password_hash(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Signs `claims` with an expiry of `now + expires_delta`.
pub fn create_access_token(
    mut claims: Claims,
    expires_delta: Duration,
    secret_key: &str,
) -> Result<String, JwtError> {
    claims.exp = (Utc::now() + expires_delta).timestamp() as usize;
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret_key.as_bytes()))
}

/// Verifies a JWT token and returns the decoded claims if valid.
pub fn verify_jwt_token(token: &str, secret_key: &str) -> Result<Claims, JwtError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// A random six-digit code.
pub fn generate_verify_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AppError> {
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::BadRequest(
            "Username must be between 2 and 20 characters".into(),
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::BadRequest(
            "Username may only contain letters, digits and underscores".into(),
        ));
    }
    if email.parse::<lettre::Address>().is_err() {
        return Err(AppError::BadRequest("Please use a valid email address".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

/// Outcome of a successful registration.
#[derive(Debug)]
pub struct Registration {
    pub user: UserModel,
    /// Whether the verification email went out. The account exists either way.
    pub email_sent: bool,
}

/// Creates an unverified user and emails them a verification code.
pub async fn register(
    store: &dyn UserStore,
    mailer: &dyn VerificationMailer,
    settings: &AuthSettings,
    username: &str,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<Registration, AppError> {
    let username = username.trim();
    let email = email.trim();
    validate_registration(username, email, password)?;

    if store.find_by_username(username).await?.is_some() {
        return Err(AppError::Conflict("Username is already taken"));
    }
    if store.find_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered"));
    }

    let user = UserModel::new(
        username.to_string(),
        email.to_string(),
        get_password_hash(password, settings.bcrypt_cost)?,
        generate_verify_code(),
        now + settings.verify_code_ttl,
    );
    store.insert(user.clone()).await?;
    log::info!("Registered user {}", user.username);

    let email_sent = match mailer
        .send_verification(&user.email, &user.username, &user.verify_code)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to send verification email to {}: {}", user.email, e);
            false
        }
    };

    Ok(Registration { user, email_sent })
}

/// Checks a submitted code and marks the account verified.
pub async fn verify_code(
    store: &dyn UserStore,
    username: &str,
    code: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let user = store
        .find_by_username(username.trim())
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if now >= user.verify_code_expiry {
        log::warn!("Expired verification code submitted for {}", user.username);
        return Err(AppError::Expired);
    }
    if code.trim() != user.verify_code {
        log::warn!("Incorrect verification code submitted for {}", user.username);
        return Err(AppError::InvalidCode);
    }

    // The code may have been replaced or expired since the lookup.
    if !store.verify_with_code(&user.username, &user.verify_code, now).await? {
        log::warn!("Verification code for {} changed during verification", user.username);
        return Err(AppError::InvalidCode);
    }
    log::info!("Verified user {}", user.username);
    Ok(())
}

/// Issues a fresh code and expiry for an unverified account and emails it.
pub async fn resend_code(
    store: &dyn UserStore,
    mailer: &dyn VerificationMailer,
    settings: &AuthSettings,
    username: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let user = store
        .find_by_username(username.trim())
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    if user.is_verified {
        return Err(AppError::BadRequest("Account is already verified".into()));
    }

    let code = generate_verify_code();
    if !store
        .set_verify_code(&user.username, &code, now + settings.verify_code_ttl)
        .await?
    {
        // Verified between the lookup and the update.
        return Err(AppError::BadRequest("Account is already verified".into()));
    }

    mailer
        .send_verification(&user.email, &user.username, &code)
        .await?;
    Ok(())
}

/// Checks credentials and signs a session token.
pub async fn authenticate(
    store: &dyn UserStore,
    settings: &AuthSettings,
    identifier: &str,
    password: &str,
) -> Result<(UserModel, String), AppError> {
    let user = store
        .find_by_identifier(identifier.trim())
        .await?
        .ok_or(AppError::NotFound("No user found with this email or username"))?;

    if !user.is_verified {
        return Err(AppError::NotVerified);
    }
    if !verify_password(password, &user.password) {
        log::warn!("Failed sign-in attempt for {}", user.username);
        return Err(AppError::InvalidCredentials);
    }

    let token = create_access_token(
        Claims::for_user(&user),
        settings.access_token_ttl,
        &settings.secret_key,
    )?;
    Ok((user, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mail_service::testing::RecordingMailer;
    use crate::services::memory_store::MemoryUserStore;
    use crate::test_support::test_settings;

    async fn registered(store: &MemoryUserStore, mailer: &RecordingMailer, now: DateTime<Utc>) -> UserModel {
        register(
            store,
            mailer,
            &test_settings(),
            "alice",
            "alice@example.com",
            "secret123",
            now,
        )
        .await
        .unwrap()
        .user
    }

    #[test]
    fn verify_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_verify_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn token_round_trip_and_tamper_rejection() {
        let user = UserModel::new(
            "alice".into(),
            "alice@example.com".into(),
            "hash".into(),
            "123456".into(),
            Utc::now(),
        );
        let token = create_access_token(Claims::for_user(&user), Duration::minutes(5), "k1").unwrap();

        let claims = verify_jwt_token(&token, "k1").unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert!(claims.is_accepting);

        assert!(verify_jwt_token(&token, "other-key").is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        let hashed = get_password_hash("secret123", 4).unwrap();
        assert_ne!(hashed, "secret123");
        assert!(verify_password("secret123", &hashed));
        assert!(!verify_password("secret124", &hashed));
    }

    #[tokio::test]
    async fn register_stores_hash_and_emails_code() {
        let store = MemoryUserStore::new();
        let mailer = RecordingMailer::default();
        let now = Utc::now();
        let user = registered(&store, &mailer, now).await;

        assert_ne!(user.password, "secret123");
        assert_eq!(user.verify_code_expiry, now + Duration::hours(1));
        assert_eq!(mailer.last_code_for("alice@example.com"), Some(user.verify_code));
    }

    #[tokio::test]
    async fn register_keeps_user_when_email_fails() {
        let store = MemoryUserStore::new();
        let mailer = RecordingMailer::failing();
        let outcome = register(
            &store,
            &mailer,
            &test_settings(),
            "alice",
            "alice@example.com",
            "secret123",
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(!outcome.email_sent);
        assert!(store.find_by_username("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_bad_input() {
        let store = MemoryUserStore::new();
        let mailer = RecordingMailer::default();
        let settings = test_settings();
        let now = Utc::now();
        registered(&store, &mailer, now).await;

        let dup_name = register(&store, &mailer, &settings, "alice", "a2@example.com", "secret123", now).await;
        assert!(matches!(dup_name, Err(AppError::Conflict(_))));
        let dup_email = register(&store, &mailer, &settings, "alice2", "alice@example.com", "secret123", now).await;
        assert!(matches!(dup_email, Err(AppError::Conflict(_))));
        let bad_email = register(&store, &mailer, &settings, "bob", "not-an-email", "secret123", now).await;
        assert!(matches!(bad_email, Err(AppError::BadRequest(_))));
        let short_pw = register(&store, &mailer, &settings, "bob", "bob@example.com", "123", now).await;
        assert!(matches!(short_pw, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn verify_code_requires_match_and_unexpired() {
        let store = MemoryUserStore::new();
        let mailer = RecordingMailer::default();
        let now = Utc::now();
        let user = registered(&store, &mailer, now).await;
        let wrong = if user.verify_code == "100000" { "100001" } else { "100000" };

        assert!(matches!(
            verify_code(&store, "alice", wrong, now).await,
            Err(AppError::InvalidCode)
        ));
        let later = now + Duration::hours(1);
        assert!(matches!(
            verify_code(&store, "alice", &user.verify_code, later).await,
            Err(AppError::Expired)
        ));
        assert!(matches!(
            verify_code(&store, "ghost", "123456", now).await,
            Err(AppError::NotFound(_))
        ));
        assert!(!store.find_by_username("alice").await.unwrap().unwrap().is_verified);

        // A failed attempt does not burn the code.
        verify_code(&store, "alice", &user.verify_code, now + Duration::minutes(59))
            .await
            .unwrap();
        assert!(store.find_by_username("alice").await.unwrap().unwrap().is_verified);
    }

    #[tokio::test]
    async fn resend_code_replaces_code_and_expiry() {
        let store = MemoryUserStore::new();
        let mailer = RecordingMailer::default();
        let settings = test_settings();
        let now = Utc::now();
        registered(&store, &mailer, now).await;

        let later = now + Duration::hours(3);
        resend_code(&store, &mailer, &settings, "alice", later).await.unwrap();
        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.verify_code_expiry, later + Duration::hours(1));
        assert_eq!(mailer.last_code_for("alice@example.com"), Some(user.verify_code.clone()));

        verify_code(&store, "alice", &user.verify_code, later).await.unwrap();
        assert!(matches!(
            resend_code(&store, &mailer, &settings, "alice", later).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_checks_in_order() {
        let store = MemoryUserStore::new();
        let mailer = RecordingMailer::default();
        let settings = test_settings();
        let now = Utc::now();
        let user = registered(&store, &mailer, now).await;

        assert!(matches!(
            authenticate(&store, &settings, "nobody", "secret123").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            authenticate(&store, &settings, "alice", "secret123").await,
            Err(AppError::NotVerified)
        ));

        verify_code(&store, "alice", &user.verify_code, now).await.unwrap();
        assert!(matches!(
            authenticate(&store, &settings, "alice", "wrong-password").await,
            Err(AppError::InvalidCredentials)
        ));

        let (by_email, token) = authenticate(&store, &settings, "alice@example.com", "secret123")
            .await
            .unwrap();
        assert_eq!(by_email.username, "alice");
        let claims = verify_jwt_token(&token, &settings.secret_key).unwrap();
        assert!(claims.is_verified);
        assert_eq!(claims.sub, by_email.id);
    }
}
