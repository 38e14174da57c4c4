use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::message::MessageModel;

/// Returns a new ObjectId as a hex string. This is used as the default for the `id` field.
pub fn default_id() -> String {
    ObjectId::new().to_hex()
}

/// A registered user together with the messages they have received.
///
/// Note:
/// - The `_id` field is renamed to `id` here, stored as a `String` (hex representation of ObjectId).
/// - Messages are embedded; they never live outside their owner's document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    #[serde(rename = "_id", default = "default_id")]
    pub id: String,

    pub username: String,

    pub email: String,

    /// bcrypt hash of the user's password.
    pub password: String,

    /// Six-digit one-time code sent by email.
    pub verify_code: String,

    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub verify_code_expiry: DateTime<Utc>,

    #[serde(default)]
    pub is_verified: bool,

    #[serde(default = "default_accepting")]
    pub is_accepting: bool,

    #[serde(default)]
    pub messages: Vec<MessageModel>,
}

fn default_accepting() -> bool {
    true
}

impl UserModel {
    /// Builds an unverified user that accepts messages and has an empty inbox.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        verify_code: String,
        verify_code_expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            id: default_id(),
            username,
            email,
            password: password_hash,
            verify_code,
            verify_code_expiry,
            is_verified: false,
            is_accepting: true,
            messages: Vec::new(),
        }
    }
}

/// What the API reveals about a user. Secrets stay in [`UserModel`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub is_accepting: bool,
}

impl From<&UserModel> for UserView {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
            is_accepting: user.is_accepting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> UserModel {
        UserModel::new(
            "alice".into(),
            "alice@example.com".into(),
            "$2b$04$hash".into(),
            "123456".into(),
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn new_user_defaults() {
        let user = sample();
        assert!(!user.is_verified);
        assert!(user.is_accepting);
        assert!(user.messages.is_empty());
        assert_eq!(user.id.len(), 24);
    }

    #[test]
    fn stored_document_uses_camel_case_fields() {
        let doc = mongodb::bson::to_document(&sample()).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("verifyCode"));
        assert!(doc.contains_key("isAccepting"));
        assert!(doc.get_datetime("verifyCodeExpiry").is_ok());
    }

    #[test]
    fn view_hides_secrets() {
        let json = serde_json::to_value(UserView::from(&sample())).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["isAccepting"], true);
        assert!(json.get("password").is_none());
        assert!(json.get("verifyCode").is_none());
    }
}
