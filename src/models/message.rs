use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::default_id;

/// An anonymous message, embedded in the recipient's user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageModel {
    #[serde(rename = "_id", default = "default_id")]
    pub id: String,

    pub content: String,

    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl MessageModel {
    pub fn new(content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: default_id(),
            content,
            created_at,
        }
    }
}

/// JSON shape of a message as returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<MessageModel> for MessageView {
    fn from(message: MessageModel) -> Self {
        Self {
            id: message.id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}
