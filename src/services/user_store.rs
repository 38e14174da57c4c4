// src/services/user_store.rs

//! The `UserStore` trait: every read and write the handlers perform on user
//! documents. Each mutating method is a single atomic update against one
//! document, so concurrent intake and deletion on the same user never race.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;

use crate::models::message::MessageModel;
use crate::models::user::UserModel;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username or email already exists")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("bson serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of trying to drop a message into a user's inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    NotAccepting,
    UserNotFound,
}

/// A window into a user's messages, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 100;
    pub const MAX_LIMIT: usize = 500;

    /// Applies defaults and clamps `limit` into `1..=MAX_LIMIT`.
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

pub trait UserStore: Send + Sync {
    fn find_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<UserModel>>>;

    fn find_by_username<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>>;

    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<UserModel>>>;

    /// Looks a user up by username OR email.
    fn find_by_identifier<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>>;

    /// Inserts a new user. Fails with [`StoreError::Duplicate`] when the
    /// username or email is taken.
    fn insert(&self, user: UserModel) -> BoxFuture<'_, StoreResult<()>>;

    /// Replaces the verification code of an unverified user. Returns `false`
    /// when no unverified user has that username.
    fn set_verify_code<'a>(
        &'a self,
        username: &'a str,
        code: &'a str,
        expiry: DateTime<Utc>,
    ) -> BoxFuture<'a, StoreResult<bool>>;

    /// Flips `isVerified` to true, but only while `code` is the user's current
    /// code and `now` is before its expiry. The check and the flip are one
    /// update. Returns whether it matched.
    fn verify_with_code<'a>(
        &'a self,
        username: &'a str,
        code: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, StoreResult<bool>>;

    /// Overwrites `isAccepting` and returns the updated document.
    fn set_accepting<'a>(
        &'a self,
        user_id: &'a str,
        accepting: bool,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>>;

    /// Appends to the inbox only if the recipient is accepting.
    fn append_message<'a>(
        &'a self,
        username: &'a str,
        message: MessageModel,
    ) -> BoxFuture<'a, StoreResult<AppendOutcome>>;

    /// Returns `None` when the user does not exist.
    fn messages<'a>(
        &'a self,
        user_id: &'a str,
        page: Page,
    ) -> BoxFuture<'a, StoreResult<Option<Vec<MessageModel>>>>;

    /// Removes a message from the owner's own inbox. Returns whether anything
    /// was removed.
    fn remove_message<'a>(
        &'a self,
        user_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<bool>>;
}
