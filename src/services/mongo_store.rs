// src/services/mongo_store.rs

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOneOptions, ReturnDocument};
use mongodb::Collection;

use crate::models::message::MessageModel;
use crate::models::user::UserModel;
use crate::services::user_store::{AppendOutcome, Page, StoreError, StoreResult, UserStore};

/// Duplicate key error code reported by MongoDB for unique index violations.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoUserStore {
    users_collection: Collection<UserModel>,
}

impl MongoUserStore {
    pub fn new(users_collection: Collection<UserModel>) -> Self {
        Self { users_collection }
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<UserModel>> {
        Ok(self.users_collection.find_one(filter, None).await?)
    }
}

fn id_filter(user_id: &str) -> Document {
    doc! { "_id": user_id }
}

fn identifier_filter(identifier: &str) -> Document {
    doc! { "$or": [ { "email": identifier }, { "username": identifier } ] }
}

/// Matches only while `code` is current and unexpired.
fn verify_filter(username: &str, code: &str, now: DateTime<Utc>) -> Document {
    doc! {
        "username": username,
        "verifyCode": code,
        "verifyCodeExpiry": { "$gt": bson::DateTime::from_chrono(now) },
    }
}

/// The push only lands on a recipient that is accepting.
fn append_filter(username: &str) -> Document {
    doc! { "username": username, "isAccepting": true }
}

fn push_update(message: Bson) -> Document {
    doc! { "$push": { "messages": message } }
}

fn pull_update(message_id: &str) -> Document {
    doc! { "$pull": { "messages": { "_id": message_id } } }
}

/// `$slice` takes 64-bit ints; offsets past `i64::MAX` saturate to an empty page.
fn page_projection(page: Page) -> Document {
    let offset = i64::try_from(page.offset).unwrap_or(i64::MAX);
    let limit = i64::try_from(page.limit).unwrap_or(i64::MAX);
    doc! { "messages": { "$slice": [offset, limit] } }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
    )
}

impl UserStore for MongoUserStore {
    fn find_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_one(id_filter(id)).boxed()
    }

    fn find_by_username<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_one(doc! { "username": username }).boxed()
    }

    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_one(doc! { "email": email }).boxed()
    }

    fn find_by_identifier<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_one(identifier_filter(identifier)).boxed()
    }

    fn insert(&self, user: UserModel) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            match self.users_collection.insert_one(&user, None).await {
                Ok(_) => Ok(()),
                Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate),
                Err(e) => Err(e.into()),
            }
        }
        .boxed()
    }

    fn set_verify_code<'a>(
        &'a self,
        username: &'a str,
        code: &'a str,
        expiry: DateTime<Utc>,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let result = self
                .users_collection
                .update_one(
                    doc! { "username": username, "isVerified": false },
                    doc! { "$set": {
                        "verifyCode": code,
                        "verifyCodeExpiry": bson::DateTime::from_chrono(expiry),
                    } },
                    None,
                )
                .await?;
            Ok(result.matched_count > 0)
        }
        .boxed()
    }

    fn verify_with_code<'a>(
        &'a self,
        username: &'a str,
        code: &'a str,
        now: DateTime<Utc>,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let result = self
                .users_collection
                .update_one(
                    verify_filter(username, code, now),
                    doc! { "$set": { "isVerified": true } },
                    None,
                )
                .await?;
            Ok(result.matched_count > 0)
        }
        .boxed()
    }

    fn set_accepting<'a>(
        &'a self,
        user_id: &'a str,
        accepting: bool,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        async move {
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            Ok(self
                .users_collection
                .find_one_and_update(
                    id_filter(user_id),
                    doc! { "$set": { "isAccepting": accepting } },
                    options,
                )
                .await?)
        }
        .boxed()
    }

    fn append_message<'a>(
        &'a self,
        username: &'a str,
        message: MessageModel,
    ) -> BoxFuture<'a, StoreResult<AppendOutcome>> {
        async move {
            let message = bson::to_bson(&message)?;
            let result = self
                .users_collection
                .update_one(
                    append_filter(username),
                    push_update(message),
                    None,
                )
                .await?;
            if result.matched_count > 0 {
                return Ok(AppendOutcome::Appended);
            }

            // The conditional push matched nothing: find out why.
            let outcome = match self.find_one(doc! { "username": username }).await? {
                Some(_) => AppendOutcome::NotAccepting,
                None => AppendOutcome::UserNotFound,
            };
            Ok(outcome)
        }
        .boxed()
    }

    fn messages<'a>(
        &'a self,
        user_id: &'a str,
        page: Page,
    ) -> BoxFuture<'a, StoreResult<Option<Vec<MessageModel>>>> {
        async move {
            let options = FindOneOptions::builder()
                .projection(page_projection(page))
                .build();
            let user = self
                .users_collection
                .find_one(id_filter(user_id), options)
                .await?;
            Ok(user.map(|u| u.messages))
        }
        .boxed()
    }

    fn remove_message<'a>(
        &'a self,
        user_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let result = self
                .users_collection
                .update_one(
                    id_filter(user_id),
                    pull_update(message_id),
                    None,
                )
                .await?;
            Ok(result.modified_count > 0)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn append_only_matches_accepting_recipients() {
        assert_eq!(
            append_filter("alice"),
            doc! { "username": "alice", "isAccepting": true }
        );
        let message = bson::to_bson(&MessageModel::new("hi".into(), Utc::now())).unwrap();
        let update = push_update(message.clone());
        assert_eq!(update.get_document("$push").unwrap().get("messages"), Some(&message));
    }

    #[test]
    fn pull_is_scoped_to_the_owner() {
        assert_eq!(id_filter("abc"), doc! { "_id": "abc" });
        assert_eq!(
            pull_update("m1"),
            doc! { "$pull": { "messages": { "_id": "m1" } } }
        );
    }

    #[test]
    fn verify_filter_requires_current_unexpired_code() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            verify_filter("alice", "123456", now),
            doc! {
                "username": "alice",
                "verifyCode": "123456",
                "verifyCodeExpiry": { "$gt": bson::DateTime::from_chrono(now) },
            }
        );
    }

    #[test]
    fn identifier_filter_matches_email_or_username() {
        assert_eq!(
            identifier_filter("a@example.com"),
            doc! { "$or": [ { "email": "a@example.com" }, { "username": "a@example.com" } ] }
        );
    }

    #[test]
    fn page_projection_slices_messages() {
        assert_eq!(
            page_projection(Page::new(Some(20), Some(10))),
            doc! { "messages": { "$slice": [20_i64, 10_i64] } }
        );
    }

    #[test]
    fn page_projection_saturates_huge_offsets() {
        let page = Page::new(Some(usize::MAX), None);
        assert_eq!(
            page_projection(page),
            doc! { "messages": { "$slice": [i64::MAX, 100_i64] } }
        );
    }
}
