// src/services/memory_store.rs

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::RwLock;

use crate::models::message::MessageModel;
use crate::models::user::UserModel;
use crate::services::user_store::{AppendOutcome, Page, StoreError, StoreResult, UserStore};

/// A process-local `UserStore` for development (`STORE_BACKEND=memory`) and
/// tests. Every operation holds the lock for its whole duration, which gives
/// the same per-document atomicity as the MongoDB updates.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<UserModel>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_where<F>(&self, predicate: F) -> StoreResult<Option<UserModel>>
    where
        F: Fn(&UserModel) -> bool + Send,
    {
        let users = self.users.read().await;
        Ok(users.iter().find(|&u| predicate(u)).cloned())
    }
}

impl UserStore for MemoryUserStore {
    fn find_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_where(move |u| u.id == id).boxed()
    }

    fn find_by_username<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_where(move |u| u.username == username).boxed()
    }

    fn find_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_where(move |u| u.email == email).boxed()
    }

    fn find_by_identifier<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        self.find_where(move |u| u.email == identifier || u.username == identifier)
            .boxed()
    }

    fn insert(&self, user: UserModel) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            let mut users = self.users.write().await;
            if users
                .iter()
                .any(|u| u.username == user.username || u.email == user.email)
            {
                return Err(StoreError::Duplicate);
            }
            users.push(user);
            Ok(())
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
            let mut users = self.users.write().await;
            match users
                .iter_mut()
                .find(|u| u.username == username && !u.is_verified)
            {
                Some(user) => {
                    user.verify_code = code.to_string();
                    user.verify_code_expiry = expiry;
                    Ok(true)
                }
                None => Ok(false),
            }
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
            let mut users = self.users.write().await;
            match users.iter_mut().find(|u| {
                u.username == username && u.verify_code == code && now < u.verify_code_expiry
            }) {
                Some(user) => {
                    user.is_verified = true;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        .boxed()
    }

    fn set_accepting<'a>(
        &'a self,
        user_id: &'a str,
        accepting: bool,
    ) -> BoxFuture<'a, StoreResult<Option<UserModel>>> {
        async move {
            let mut users = self.users.write().await;
            Ok(users.iter_mut().find(|u| u.id == user_id).map(|user| {
                user.is_accepting = accepting;
                user.clone()
            }))
        }
        .boxed()
    }

    fn append_message<'a>(
        &'a self,
        username: &'a str,
        message: MessageModel,
    ) -> BoxFuture<'a, StoreResult<AppendOutcome>> {
        async move {
            let mut users = self.users.write().await;
            let outcome = match users.iter_mut().find(|u| u.username == username) {
                None => AppendOutcome::UserNotFound,
                Some(user) if !user.is_accepting => AppendOutcome::NotAccepting,
                Some(user) => {
                    user.messages.push(message);
                    AppendOutcome::Appended
                }
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
            let users = self.users.read().await;
            Ok(users.iter().find(|u| u.id == user_id).map(|user| {
                user.messages
                    .iter()
                    .skip(page.offset)
                    .take(page.limit)
                    .cloned()
                    .collect()
            }))
        }
        .boxed()
    }

    fn remove_message<'a>(
        &'a self,
        user_id: &'a str,
        message_id: &'a str,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let mut users = self.users.write().await;
            let Some(user) = users.iter_mut().find(|u| u.id == user_id) else {
                return Ok(false);
            };
            let before = user.messages.len();
            user.messages.retain(|m| m.id != message_id);
            Ok(user.messages.len() != before)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(name: &str) -> UserModel {
        UserModel::new(
            name.to_string(),
            format!("{name}@example.com"),
            "hash".into(),
            "123456".into(),
            Utc::now() + Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_username_or_email() {
        let store = MemoryUserStore::new();
        store.insert(user("alice")).await.unwrap();

        let same_name = UserModel {
            email: "other@example.com".into(),
            ..user("alice")
        };
        assert!(matches!(store.insert(same_name).await, Err(StoreError::Duplicate)));

        let same_email = UserModel {
            username: "bob".into(),
            ..user("alice")
        };
        assert!(matches!(store.insert(same_email).await, Err(StoreError::Duplicate)));
    }

    #[tokio::test]
    async fn find_by_identifier_matches_username_or_email() {
        let store = MemoryUserStore::new();
        store.insert(user("alice")).await.unwrap();

        assert!(store.find_by_identifier("alice").await.unwrap().is_some());
        assert!(store
            .find_by_identifier("alice@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(store.find_by_identifier("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_respects_acceptance_flag() {
        let store = MemoryUserStore::new();
        let alice = user("alice");
        let id = alice.id.clone();
        store.insert(alice).await.unwrap();

        let msg = || MessageModel::new("hi".into(), Utc::now());
        assert_eq!(
            store.append_message("alice", msg()).await.unwrap(),
            AppendOutcome::Appended
        );
        store.set_accepting(&id, false).await.unwrap();
        assert_eq!(
            store.append_message("alice", msg()).await.unwrap(),
            AppendOutcome::NotAccepting
        );
        assert_eq!(
            store.append_message("ghost", msg()).await.unwrap(),
            AppendOutcome::UserNotFound
        );
        let messages = store.messages(&id, Page::default()).await.unwrap().unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn messages_are_paged_in_arrival_order() {
        let store = MemoryUserStore::new();
        let alice = user("alice");
        let id = alice.id.clone();
        store.insert(alice).await.unwrap();
        for i in 0..5 {
            store
                .append_message("alice", MessageModel::new(format!("m{i}"), Utc::now()))
                .await
                .unwrap();
        }

        let page = store
            .messages(&id, Page::new(Some(1), Some(2)))
            .await
            .unwrap()
            .unwrap();
        let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m1", "m2"]);
    }

    #[tokio::test]
    async fn set_verify_code_skips_verified_users() {
        let store = MemoryUserStore::new();
        store.insert(user("alice")).await.unwrap();
        let expiry = Utc::now() + Duration::hours(2);

        assert!(store.set_verify_code("alice", "654321", expiry).await.unwrap());
        assert!(store.verify_with_code("alice", "654321", Utc::now()).await.unwrap());
        assert!(!store.set_verify_code("alice", "111111", expiry).await.unwrap());

        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.verify_code, "654321");
        assert!(alice.is_verified);
    }

    #[tokio::test]
    async fn verify_with_code_rejects_replaced_or_expired_codes() {
        let store = MemoryUserStore::new();
        store.insert(user("alice")).await.unwrap();
        let now = Utc::now();

        // A resend replaced the code the caller had checked.
        store
            .set_verify_code("alice", "654321", now + Duration::hours(1))
            .await
            .unwrap();
        assert!(!store.verify_with_code("alice", "123456", now).await.unwrap());
        assert!(!store
            .verify_with_code("alice", "654321", now + Duration::hours(1))
            .await
            .unwrap());
        assert!(!store.find_by_username("alice").await.unwrap().unwrap().is_verified);

        assert!(store.verify_with_code("alice", "654321", now).await.unwrap());
        assert!(store.find_by_username("alice").await.unwrap().unwrap().is_verified);
    }
}
