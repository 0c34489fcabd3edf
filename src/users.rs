//! User records and the user store.
//!
//! Authentication itself is out of scope; callers present an already
//! authenticated user id and this store is the source of truth for whether
//! that user exists and whether they are staff.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

impl User {
    #[must_use]
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            is_staff: false,
        }
    }

    #[must_use]
    pub fn staff(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            is_staff: true,
            ..Self::new(username, email)
        }
    }
}

/// Trait for storing users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn create_user(&self, user: &User) -> Result<()>;
}

/// In-memory user store.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: std::sync::Arc<tokio::sync::RwLock<std::collections::HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }
}
