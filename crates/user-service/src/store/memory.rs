use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use tokio::sync::RwLock;

use super::{Result, StoreError, UserStore};
use crate::models::{NewUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    next_id: i64,
}

/// In-memory user store used by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        inner.next_id += 1;
        let user = User {
            id: UserId::new(inner.next_id),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            is_verified: false,
            is_superuser: user.is_superuser,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn mark_verified(&self, id: UserId) -> Result<User> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.is_verified = true;
        Ok(user.clone())
    }
}
