//! Credential store.
//!
//! Usernames are unique: `insert` performs the uniqueness check and the write
//! under one lock, so concurrent signups for the same name cannot both land.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} already exists")]
    Duplicate(String),
    #[error("store io failed: {0}")]
    Io(#[from] io::Error),
    #[error("store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> Result<(), StoreError>;

    async fn find(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.find(username).await?.is_some())
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(user.username));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(username).cloned())
    }
}

/// Keeps every user in memory and rewrites the whole JSON file on each insert.
pub struct JsonFileUserStore {
    path: PathBuf,
    users: Mutex<HashMap<String, User>>,
}

impl JsonFileUserStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let users = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<User>>(&bytes)?
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        log::info!("loaded {} users from {}", users.len(), path.display());
        Ok(JsonFileUserStore {
            path,
            users: Mutex::new(users),
        })
    }

    async fn persist(&self, users: &HashMap<String, User>) -> Result<(), StoreError> {
        let mut records: Vec<&User> = users.values().collect();
        records.sort_by(|a, b| a.username.cmp(&b.username));
        let bytes = serde_json::to_vec_pretty(&records)?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileUserStore {
    async fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(user.username));
        }
        let username = user.username.clone();
        users.insert(username.clone(), user);
        if let Err(err) = self.persist(&users).await {
            users.remove(&username);
            return Err(err);
        }
        Ok(())
    }

    async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().await.get(username).cloned())
    }
}
