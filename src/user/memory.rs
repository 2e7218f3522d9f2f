//! In-memory user store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::user::{Status, StoreError, StoreResult, User, UserId, UserStore};

#[derive(Debug)]
struct Records {
    users: BTreeMap<UserId, User>,
    next_id: UserId,
}

/// Process-local store. Data is lost on restart.
#[derive(Debug)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    /// Create an empty [`MemoryStore`]. First assigned id is `1`.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Records {
                users: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.users.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.users.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<User>> {
        Ok(self.records.read().await.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.records.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .records
            .read()
            .await
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn save(&self, mut user: User) -> StoreResult<User> {
        // Write lock held across check and write.
        let mut records = self.records.write().await;

        let taken = records
            .users
            .values()
            .any(|other| other.username == user.username && other.id != user.id);
        if taken {
            return Err(StoreError::Conflict {
                username: user.username,
            });
        }

        let id = match user.id {
            Some(id) if records.users.contains_key(&id) => id,
            Some(id) => return Err(StoreError::NotFound(id)),
            None => {
                let id = records.next_id;
                records.next_id += 1;
                user.id = Some(id);
                id
            },
        };

        records.users.insert(id, user.clone());
        Ok(user)
    }

    async fn set_status(&self, id: UserId, status: Status) -> StoreResult<User> {
        let mut records = self.records.write().await;
        let user = records
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        user.status = status;
        Ok(user.clone())
    }

    async fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
