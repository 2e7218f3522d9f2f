//! Persistence port between the account service and a backing store.

use async_trait::async_trait;

use crate::user::{Status, StoreError, User, UserId};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Port for user persistence.
///
/// Implementations must run the username uniqueness check and the write of
/// [`UserStore::save`] as one atomic unit with respect to other writers.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every stored user.
    async fn find_all(&self) -> StoreResult<Vec<User>>;

    /// Find a user by identifier.
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Find a user by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Insert `user` when it has no id yet, otherwise replace the stored
    /// record. Returns the record as stored.
    async fn save(&self, user: User) -> StoreResult<User>;

    /// Change only the presence flag of a stored user.
    async fn set_status(&self, id: UserId, status: Status) -> StoreResult<User>;

    /// Force a durability point.
    async fn flush(&self) -> StoreResult<()>;
}
