//! Account lifecycle: registration, login, profile edition and logout.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::user::{
    AccountError, Lookup, NewUser, ProfileChanges, Result, Status, User, UserId, UserStore,
};

/// Account manager.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a new [`AccountService`] using the system clock.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used for creation dates.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Every registered user.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.find_all().await?)
    }

    /// Register a new user.
    ///
    /// The user starts `ONLINE` with a fresh token.
    pub async fn register(&self, candidate: NewUser) -> Result<User> {
        if self
            .store
            .find_by_username(&candidate.username)
            .await?
            .is_some()
        {
            return Err(AccountError::Conflict {
                username: candidate.username,
            });
        }

        let user = User {
            id: None,
            name: candidate.name,
            username: candidate.username,
            password: candidate.password,
            token: crate::token::generate(),
            status: Status::Online,
            created_at: self.clock.now(),
            birthday: None,
        };

        let user = self.store.save(user).await?;
        self.store.flush().await?;

        metrics::counter!("accounts_registered_total").increment(1);
        tracing::debug!(user_id = user.id(), username = %user.username, "user created");

        Ok(user)
    }

    /// Check credentials and mark the user `ONLINE`.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.store.find_by_username(username).await? else {
            metrics::counter!("accounts_login_total", "outcome" => "unknown_user").increment(1);
            return Err(AccountError::NotFound(Lookup::Username(username.to_owned())));
        };

        if !user.password.matches(password) {
            metrics::counter!("accounts_login_total", "outcome" => "wrong_password").increment(1);
            tracing::info!(user_id = user.id(), "login refused");
            return Err(AccountError::Unauthorized);
        }

        let user = self.store.set_status(user.id(), Status::Online).await?;

        metrics::counter!("accounts_login_total", "outcome" => "success").increment(1);
        tracing::debug!(user_id = user.id(), "user logged in");

        Ok(user)
    }

    /// Find a user by identifier.
    pub async fn get_by_id(&self, id: UserId) -> Result<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(Lookup::Id(id)))
    }

    /// Apply a partial profile update.
    ///
    /// Renaming to the current username is a no-op. Renaming to a username
    /// owned by another user fails with [`AccountError::Conflict`].
    pub async fn edit(&self, id: UserId, changes: ProfileChanges) -> Result<User> {
        let mut user = self.get_by_id(id).await?;

        if let Some(username) = changes.username {
            if username != user.username {
                let owner = self.store.find_by_username(&username).await?;
                if owner.is_some_and(|owner| owner.id != user.id) {
                    return Err(AccountError::Conflict { username });
                }
                user.username = username;
            }
        }

        if let Some(birthday) = changes.birthday {
            user.birthday = Some(birthday);
        }

        let user = self.store.save(user).await?;
        tracing::debug!(user_id = id, "user profile updated");

        Ok(user)
    }

    /// Mark the user `OFFLINE`. Repeated calls are harmless.
    pub async fn logout(&self, id: UserId) -> Result<User> {
        let user = self.store.set_status(id, Status::Offline).await?;
        tracing::debug!(user_id = id, "user logged out");

        Ok(user)
    }
}
