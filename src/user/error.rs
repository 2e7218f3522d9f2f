//! Account and store errors.

use std::fmt;

use crate::user::UserId;

pub type Result<T> = std::result::Result<T, AccountError>;

/// Key used to look a user up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Id(UserId),
    Username(String),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Id(id) => write!(f, "id {id}"),
            Lookup::Username(username) => write!(f, "username `{username}`"),
        }
    }
}

/// Failures of an account operation.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("username `{username}` is already taken")]
    Conflict { username: String },

    #[error("no user with {0}")]
    NotFound(Lookup),

    #[error("password does not match")]
    Unauthorized,

    #[error(transparent)]
    Store(StoreError),
}

/// Failures of a [`UserStore`](crate::user::UserStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username `{username}` belongs to another user")]
    Conflict { username: String },

    #[error("no stored user with id {0}")]
    NotFound(UserId),

    #[error("SQL request failed: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("stored record is invalid: {0}")]
    Corrupted(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { username } => AccountError::Conflict { username },
            StoreError::NotFound(id) => AccountError::NotFound(Lookup::Id(id)),
            err => AccountError::Store(err),
        }
    }
}
