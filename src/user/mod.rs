//! User record, its lifecycle and its persistence.

mod error;
mod memory;
mod postgres;
mod service;
mod store;

pub use error::*;
pub use memory::*;
pub use postgres::*;
pub use service::*;
pub use store::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
pub type UserId = i64;

/// Presence flag of a [`User`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Online,
    Offline,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Online => "ONLINE",
            Status::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status is neither `ONLINE` nor `OFFLINE`.
#[derive(Debug, thiserror::Error)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(Status::Online),
            "OFFLINE" => Ok(Status::Offline),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Plaintext credential.
///
/// Compared by exact equality at login. Never serialized and redacted from
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a login attempt against the stored credential.
    pub fn matches(&self, attempt: &str) -> bool {
        self.0 == attempt
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// User as saved on the store.
///
/// `id` is `None` until the first save.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Option<UserId>,
    pub name: String,
    pub username: String,
    pub password: Password,
    pub token: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub birthday: Option<NaiveDate>,
}

impl User {
    /// Identifier of a persisted user.
    ///
    /// Records returned by a [`UserStore`] always carry one; `0` only shows
    /// up on records that were never saved.
    pub fn id(&self) -> UserId {
        self.id.unwrap_or_default()
    }
}

/// Registration candidate.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub password: Password,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub birthday: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&Status::Online).unwrap(), "\"ONLINE\"");
        assert_eq!(serde_json::to_string(&Status::Offline).unwrap(), "\"OFFLINE\"");
        assert_eq!("OFFLINE".parse::<Status>().unwrap(), Status::Offline);
        assert!("away".parse::<Status>().is_err());
    }

    #[test]
    fn test_password_is_redacted() {
        let password = Password::new("hunter2");
        assert!(!format!("{password:?}").contains("hunter2"));
        assert!(password.matches("hunter2"));
        assert!(!password.matches("Hunter2"));
    }
}
