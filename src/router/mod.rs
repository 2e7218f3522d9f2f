//! HTTP API.
pub mod login;
pub mod logout;
pub mod status;
pub mod users;

use axum::Json;
use axum::extract::{FromRequest, Request};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ServerError;
use crate::user::{Status, User, UserId};

/// JSON body extractor running `validator` rules before the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Public part of a user, as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub status: Status,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name.clone(),
            username: user.username.clone(),
            status: user.status,
        }
    }
}

/// Full public profile of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub status: Status,
    pub creation_date: DateTime<Utc>,
    pub birthday: Option<NaiveDate>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name.clone(),
            username: user.username.clone(),
            status: user.status,
            creation_date: user.created_at,
            birthday: user.birthday,
        }
    }
}
