//! Users-related HTTP API.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{Profile, UserSummary, Valid};
use crate::user::{NewUser, Password, ProfileChanges, UserId};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterBody {
    #[validate(length(min = 1, max = 50, message = "Name must contain 1 to 50 characters."))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 50,
        message = "Username must contain 1 to 50 characters."
    ))]
    pub username: String,
    #[validate(length(min = 1, message = "Password cannot be empty."))]
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct EditBody {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Username must contain 1 to 50 characters."
    ))]
    pub username: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Profile of a freshly registered user, with its token.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Registered {
    #[serde(flatten)]
    pub profile: Profile,
    pub token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /users` lists users, `POST /users` registers one.
        .route("/", get(list).post(create))
        // `GET /users/{id}` and `PUT /users/{id}`.
        .route("/{id}", get(find).put(update))
}

/// Handler to list every user.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserSummary>>> {
    let users = state.accounts.list_users().await?;

    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

/// Handler to create user.
pub async fn create(
    State(state): State<AppState>,
    Valid(body): Valid<RegisterBody>,
) -> Result<(StatusCode, Json<Registered>)> {
    let user = state
        .accounts
        .register(NewUser {
            name: body.name,
            username: body.username,
            password: Password::new(body.password),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            profile: Profile::from(&user),
            token: user.token,
        }),
    ))
}

/// Handler to get a user profile.
pub async fn find(
    State(state): State<AppState>,
    id: std::result::Result<Path<UserId>, PathRejection>,
) -> Result<Json<Profile>> {
    let Path(id) = id?;
    let user = state.accounts.get_by_id(id).await?;

    Ok(Json(Profile::from(&user)))
}

/// Handler to update username and birthday.
pub async fn update(
    State(state): State<AppState>,
    id: std::result::Result<Path<UserId>, PathRejection>,
    Valid(body): Valid<EditBody>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state
        .accounts
        .edit(
            id,
            ProfileChanges {
                username: body.username,
                birthday: body.birthday,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::*;
    use crate::error::ResponseError;
    use crate::router::tests::{register, state};
    use crate::user::Status;
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_create_handler() {
        let state = state();

        let response = make_request(
            app(state.clone()),
            Method::POST,
            "/users",
            json!({ "name": "Ann", "username": "ann1", "password": "p1" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Registered = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.profile.id, 1);
        assert_eq!(body.profile.username, "ann1");
        assert_eq!(body.profile.status, Status::Online);
        assert_eq!(body.profile.birthday, None);
        assert!(!body.token.is_empty());
    }

    #[tokio::test]
    async fn test_create_response_shape() {
        let response = make_request(
            app(state()),
            Method::POST,
            "/users",
            json!({ "name": "Ann", "username": "ann1", "password": "p1" }).to_string(),
        )
        .await;

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "ONLINE");
        assert!(body["creation_date"].is_string());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_username() {
        let state = state();
        register(&state, "Ann", "ann1", "p1").await;

        let response = make_request(
            app(state.clone()),
            Method::POST,
            "/users",
            json!({ "name": "Other", "username": "ann1", "password": "p2" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseError = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.status, StatusCode::CONFLICT.as_u16());
    }

    #[tokio::test]
    async fn test_create_with_empty_fields() {
        let response = make_request(
            app(state()),
            Method::POST,
            "/users",
            json!({ "name": "", "username": "ann1", "password": "" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: ResponseError = serde_json::from_slice(&body).unwrap();
        let fields: Vec<_> = body
            .errors
            .unwrap()
            .into_iter()
            .map(|error| error.field)
            .collect();
        assert!(fields.contains(&"name".to_owned()));
        assert!(fields.contains(&"password".to_owned()));
    }

    #[tokio::test]
    async fn test_create_with_missing_field() {
        let response = make_request(
            app(state()),
            Method::POST,
            "/users",
            json!({ "name": "Ann", "password": "p1" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_handler() {
        let state = state();
        register(&state, "Ann", "ann1", "p1").await;
        register(&state, "Bob", "bob", "p2").await;

        let response =
            make_request(app(state.clone()), Method::GET, "/users", String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Vec<UserSummary> = serde_json::from_slice(&body).unwrap();
        let usernames: Vec<_> = body.iter().map(|user| user.username.as_str()).collect();
        assert_eq!(usernames, ["ann1", "bob"]);
    }

    #[tokio::test]
    async fn test_get_user_handler() {
        let state = state();
        let created = register(&state, "Emma", "EmmaIsBest", "LittleEmma").await;

        let path = format!("/users/{}", created.id);
        let response = make_request(app(state.clone()), Method::GET, &path, String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Profile = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, created);
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let response =
            make_request(app(state()), Method::GET, "/users/42", String::default()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_with_invalid_id() {
        let response =
            make_request(app(state()), Method::GET, "/users/ann1", String::default()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_handler() {
        let state = state();
        let created = register(&state, "Ann", "ann1", "p1").await;
        let path = format!("/users/{}", created.id);

        let response = make_request(
            app(state.clone()),
            Method::PUT,
            &path,
            json!({ "username": "ann2", "birthday": "1998-02-14" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = make_request(app(state.clone()), Method::GET, &path, String::default()).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Profile = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.username, "ann2");
        assert_eq!(body.birthday, NaiveDate::from_ymd_opt(1998, 2, 14));
    }

    #[tokio::test]
    async fn test_update_to_taken_username() {
        let state = state();
        register(&state, "Ann", "ann1", "p1").await;
        let bob = register(&state, "Bob", "bob", "p2").await;

        let response = make_request(
            app(state.clone()),
            Method::PUT,
            &format!("/users/{}", bob.id),
            json!({ "username": "ann1" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let response = make_request(
            app(state()),
            Method::PUT,
            "/users/7",
            json!({ "birthday": "2000-01-01" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
