use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::Result;
use crate::router::Profile;
use crate::user::UserId;

/// Handler to mark a user offline.
pub async fn handler(
    State(state): State<AppState>,
    id: std::result::Result<Path<UserId>, PathRejection>,
) -> Result<Json<Profile>> {
    let Path(id) = id?;
    let user = state.accounts.logout(id).await?;

    Ok(Json(Profile::from(&user)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    use super::*;
    use crate::router::tests::{register, state};
    use crate::user::Status;
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_logout_handler() {
        let state = state();
        let created = register(&state, "Ann", "ann1", "p1").await;
        let path = format!("/logout/{}", created.id);

        for _ in 0..2 {
            let response =
                make_request(app(state.clone()), Method::PUT, &path, String::default()).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            let body: Profile = serde_json::from_slice(&body).unwrap();
            assert_eq!(body.id, created.id);
            assert_eq!(body.status, Status::Offline);
        }
    }

    #[tokio::test]
    async fn test_logout_unknown_user() {
        let response =
            make_request(app(state()), Method::PUT, "/logout/3", String::default()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
