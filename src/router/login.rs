use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{UserSummary, Valid};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, message = "Password cannot be empty."))]
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(flatten)]
    pub user: UserSummary,
    pub token: String,
}

/// Handler to log in with username and password.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = state.accounts.login(&body.username, &body.password).await?;

    Ok(Json(Response {
        user: UserSummary::from(&user),
        token: user.token,
    }))
}
