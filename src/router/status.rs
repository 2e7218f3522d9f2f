//! Public instance status.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;

/// Structured status.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub version: String,
    pub name: String,
    pub url: String,
}

/// Public server status.
pub async fn status(State(config): State<Arc<Configuration>>) -> Json<Status> {
    Json(Status {
        version: config.version().to_owned(),
        name: config.name.clone(),
        url: config.url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    use super::*;
    use crate::router::tests::state;
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_status_handler() {
        let response =
            make_request(app(state()), Method::GET, "/status.json", String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Status = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(body.name, env!("CARGO_CRATE_NAME"));
    }
}
