//! Minimal user account backend: registration, login, profile and presence.

#![forbid(unsafe_code)]
pub mod clock;
mod database;
pub mod error;
mod router;
pub mod telemetry;
mod token;
pub mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Router, middleware as AxumMiddleware};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};

use crate::user::{AccountService, MemoryStore, PgUserStore, UserStore};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub accounts: AccountService,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Answer `408 Request Timeout` to requests running over [`REQUEST_TIMEOUT`].
fn timeout_layer() -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT)
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Tag every request with an `x-request-id`.
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        // Set a timeout.
        .layer(timeout_layer())
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `POST /login` goes to `login`.
        .route("/login", post(router::login::handler))
        // `PUT /logout/{id}` goes to `logout`.
        .route("/logout/{id}", put(router::logout::handler))
        .nest("/users", router::users::router())
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
///
/// Users live in PostgreSQL when a `postgres` entry is configured, in memory
/// otherwise.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let store: Arc<dyn UserStore> = match config.postgres {
        Some(ref postgres) => {
            let db = database::Database::connect(postgres).await?;
            // execute migrations scripts on start.
            db.migrate().await?;

            Arc::new(PgUserStore::new(db.postgres))
        },
        None => {
            tracing::warn!("missing `postgres` entry on `config.yaml` file, users are kept in memory");
            Arc::new(MemoryStore::new())
        },
    };

    Ok(AppState {
        config,
        accounts: AccountService::new(store),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::tests::state;

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = make_request(app(state()), Method::GET, "/users", String::default()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_times_out() {
        let slow = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(REQUEST_TIMEOUT * 2).await;
                    "done"
                }),
            )
            .layer(timeout_layer());

        let response = make_request(slow, Method::GET, "/slow", String::default()).await;

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_initialize_in_memory_state() {
        let config = Arc::new(config::Configuration::default());
        let state = initialize_state(config).await.unwrap();

        assert!(state.accounts.list_users().await.unwrap().is_empty());
    }
}
