//! Audit relay demo server.
//!
//! A small user API wrapped by [`AuditLayer`]. Send writes with the code
//! headers to see records land in the configured sinks:
//!
//! ```text
//! curl -X POST localhost:8080/api/users \
//!      -H 'X-Function-Code: F01' -H 'X-Action-Code: A01' \
//!      -d '{"name":"ada","email":"ada@example.com"}'
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Local};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use audit_relay::config::loader::load_config;
use audit_relay::observability::logging;
use audit_relay::{AuditConfig, AuditLayer};

#[derive(Parser)]
#[command(name = "audit-relay")]
#[command(about = "Demo API server with audit capture", long_about = None)]
struct Cli {
    /// TOML file with the audit settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Full listen address; overrides --port
    #[arg(short, long)]
    bind: Option<String>,

    #[arg(short, long, env = "APP_PORT", default_value_t = 8080)]
    port: u16,
}

impl Cli {
    fn listen_address(&self) -> String {
        self.bind
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.port))
    }
}

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u64,
    name: String,
    email: String,
    created: DateTime<Local>,
}

#[derive(Debug, Deserialize)]
struct CreateUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

#[derive(Default)]
struct Users {
    next_id: u64,
    items: Vec<User>,
}

type AppState = Arc<Mutex<Users>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init()?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AuditConfig::default(),
    };
    let audit = AuditLayer::new(config);
    tracing::info!(settings = ?audit.settings(), "Audit settings resolved");

    let app = router(audit);

    let listener = TcpListener::bind(cli.listen_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "audit-relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn router(audit: AuditLayer) -> Router {
    let state = AppState::default();

    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/health", get(health))
        .with_state(state)
        .layer(audit)
        .layer(TraceLayer::new_for_http())
}

async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    tracing::info!(
        function_code = ?headers.get("x-function-code"),
        module_code = ?headers.get("x-module-code"),
        action_code = ?headers.get("x-action-code"),
        "Creating user"
    );

    let Ok(request) = serde_json::from_slice::<CreateUser>(&body) else {
        return (StatusCode::BAD_REQUEST, "invalid request body").into_response();
    };
    if request.name.is_empty() || request.email.is_empty() {
        return (StatusCode::BAD_REQUEST, "name and email are required").into_response();
    }

    let Ok(mut users) = state.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    users.next_id += 1;
    let user = User {
        id: users.next_id,
        name: request.name,
        email: request.email,
        created: Local::now(),
    };
    users.items.push(user.clone());

    (StatusCode::CREATED, Json(user)).into_response()
}

async fn list_users(State(state): State<AppState>) -> Response {
    match state.lock() {
        Ok(users) => Json(users.items.clone()).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn get_user(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let Ok(users) = state.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    match users.items.iter().find(|u| u.id == id) {
        Some(user) => Json(user.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "user not found").into_response(),
    }
}

async fn health(State(state): State<AppState>) -> Response {
    let count = state.lock().map(|users| users.items.len()).unwrap_or_default();
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Local::now(),
        "users": count,
    }))
    .into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AuditLayer::new(AuditConfig::default()))
    }

    #[tokio::test]
    async fn test_create_then_get_user() {
        let app = app();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/users")
                    .header("X-Function-Code", "F01")
                    .header("X-Action-Code", "A01")
                    .body(Body::from(r#"{"name":"ada","email":"ada@example.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let user: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(user["id"], 1);

        let response = app
            .oneshot(Request::get("/api/users/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_user_rejected() {
        let response = app()
            .oneshot(
                Request::post("/api/users")
                    .body(Body::from(r#"{"name":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let response = app()
            .oneshot(Request::get("/api/users/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_listen_address() {
        let cli = Cli::parse_from(["audit-relay", "--port", "9000"]);
        assert_eq!(cli.listen_address(), "0.0.0.0:9000");

        let cli = Cli::parse_from(["audit-relay", "--bind", "127.0.0.1:7000"]);
        assert_eq!(cli.listen_address(), "127.0.0.1:7000");
    }
}
