//! Permwatch relay composition root.

#![forbid(unsafe_code)]

mod handlers;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use permwatch_application::RelayService;
use permwatch_core::AppError;
use permwatch_infrastructure::HttpChatNotifier;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let webhook_url = required_env("CHAT_WEBHOOK_URL")?;
    let relay_host = env::var("RELAY_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let relay_port = env::var("RELAY_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let http_client = reqwest::Client::new();
    let notifier = Arc::new(HttpChatNotifier::new(http_client, webhook_url));
    let app_state = AppState {
        relay_service: RelayService::new(notifier),
    };

    let app = Router::new()
        .route("/", post(handlers::push_handler))
        .route("/healthz", get(handlers::health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let host = IpAddr::from_str(&relay_host)
        .map_err(|error| AppError::Internal(format!("invalid RELAY_HOST '{relay_host}': {error}")))?;
    let address = SocketAddr::from((host, relay_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "permwatch-relay listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("relay server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
