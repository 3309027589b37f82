//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Fanout API.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenVerifier;
use crate::classify::ClassifierRegistry;
use crate::config::AppConfig;
use crate::handlers;
use crate::render::Renderer;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub verifier: TokenVerifier,
    pub registry: Arc<ClassifierRegistry>,
    pub renderer: Arc<Renderer>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/webhooks/{service_type}/{token}",
            post(handlers::webhooks::receive_webhook),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> Result<()> {
    let public_key = config
        .auth_public_key
        .clone()
        .context("FANOUT_AUTH_PUBLIC_KEY is not configured")?;
    let verifier =
        TokenVerifier::from_pem(&public_key).context("webhook public key is not a valid RSA PEM")?;

    let addr = config.bind_addr().context("invalid server address")?;
    let profile = config.profile.clone();

    let state = AppState {
        db,
        config: Arc::new(config),
        verifier,
        registry: Arc::new(ClassifierRegistry::with_builtin()),
        renderer: Arc::new(Renderer::new()),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on: {addr}");
    println!("Running in profile: {profile}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::webhooks::receive_webhook,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::handlers::webhooks::WebhookResponse,
        )
    ),
    info(
        title = "Fanout API",
        description = "Webhook event classification and notification fan-out",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
