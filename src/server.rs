//! HTTP API for enrollment and verification.
//!
//! Routes:
//!
//! ```text
//! GET  /api/                      health check
//! POST /api/sessions              enroll a training session
//! GET  /api/users/:user_id/stats  training progress
//! POST /api/verify                verify a typing sample
//! ```
//!
//! Handlers are thin: every decision is made by [`BiometricService`].

use crate::audit::create_shared_log_with_persistence;
use crate::config::{Config, GateConfig, VerifierConfig};
use crate::core::gate::ConsistencyGate;
use crate::core::verifier::{VerificationResult, Verifier};
use crate::error::BiometricsError;
use crate::service::{BiometricService, SessionReceipt, SessionRequest, UserStats};
use crate::store::JsonFileProfileStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Directory holding the profile store and audit stats
    pub data_path: PathBuf,
    /// Browser origins allowed by CORS
    pub cors_origins: Vec<String>,
    pub gate: GateConfig,
    pub verifier: VerifierConfig,
}

impl ServerConfig {
    pub fn new(port: u16, data_path: PathBuf) -> Self {
        let defaults = Config::default();
        Self {
            port,
            data_path,
            cors_origins: defaults.server.cors_origins,
            gate: defaults.gate,
            verifier: defaults.verifier,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            port: config.server.port,
            data_path: config.data_path.clone(),
            cors_origins: config.server.cors_origins.clone(),
            gate: config.gate,
            verifier: config.verifier,
        }
    }
}

/// Shared server state
pub struct ServerState {
    service: BiometricService<JsonFileProfileStore>,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Result<Self, BiometricsError> {
        let store = JsonFileProfileStore::open(config.data_path.join("profiles.json"))?;
        let audit = create_shared_log_with_persistence(config.data_path.join("audit.json"));

        let service = BiometricService::new(store)
            .with_gate(ConsistencyGate::from(&config.gate))
            .with_verifier(Verifier::from(&config.verifier))
            .with_audit_log(audit);

        Ok(Self { service })
    }

    fn save_audit(&self) {
        if let Err(e) = self.service.audit().save() {
            tracing::warn!("Failed to save audit stats: {}", e);
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: BiometricsError) -> ApiError {
    let (status, code) = match &err {
        BiometricsError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SESSION"),
        BiometricsError::InconsistentPattern { .. } => {
            (StatusCode::BAD_REQUEST, "INCONSISTENT_PATTERN")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
    };

    if !err.is_client_error() {
        tracing::error!("Request failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            detail: err.to_string(),
            code: code.to_string(),
        }),
    )
}

/// GET /api/
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: "keystroke-biometrics-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Unwrap a JSON body, reporting unparseable payloads as validation errors.
fn session_payload(
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<SessionRequest, ApiError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| api_error(BiometricsError::Validation(rejection.body_text())))
}

/// POST /api/sessions
async fn create_training_session(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionReceipt>, ApiError> {
    let payload = session_payload(payload)?;
    let result = state.service.enroll(&payload);
    state.save_audit();
    result.map(Json).map_err(api_error)
}

/// GET /api/users/:user_id/stats
async fn user_stats(
    State(state): State<Arc<ServerState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>, ApiError> {
    state.service.user_stats(&user_id).map(Json).map_err(api_error)
}

/// POST /api/verify
async fn verify_user(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<VerificationResult>, ApiError> {
    let payload = session_payload(payload)?;
    let result = state.service.verify(&payload);
    state.save_audit();
    result.map(Json).map_err(api_error)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the API router.
pub fn router(state: Arc<ServerState>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api", get(health))
        .route("/api/", get(health))
        .route("/api/sessions", post(create_training_session))
        .route("/api/users/:user_id/stats", get(user_stats))
        .route("/api/verify", post(verify_user))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config)?);
    let app = router(state, &config.cors_origins);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Keystroke biometrics API listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
