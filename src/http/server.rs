//! Inspector HTTP server.
//!
//! # Responsibilities
//! - Create Axum Router with the inspection endpoints
//! - Wire up middleware (tracing, timeout, request ID)
//! - Resolve live requests against the current registry
//! - Swap in rebuilt registries when declarations change
//!
//! # Endpoints
//! - `ANY /routes/{handler}/{*path}`: route resolution for the request as sent
//! - `POST /navigate/{handler}`: dry-run navigation for an outcome event
//! - `GET /handlers`: declared handler names

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::{parse_method, AppConfig, ServerConfig};
use crate::handler::{HandlerRegistry, RegistryError};
use crate::http::request::{request_id, RequestIdLayer};
use crate::navigation::engine::{DryRunInvoker, NavigationError};
use crate::navigation::outcome::{Destination, Fault, OutcomeEvent};
use crate::observability::metrics;
use crate::routing::request::{RequestDescriptor, RequestParams};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ArcSwap<HandlerRegistry>>,
}

/// HTTP server for the inspector.
pub struct InspectorServer {
    router: Router,
    registry: Arc<ArcSwap<HandlerRegistry>>,
}

impl InspectorServer {
    /// Create a new server around an already built registry.
    pub fn new(registry: HandlerRegistry, config: &ServerConfig) -> Self {
        let registry = Arc::new(ArcSwap::from_pointee(registry));
        let state = AppState {
            registry: registry.clone(),
        };
        let router = Self::build_router(config, state);
        Self { router, registry }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/handlers", get(list_handlers))
            .route("/routes/{handler}", any(resolve_root))
            .route("/routes/{handler}/{*path}", any(resolve_path))
            .route("/navigate/{handler}", post(navigate))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.request_timeout_secs),
            ))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared handle to the live registry.
    pub fn registry(&self) -> Arc<ArcSwap<HandlerRegistry>> {
        self.registry.clone()
    }

    /// Rebuild and swap the registry for each configuration received.
    pub fn spawn_reloader(&self, mut updates: mpsc::UnboundedReceiver<AppConfig>) -> JoinHandle<()> {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            while let Some(config) = updates.recv().await {
                match reload(&config) {
                    Ok(rebuilt) => {
                        let handlers = rebuilt.handler_names().len();
                        registry.store(Arc::new(rebuilt));
                        metrics::record_reload("applied");
                        tracing::info!(handlers, "Registry reloaded");
                    }
                    Err(e) => {
                        metrics::record_reload("rejected");
                        tracing::error!(error = %e, "Rebuilt registry rejected; keeping current");
                    }
                }
            }
        })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Inspector server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Inspector server stopped");
        Ok(())
    }
}

fn reload(config: &AppConfig) -> Result<HandlerRegistry, Box<dyn std::error::Error + Send + Sync>> {
    let registry = config.build_registry()?;
    registry.warm()?;
    Ok(registry)
}

/// JSON error body with a status derived from the failure.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        let status = match &error {
            RegistryError::UnknownHandler(_) => StatusCode::NOT_FOUND,
            RegistryError::Routing(_) => StatusCode::CONFLICT,
            RegistryError::Navigation(NavigationError::ConflictingNavigationTarget { .. }) => {
                StatusCode::CONFLICT
            }
            RegistryError::Navigation(NavigationError::Invocation(_)) | RegistryError::Declaration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// One candidate operation in a route report.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MatchView {
    pub operation: String,
    pub name: String,
    pub matched_paths: Vec<String>,
}

/// Route resolution report.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutesResponse {
    pub handler: String,
    pub path: String,
    pub method: String,
    pub operations: Vec<MatchView>,
    pub allowed_methods: Vec<String>,
}

/// Dry-run navigation input.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigateRequest {
    pub outcome: Option<String>,
    pub from_action: Option<String>,
    pub fault: Option<Fault>,
    /// Request path whose route order applies to method-scope rules.
    pub path: Option<String>,
    pub method: Option<String>,
    pub params: BTreeMap<String, String>,
}

/// Dry-run navigation result; `destination` is null for "no navigation".
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct NavigateResponse {
    pub destination: Option<Destination>,
}

async fn list_handlers(State(state): State<AppState>) -> Json<Vec<String>> {
    let registry = state.registry.load();
    Json(registry.handler_names().into_iter().map(str::to_string).collect())
}

async fn resolve_root(
    State(state): State<AppState>,
    Path(handler): Path<String>,
    request: Request<Body>,
) -> Result<Json<RoutesResponse>, ApiError> {
    resolve(&state, handler, "/".to_string(), &request)
}

async fn resolve_path(
    State(state): State<AppState>,
    Path((handler, path)): Path<(String, String)>,
    request: Request<Body>,
) -> Result<Json<RoutesResponse>, ApiError> {
    resolve(&state, handler, format!("/{path}"), &request)
}

fn resolve(
    state: &AppState,
    handler: String,
    lookup_path: String,
    request: &Request<Body>,
) -> Result<Json<RoutesResponse>, ApiError> {
    let params = request
        .uri()
        .query()
        .map(RequestParams::from_query)
        .unwrap_or_default();
    let descriptor = RequestDescriptor::new(lookup_path, request.method().clone()).with_params(params);
    tracing::debug!(
        request_id = request_id(request).unwrap_or("unknown"),
        handler = %handler,
        path = %descriptor.lookup_path(),
        "Inspecting route"
    );

    let registry = state.registry.load();
    let resolution = registry.resolve_route(&handler, &descriptor)?;

    Ok(Json(RoutesResponse {
        path: descriptor.lookup_path().to_string(),
        method: descriptor.method().to_string(),
        operations: resolution
            .matches()
            .iter()
            .map(|candidate| MatchView {
                operation: candidate.id().to_string(),
                name: candidate.id().name().to_string(),
                matched_paths: candidate.matched_paths.clone(),
            })
            .collect(),
        allowed_methods: resolution
            .allowed_methods()
            .iter()
            .map(ToString::to_string)
            .collect(),
        handler,
    }))
}

async fn navigate(
    State(state): State<AppState>,
    Path(handler): Path<String>,
    Json(body): Json<NavigateRequest>,
) -> Result<Json<NavigateResponse>, ApiError> {
    let event = OutcomeEvent {
        from_action: body.from_action,
        outcome: body.outcome,
        fault: body.fault,
    };
    let registry = state.registry.load();

    let destination = match body.path {
        Some(path) => {
            let method = match body.method.as_deref() {
                Some(verb) => parse_method(verb)
                    .ok_or_else(|| ApiError::bad_request(format!("unknown verb '{verb}'")))?,
                None => axum::http::Method::GET,
            };
            let mut params = RequestParams::new();
            for (name, value) in body.params {
                params.insert(name, value);
            }
            let request = RequestDescriptor::new(path, method).with_params(params);
            registry.navigate_request(&handler, &request, &event, &DryRunInvoker)?
        }
        None => registry.navigate(&handler, &[], &event, &DryRunInvoker)?,
    };

    Ok(Json(NavigateResponse { destination }))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
