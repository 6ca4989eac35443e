//! HTTP front end for the dependency mapper.
//!
//! # Routes
//!
//! - `GET /registry/:package/:version` - the resolved tree as JSON (see
//!   [`crate::models`] for the wire format). Scoped names are passed with the
//!   slash encoded, e.g. `/registry/@types%2Fnode/^20.0.0`.
//! - `GET /health` - `200 ok`
//!
//! Invalid input is answered with `400` and `{"error": "<message>"}`. That
//! includes an empty package or version segment (`/registry/a/`,
//! `/registry//1.0.0`), which gets its own route because a path parameter
//! never matches an empty segment.

use anyhow::{Context, Result};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::DepmapConfig;
use crate::core::DepmapError;
use crate::models::PackageNode;
use crate::registry::Registry;
use crate::resolver::DependencyMapper;

/// Error returned by a handler, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Message placed in the `error` field.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DepmapError> for ApiError {
    fn from(error: DepmapError) -> Self {
        let status = if error.is_invalid_input() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Build the application router around a shared mapper.
pub fn router<R: Registry>(mapper: Arc<DependencyMapper<R>>) -> Router {
    Router::new()
        .route("/registry/:package/:version", get(dependency_tree_handler::<R>))
        .route("/registry/:package/", get(missing_version_handler::<R>))
        .route("/registry//:version", get(missing_package_handler::<R>))
        .route("/registry//", get(missing_package_handler::<R>))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(mapper)
}

/// GET /registry/:package/:version
pub async fn dependency_tree_handler<R: Registry>(
    State(mapper): State<Arc<DependencyMapper<R>>>,
    Path((package, version)): Path<(String, String)>,
) -> Result<Json<PackageNode>, ApiError> {
    let tree = mapper.get_dependency_tree(&package, &version).await?;
    Ok(Json(tree))
}

/// GET /registry/:package/
async fn missing_version_handler<R: Registry>(
    State(mapper): State<Arc<DependencyMapper<R>>>,
    Path(package): Path<String>,
) -> Result<Json<PackageNode>, ApiError> {
    dependency_tree_handler(State(mapper), Path((package, String::new()))).await
}

/// GET /registry//:version and /registry//
async fn missing_package_handler<R: Registry>(
    State(mapper): State<Arc<DependencyMapper<R>>>,
) -> Result<Json<PackageNode>, ApiError> {
    dependency_tree_handler(State(mapper), Path((String::new(), String::new()))).await
}

/// GET /health
pub async fn health_handler() -> &'static str {
    "ok"
}

async fn logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed = started.elapsed();
    if status.is_server_error() {
        warn!("{} {} -> {} ({:.2?})", method, path, status.as_u16(), elapsed);
    } else {
        info!("{} {} -> {} ({:.2?})", method, path, status.as_u16(), elapsed);
    }
    response
}

/// Bind the configured address.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn bind(config: &DepmapConfig) -> Result<TcpListener> {
    let address = config.bind_socket_addr()?;
    TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to address: {address}"))
}

/// Serve on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`DepmapError::ServerError`] if the server stops abnormally.
pub async fn serve_with_shutdown<R, F>(
    listener: TcpListener,
    mapper: Arc<DependencyMapper<R>>,
    shutdown: F,
) -> Result<()>
where
    R: Registry,
    F: Future<Output = ()> + Send + 'static,
{
    let address: SocketAddr =
        listener.local_addr().context("Failed to get local address for the server")?;
    info!("depmap server is running at http://{}", address);

    axum::serve(listener, router(mapper))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| DepmapError::ServerError {
            reason: e.to_string(),
        })?;

    info!("depmap server stopped");
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if binding fails or the server stops abnormally.
pub async fn run<R: Registry>(config: &DepmapConfig, mapper: Arc<DependencyMapper<R>>) -> Result<()> {
    let listener = bind(config).await?;
    serve_with_shutdown(listener, mapper, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
