//! # pyro-stub: In-memory portal backend
//!
//! Serves the REST surface `pyro-client` calls, backed by `DashMap`s, so the
//! portal and CLI can run end to end without cloud infrastructure. Data is
//! lost on restart.
//!
//! The stub enforces the same rules the portal checks locally: role
//! permissions from the [`PermissionTable`](pyro_state::PermissionTable),
//! the status lifecycle, inspector county scoping, approval and rejection
//! payloads, and the `ExpectedLastModified` version token.
//!
//! ## Authentication
//!
//! `Authorization: Bearer <user id>`. The token is trusted as-is. An
//! `admin` account is seeded at startup to hand out roles.

pub mod auth;
pub mod error;
pub mod routes;
pub mod store;

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use store::{AppState, StubConfig};

/// Assemble the router with every route and the trace layer.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::applications::router())
        .merge(routes::documents::router())
        .merge(routes::users::router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".into())
}

/// A stub serving on a bound socket.
pub struct RunningStub {
    pub addr: SocketAddr,
    pub state: AppState,
    pub handle: JoinHandle<()>,
}

impl RunningStub {
    /// `http://<addr>`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Bind `addr` and serve in a background task. Port 0 picks a free port;
/// when `public_url` is `None` the stub advertises the bound address.
pub async fn spawn(
    addr: SocketAddr,
    public_url: Option<String>,
    configure: impl FnOnce(StubConfig) -> StubConfig,
) -> std::io::Result<RunningStub> {
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    let public_url = public_url.unwrap_or_else(|| format!("http://{addr}"));
    let state = AppState::new(configure(StubConfig::new(public_url)));
    let router = app(state.clone());
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            tracing::error!(error = %e, "stub server stopped");
        }
    });
    tracing::info!("pyro-stub listening on {addr}");
    Ok(RunningStub {
        addr,
        state,
        handle,
    })
}
