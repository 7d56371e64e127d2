//! Permit portal stub server: standalone development backend.
//!
//! Environment:
//! - `PYRO_STUB_PORT` (default 8095)
//! - `PYRO_STUB_PUBLIC_URL` (default `http://127.0.0.1:<port>`), the base
//!   presigned and signed URLs point at
//! - `PYRO_STUB_PERMISSIONS`, optional YAML/JSON permission table
//! - `RUST_LOG` (default `info`)

use std::net::SocketAddr;
use std::path::Path;

use pyro_state::PermissionTable;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PYRO_STUB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8095);
    let public_url = std::env::var("PYRO_STUB_PUBLIC_URL")
        .ok()
        .or_else(|| Some(format!("http://127.0.0.1:{port}")));

    let permissions = match std::env::var("PYRO_STUB_PERMISSIONS") {
        Ok(path) => match PermissionTable::load(Path::new(&path)) {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(error = %e, "failed to load permission table");
                std::process::exit(1);
            }
        },
        Err(_) => PermissionTable::default(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let stub = match pyro_stub::spawn(addr, public_url, |c| c.with_permissions(permissions)).await {
        Ok(stub) => stub,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind listener");
            std::process::exit(1);
        }
    };
    if let Err(e) = stub.handle.await {
        tracing::error!(error = %e, "server task failed");
        std::process::exit(1);
    }
}
