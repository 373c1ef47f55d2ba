//! arena gateway binary.
//!
//! - WebSocket endpoint: /v1/ws?token=...
//! - Config from `ARENA_CONFIG` (default `arena.yaml`)
//! - Log filter from `RUST_LOG`

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use arena_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("ARENA_CONFIG").unwrap_or_else(|_| "arena.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| format!("gateway.listen must be a valid SocketAddr: {e}"))?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "arena-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app).await?;
    Ok(())
}
