//! lexlink HTTP service.
//!
//! Serves statute linking, entity extraction and training-data generation
//! (see `lexlink::server` for the route table).
//!
//! Configuration comes from `$XDG_CONFIG_HOME/lexlink/config.toml`, or the
//! file named by `LEXLINK_CONFIG`; `LEXLINK_BIND` / `LEXLINK_PORT` override the
//! listen address.
//!
//! Build and run: `cargo run --features server --bin lexlinkd`

use std::path::PathBuf;
use std::sync::Arc;

use lexlink::config::LexConfig;
use lexlink::paths::LexPaths;
use lexlink::server::{ServerState, router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let paths = LexPaths::resolve().unwrap_or_else(|e| {
        tracing::error!("failed to resolve XDG paths: {e}");
        std::process::exit(1);
    });
    if let Err(e) = paths.ensure_dirs() {
        tracing::error!("failed to create XDG directories: {e}");
        std::process::exit(1);
    }

    let config = match std::env::var_os("LEXLINK_CONFIG").map(PathBuf::from) {
        Some(file) => LexConfig::load(&file).and_then(|mut c| c.apply_env().map(|()| c)),
        None => LexConfig::load_or_default(&paths),
    }
    .unwrap_or_else(|e| {
        tracing::error!("failed to load config: {e}");
        std::process::exit(1);
    });

    let state = ServerState::new(&config, paths.scratch_dir()).unwrap_or_else(|e| {
        tracing::error!("failed to initialize: {e}");
        std::process::exit(1);
    });
    let app = router(Arc::new(state));

    let addr = config.server.addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("lexlink server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
