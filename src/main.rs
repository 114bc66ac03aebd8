use tracing_subscriber::{fmt, EnvFilter};

use health_window::{config, server, AppState};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 1. Load config ───────────────────────────────────────────
    let cfg = config::load_from_env().expect("config load failed");
    let listen = cfg
        .server
        .listen_addr()
        .expect("server.listen must be a valid SocketAddr");

    // ── 2. Build shared state (the one aggregator for this process) ──
    let state = AppState::new(&cfg);
    let m = &cfg.metrics;
    tracing::info!(
        error_window_secs = m.error_window_secs,
        latency_window_secs = m.latency_window_secs,
        error_threshold = m.error_threshold,
        latency_threshold_ms = m.latency_threshold_ms,
        min_error_samples = m.min_error_samples,
        min_latency_samples = m.min_latency_samples,
        "metrics aggregator configured"
    );

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind listen address");

    tracing::info!(%listen, "health-window listening");

    axum::serve(listener, app)
        .await
        .expect("Server exited with error");
}
