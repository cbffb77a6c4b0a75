use marketplace_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, builds the access policy and serves
/// the guarded front-end.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (fail fast on missing production settings)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup: RUST_LOG wins, otherwise verbose for the gate itself
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_gate=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(
        env = ?config.env,
        token_mode = ?config.token_mode,
        unmatched_policy = ?config.unmatched_policy,
        "marketplace gate starting"
    );

    // 4. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::from_config(config)
        .unwrap_or_else(|e| panic!("FATAL: invalid gate configuration: {e}"));

    // 5. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: cannot bind {bind_addr}: {e}"));

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
    }
}
