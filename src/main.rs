mod config;
mod db;
mod pages;
mod routes;
mod services;
mod session;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Optional local overrides; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env().expect("invalid configuration");

    let store = services::open_record_store(&config.store)
        .await
        .expect("role store init failed");
    let authenticator: Arc<dyn services::authenticator::Authenticator> =
        Arc::from(services::authenticator::from_config(&config.auth).expect("authenticator init failed"));
    if config.auth == config::AuthProviderConfig::Dev {
        tracing::warn!("AUTH_PROVIDER=dev: any password is accepted");
    }

    let port = config.port;
    let sweep_interval = config.client_sweep_interval;
    let client_idle = config.client_idle;
    let state = state::AppState::new(config, store, authenticator);

    // Spawn background eviction of idle browser sessions.
    let sweeper = services::clients::spawn_client_sweeper(state.clients.clone(), sweep_interval, client_idle);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "lms listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    sweeper.abort();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
