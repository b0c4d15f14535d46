use insider::{
    config::AppConfig, scheduler::start_reveal_sweep, session::PlayerTokens, shared::AppState,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insider=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Insider game server");

    let config = AppConfig::from_env();
    let app_state = AppState::in_memory(
        config.coordinator.clone(),
        PlayerTokens::from_config(&config),
    );

    let sweep = tokio::spawn(start_reveal_sweep(
        app_state.coordinator.clone(),
        config.coordinator.reveal_sweep_interval,
    ));

    let app = insider::app(app_state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind_address = %config.bind_address, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    info!("Server running on http://{}", config.bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
    }
    sweep.abort();
}
