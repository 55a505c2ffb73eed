use std::net::SocketAddr;
use std::process::ExitCode;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use gatherly_server::config::Config;
use gatherly_server::routes::create_routes;
use gatherly_server::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    let port = config.port;

    let state = match AppState::bootstrap(config).await {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let app = create_routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "Failed to bind address");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("🚀 Server running at http://{}", addr);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "Server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
