pub mod error;
pub mod oauth_handlers;
pub mod proxy;
pub mod state;

use std::sync::Arc;
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

pub use self::{error::AppError, state::AppState};

/// Build the relay router. Paths other than the four relay routes fall
/// through to the static `public_dir`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_dir = ServeDir::new(&state.config.server.public_dir);

    Router::new()
        .route("/login", get(oauth_handlers::login))
        .route("/callback", get(oauth_handlers::callback))
        .route("/token", get(oauth_handlers::token))
        .route("/playlist", get(proxy::playlist))
        .fallback_service(public_dir)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: crate::config::AppConfig) -> Result<(), anyhow::Error> {
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        warn!("Provider credentials not configured: {}", missing.join(", "));
    }

    let addr = (config.server.host.clone(), config.server.port);

    let app_state = Arc::new(AppState::new(config)?);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}
