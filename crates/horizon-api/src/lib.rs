//! JSON HTTP API over the dashboard
//!
//! Routes are organized into modules:
//! - routes::accounts: account overview and detail
//! - routes::transactions: paged feed and category counts
//! - routes::share: shareable identifier resolution

pub mod error;
pub mod routes;

use axum::{routing::get, Router};
use horizon_config::Config;
use horizon_core::Dashboard;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::accounts::{api_account_detail, api_user_accounts};
    use routes::share::api_resolve_share;
    use routes::transactions::{api_account_categories, api_account_transactions};

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/users/:user_id/accounts", get(api_user_accounts))
        .route("/api/accounts/:bank_link_id", get(api_account_detail))
        .route(
            "/api/accounts/:bank_link_id/transactions",
            get(api_account_transactions),
        )
        .route(
            "/api/accounts/:bank_link_id/categories",
            get(api_account_categories),
        )
        .route("/api/share/:encoded_id", get(api_resolve_share))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Start the HTTP server and run until ctrl-c
pub async fn start_server(config: Config, dashboard: Dashboard) -> std::io::Result<()> {
    let addr = config.bind_address();
    let router = create_router(AppState { dashboard, config });

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting horizon server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - /api/users/:user_id/accounts (Account overview)");
    log::info!("  - /api/accounts/:bank_link_id (Account detail)");
    log::info!("  - /api/accounts/:bank_link_id/transactions (Transaction feed)");
    log::info!("  - /api/accounts/:bank_link_id/categories (Category counts)");
    log::info!("  - /api/share/:encoded_id (Shareable links)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for shutdown signal: {}", e);
    }
}
