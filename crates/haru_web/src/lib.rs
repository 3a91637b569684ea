use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use haru_core::Result;

pub mod auth;
pub mod handlers;
pub mod state;

pub use auth::AuthState;
pub use state::AppState;

/// Assemble the API router. Listing and reading issues is public; mutations,
/// crawl operations and the meal analyzer sit behind the admin guard.
pub fn create_app(state: AppState, auth: AuthState) -> Router {
    let admin = Router::new()
        .route("/issues", post(handlers::create_issue))
        .route(
            "/issues/:id",
            put(handlers::update_issue).delete(handlers::delete_issue),
        )
        .route("/issues/crawl", get(handlers::crawl))
        .route("/issues/crawl-range", get(handlers::crawl_range))
        .route("/issues/crawl-next", get(handlers::crawl_next))
        .route("/issues/crawl-previous", get(handlers::crawl_previous))
        .route("/issues/monthly-crawl", get(handlers::monthly_crawl))
        .route("/issues/manual-crawl", get(handlers::manual_crawl))
        .route("/issues/crawler-status", get(handlers::crawler_status))
        .route("/issues/cleanup-oldest", get(handlers::cleanup_oldest))
        .route("/meals/analyze", post(handlers::analyze_meal))
        .layer(middleware::from_fn_with_state(auth, auth::admin_middleware));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/issues", get(handlers::list_issues))
        .route("/issues/:id", get(handlers::get_issue))
        .merge(admin)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

pub async fn serve(app: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
