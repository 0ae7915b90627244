//! JSON HTTP API over the place finder.

mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::Result;
use crate::finder::PlaceFinder;

pub fn build_router(finder: Arc<PlaceFinder>) -> Router {
    let state = Arc::new(AppState { finder });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/categories", get(handlers::categories))
        .route("/api/geocode", get(handlers::geocode))
        .route("/api/places", get(handlers::places))
        .route("/api/search", get(handlers::search))
        .route("/api/directions", get(handlers::directions))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, finder: Arc<PlaceFinder>) -> Result<()> {
    let app = build_router(finder);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "server listening");
    eprintln!("  Place Finder server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;
    Ok(())
}
