//! Route definitions for the redirect service
//!
//! This module maps every HTTP route to its handler and attaches the shared
//! application state.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::database::AppState;
use crate::handler::{create_short_url, index, redirect_url, visit_log};

/// Creates the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /` - Shortening form
/// - `POST /url` - Creates a new short link
/// - `GET /url/analytics/{short_id}` - Raw visit log of a short link
/// - `GET /{short_id}` - Redirects to the original URL and records the visit
///
/// CORS is fully open so the form can also be served from another origin.
///
/// # Example Usage
///
/// ```no_run
/// # use shortlink::config::Config;
/// # use shortlink::database::{init_db, AppState};
/// # use shortlink::route::create_app;
/// let config = Config::default();
/// let db = init_db(&config.database_url).unwrap();
/// let app = create_app(AppState::new(db, &config));
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let url_routes = Router::new()
        .route("/", post(create_short_url))
        .route("/analytics/{short_id}", get(visit_log));

    Router::new()
        .route("/", get(index))
        .route("/{short_id}", get(redirect_url))
        .nest("/url", url_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
