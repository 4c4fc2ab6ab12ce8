//! Promtech Storefront library.
//!
//! JSON API, feeds and form relay for the storefront, exposed as a library
//! so the router can be driven directly in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod cms;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod seo;
pub mod services;
pub mod state;
pub mod stores;

use axum::Router;
use axum::extract::Request;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    routes::routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
