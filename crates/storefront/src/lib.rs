//! Nightcap storefront library.
//!
//! A backend-for-frontend for the Nightcap delivery app. It keeps each
//! visitor's cart, selections, sign-in and notifications in a server-side
//! session and proxies catalog, address, order and payment calls to the
//! ordering backend. Every route speaks JSON.
//!
//! The router is exposed through [`app`] so tests can run it against an
//! in-memory session store and a mock backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, http::Request};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::state::AppState;

/// Build the complete storefront application.
///
/// Layers, outermost first: Sentry, tracing, request ID, security headers,
/// session. Serve it with `into_make_service_with_connect_info::<SocketAddr>()`
/// so the sign-in rate limiter can key on the peer address.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(store, state.config());

    Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
