pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::AppState;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::cache::read_through;

/// Build the public router.
///
/// Layer order matters: requests pass through response logging, then
/// caller propagation, then the response cache, before reaching handlers —
/// so the cache middleware sees the caller identity in extensions.
pub fn build_router(state: AppState) -> Router {
    let cache_state = state.cache.clone();

    Router::new()
        .route(
            "/participants",
            get(handlers::list_participants).post(handlers::create_participant),
        )
        .route("/participants/unassessed", get(handlers::list_unassessed))
        .route("/participants/ready", get(handlers::list_ready))
        .route("/participants/{id}", get(handlers::get_participant))
        .route("/assessors", get(handlers::list_assessors))
        .route("/assessors/{id}", get(handlers::get_assessor))
        .route("/regions/provinces", get(handlers::list_provinces))
        .route("/regions/regencies", get(handlers::list_regencies))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            cache_state,
            read_through,
        ))
        .layer(axum_middleware::from_fn(middleware::propagate_caller))
        .layer(axum_middleware::from_fn(middleware::log_responses))
}
