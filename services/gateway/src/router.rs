use std::sync::Arc;

use axum::routing::{get, on, post};
use axum::{Extension, Router};

use comply_core::health::{healthz, readyz};
use comply_core::middleware::with_common_layers;

use crate::domain::route::{
    ANALYTICS_EVENTS_PATH, ANALYTICS_STATS_PATH, ANALYTICS_WS_PATH, route_table,
};
use crate::handlers::{analytics, health, proxy, ws};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health, outside the pipeline
        .route("/health", get(health::health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<AppState>))
        // Local live feed
        .route(ANALYTICS_WS_PATH, get(ws::analytics))
        .route(ANALYTICS_STATS_PATH, get(analytics::stats))
        .route(ANALYTICS_EVENTS_PATH, post(analytics::publish));

    // Proxied routes, each carrying its own policy
    for entry in route_table() {
        router = router.route(
            entry.path,
            on(entry.methods, proxy::forward).layer(Extension(Arc::new(entry.route))),
        );
    }

    with_common_layers(router.with_state(state))
}
