use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{departments, handlers, queue, ws, middleware as api_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Departments (narrow read surface)
        .route("/departments", get(departments::list_departments))
        // Queue commands and queries
        .route("/queue/{dept_id}/join", post(queue::join))
        .route("/queue/{dept_id}/next", post(queue::advance))
        .route("/queue/{dept_id}/status", get(queue::status))
        .route("/queue/{dept_id}/tickets", get(queue::list_active))
        .route("/holders/{holder_id}/tickets", get(queue::list_for_holder))
        // Change subscription
        .route("/queue/{dept_id}/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(api_middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
