use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use account_cell::router::account_routes;
use consultation_cell::router::consultation_routes;
use shared_config::AppConfig;
use slot_cell::router::slot_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Consultation API is running!" }))
        .nest("/accounts", account_routes(state.clone()))
        .nest("/slots", slot_routes(state.clone()))
        .nest("/consultations", consultation_routes(state.clone()))
}
