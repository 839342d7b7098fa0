// libs/slot-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{account_gate, auth_middleware};

use crate::handlers;

pub fn slot_routes(state: Arc<AppConfig>) -> Router {
    // Layer order matters: auth_middleware is added last so it runs first
    // and seeds the User extension the account gate reads.
    let protected_routes = Router::new()
        .route("/", post(handlers::create_slot))
        .route("/", get(handlers::get_my_slots))
        .route("/open", get(handlers::get_open_slots))
        .route("/{slot_id}", put(handlers::update_slot))
        .route("/{slot_id}", delete(handlers::delete_slot))
        .layer(middleware::from_fn_with_state(state.clone(), account_gate))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
