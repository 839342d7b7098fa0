// libs/consultation-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{account_gate, auth_middleware};

use crate::handlers::{
    cancel_consultation, get_my_consultations, get_specialist_consultations,
    request_consultation, update_consultation_status,
};

pub fn consultation_routes(state: Arc<AppConfig>) -> Router {
    // Layer order matters: auth_middleware is added last so it runs first
    // and seeds the User extension the account gate reads.
    let protected_routes = Router::new()
        .route("/", post(request_consultation).get(get_specialist_consultations))
        .route("/mine", get(get_my_consultations))
        .route("/{consultation_id}", patch(update_consultation_status))
        .route("/{consultation_id}/cancel", post(cancel_consultation))
        .layer(middleware::from_fn_with_state(state.clone(), account_gate))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
