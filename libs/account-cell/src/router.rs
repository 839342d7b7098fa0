// libs/account-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{account_gate, auth_middleware};

use crate::handlers::{block_user, confirm, login, register, unblock_user};

pub fn account_routes(state: Arc<AppConfig>) -> Router {
    // Registration, confirmation and login run before any identity exists.
    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/confirm/{token}", get(confirm))
        .route("/login", post(login));

    // Layer order matters: auth_middleware is added last so it runs first
    // and seeds the User extension the account gate reads.
    let protected_routes = Router::new()
        .route("/block", post(block_user))
        .route("/unblock", post(unblock_user))
        .layer(middleware::from_fn_with_state(state.clone(), account_gate))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
