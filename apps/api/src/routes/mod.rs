pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_auth;
use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Resume API (authenticated when a verifier is configured)
    let api = Router::new()
        .route(
            "/api/v001/resume/basic/question",
            get(handlers::handle_base_questions),
        )
        .route(
            "/api/v001/resume/question/get",
            post(handlers::handle_follow_up_questions),
        )
        .route(
            "/api/v001/resume/label/generate",
            post(handlers::handle_generate_labels),
        )
        .route(
            "/api/v001/resume/label/regenerate",
            post(handlers::handle_regenerate_labels),
        )
        .route(
            "/api/v001/resume/pdf/generate",
            post(handlers::handle_generate_pdf),
        );

    let api = match state.token_verifier.clone() {
        Some(verifier) => api.route_layer(middleware::from_fn_with_state(verifier, require_auth)),
        None => api,
    };

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api)
        .with_state(state)
}
