use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::layout::FontSet;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    /// Resolved once at startup; each PDF request builds its own engine from it.
    pub fonts: FontSet,
    /// Session verifier. `None` when AUTH_SERVICE_URL is unset.
    pub token_verifier: Option<Arc<dyn TokenVerifier>>,
}
