use std::sync::Arc;

use crate::auth::verifier::TokenVerifier;
use crate::db::queries::QueryRepository;
use crate::db::recommendations::RecommendationRepository;

/// Shared application state injected into every handler.
///
/// All dependencies are constructed once at startup and held for the
/// process lifetime; the repositories wrap a MongoDB client that is safe
/// for unbounded concurrent use.
#[derive(Clone)]
pub struct AppState {
    pub queries: Arc<dyn QueryRepository>,
    pub recommendations: Arc<dyn RecommendationRepository>,
    pub verifier: Arc<dyn TokenVerifier>,
}
