use std::sync::Arc;

use crate::advisor::Advisor;
use crate::marketplace::AffiliateLinks;
use crate::profiles::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub advisor: Advisor,
    /// PostgreSQL-backed when DATABASE_URL is set, in-memory otherwise.
    pub profiles: Arc<dyn ProfileStore>,
    pub links: AffiliateLinks,
}
