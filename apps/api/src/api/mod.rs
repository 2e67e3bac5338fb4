//! API routes module
//!
//! Wires the campaigns domain to HTTP routes.

pub mod health;

use axum::Router;
use domain_campaigns::{handlers, CampaignService};
use stream_worker::StatusStore;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes<S: StatusStore + 'static>(service: CampaignService<S>) -> Router {
    Router::new().nest("/v1", handlers::router(service))
}
