//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for the API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bulkmailer API",
        version = "0.1.0",
        description = "Bulk email submission with background delivery over a Redis-backed task queue",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/v1", api = domain_campaigns::ApiDoc)
    ),
    tags(
        (name = "emails", description = "Bulk email submission and delivery tracking")
    )
)]
pub struct ApiDoc;
