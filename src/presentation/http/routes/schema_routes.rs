use axum::{Router, routing::get};
use std::sync::Arc;

use crate::presentation::http::handlers::SchemaHandler;

pub fn schema_routes(schema_handler: Arc<SchemaHandler>) -> Router {
    Router::new()
        .route("/schemas", get(SchemaHandler::list_schemas))
        .route("/schemas/summary", get(SchemaHandler::summary))
        .route("/schemas/validate", get(SchemaHandler::validate))
        .route("/schemas/search", get(SchemaHandler::search))
        .with_state(schema_handler)
}
