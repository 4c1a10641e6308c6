use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::DataHandler;

pub fn data_routes(data_handler: Arc<DataHandler>) -> Router {
    Router::new()
        .route("/clearalldata", post(DataHandler::clear_all_data))
        .route("/datasummary", get(DataHandler::data_summary))
        .with_state(data_handler)
}
