use axum::{Router, extract::DefaultBodyLimit, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::ChatHandler;

/// Multipart framing allowance on top of the file size cap.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn chat_routes(chat_handler: Arc<ChatHandler>) -> Router {
    let upload_limit = chat_handler.max_upload_size() + MULTIPART_OVERHEAD;

    Router::new()
        .route("/answer", post(ChatHandler::answer))
        .route(
            "/uploadpdf",
            post(ChatHandler::upload_pdf).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(chat_handler)
}
