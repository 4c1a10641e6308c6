use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::presentation::http::{
    handlers::{ChatHandler, DataHandler, HealthHandler, SchemaHandler},
    routes::{chat_routes, data_routes, health_routes, schema_routes},
};

const REQUEST_OVERHEAD: usize = 2 * 1024 * 1024;

pub struct HttpServer {
    chat_handler: Arc<ChatHandler>,
    data_handler: Arc<DataHandler>,
    health_handler: Arc<HealthHandler>,
    schema_handler: Arc<SchemaHandler>,
    bind_address: String,
}

impl HttpServer {
    pub fn new(
        chat_handler: Arc<ChatHandler>,
        data_handler: Arc<DataHandler>,
        health_handler: Arc<HealthHandler>,
        schema_handler: Arc<SchemaHandler>,
        bind_address: String,
    ) -> Self {
        Self {
            chat_handler,
            data_handler,
            health_handler,
            schema_handler,
            bind_address,
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        let body_limit = self.chat_handler.max_upload_size() + REQUEST_OVERHEAD;

        Router::new()
            .merge(health_routes(self.health_handler.clone()))
            .merge(chat_routes(self.chat_handler.clone()))
            .merge(data_routes(self.data_handler.clone()))
            .merge(schema_routes(self.schema_handler.clone()))
            .layer(cors)
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let listener = TcpListener::bind(&self.bind_address).await?;
        info!("EventBot listening on {}", self.bind_address);
        axum::serve(listener, app).await?;

        Ok(())
    }
}
