use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::use_cases::HealthCheckUseCase;
use crate::presentation::http::dto::{ApiResponse, EndpointDto, RootResponseDto};

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Service health"),
    ("POST", "/answer", "Answer a question"),
    ("POST", "/uploadpdf", "Upload a PDF (multipart field `file`)"),
    ("POST", "/clearalldata", "Clear vectors, tables and schemas"),
    ("GET", "/datasummary", "Counts across all stores"),
    ("GET", "/schemas", "Registered table schemas"),
    ("GET", "/schemas/summary", "Schema registry summary"),
    ("GET", "/schemas/validate", "Schema registry validation"),
    ("GET", "/schemas/search", "Search schemas by keyword"),
];

pub struct HealthHandler {
    health_use_case: Arc<HealthCheckUseCase>,
}

impl HealthHandler {
    pub fn new(health_use_case: Arc<HealthCheckUseCase>) -> Self {
        Self { health_use_case }
    }

    pub async fn root() -> impl IntoResponse {
        let dto = RootResponseDto {
            message: "PDF Assistant Chatbot API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints: ENDPOINTS
                .iter()
                .map(|&(method, path, description)| EndpointDto {
                    method,
                    path,
                    description,
                })
                .collect(),
        };

        (StatusCode::OK, Json(ApiResponse::success(dto)))
    }

    pub async fn health(State(handler): State<Arc<HealthHandler>>) -> impl IntoResponse {
        let response = handler.health_use_case.execute().await;
        let status = if response.healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (status, Json(ApiResponse::success(response)))
    }
}
