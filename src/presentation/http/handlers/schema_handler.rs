use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use crate::application::services::SchemaManagerService;
use crate::domain::repositories::schema_registry::SchemaRegistryError;
use crate::presentation::http::dto::{
    ApiResponse, SchemaListResponseDto, SchemaSearchParams, SchemaSearchResponseDto,
    ValidationResponseDto,
};

type JsonResponse<T> = (StatusCode, Json<ApiResponse<T>>);

fn respond<T: Serialize>(result: Result<T, SchemaRegistryError>) -> JsonResponse<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(
                "SCHEMA_REGISTRY_ERROR".to_string(),
                e.to_string(),
                None,
            )),
        ),
    }
}

pub struct SchemaHandler {
    schema_manager: Arc<SchemaManagerService>,
}

impl SchemaHandler {
    pub fn new(schema_manager: Arc<SchemaManagerService>) -> Self {
        Self { schema_manager }
    }

    pub async fn list_schemas(State(handler): State<Arc<SchemaHandler>>) -> impl IntoResponse {
        let result = handler
            .schema_manager
            .all_schemas()
            .await
            .map(|schemas| SchemaListResponseDto {
                total_tables: schemas.len(),
                schemas,
            });
        respond(result)
    }

    pub async fn summary(State(handler): State<Arc<SchemaHandler>>) -> impl IntoResponse {
        respond(handler.schema_manager.summary().await)
    }

    pub async fn validate(State(handler): State<Arc<SchemaHandler>>) -> impl IntoResponse {
        respond(
            handler
                .schema_manager
                .validate()
                .await
                .map(ValidationResponseDto::from),
        )
    }

    pub async fn search(
        State(handler): State<Arc<SchemaHandler>>,
        Query(params): Query<SchemaSearchParams>,
    ) -> impl IntoResponse {
        let keyword = params.keyword.trim().to_string();
        if keyword.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "MISSING_KEYWORD".to_string(),
                    "Query parameter 'keyword' is required".to_string(),
                    None,
                )),
            );
        }

        let result = handler
            .schema_manager
            .search_tables(&keyword)
            .await
            .map(|results| SchemaSearchResponseDto {
                total_matches: results.len(),
                keyword,
                results,
            });
        respond(result)
    }
}
