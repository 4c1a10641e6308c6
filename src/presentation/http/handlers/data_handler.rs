use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::use_cases::{ClearAllDataUseCase, DataSummaryUseCase};
use crate::presentation::http::dto::ApiResponse;

pub struct DataHandler {
    clear_use_case: Arc<ClearAllDataUseCase>,
    summary_use_case: Arc<DataSummaryUseCase>,
}

impl DataHandler {
    pub fn new(
        clear_use_case: Arc<ClearAllDataUseCase>,
        summary_use_case: Arc<DataSummaryUseCase>,
    ) -> Self {
        Self {
            clear_use_case,
            summary_use_case,
        }
    }

    pub async fn clear_all_data(State(handler): State<Arc<DataHandler>>) -> impl IntoResponse {
        let response = handler.clear_use_case.execute().await;
        let status = if response.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(ApiResponse::success(response)))
    }

    pub async fn data_summary(State(handler): State<Arc<DataHandler>>) -> impl IntoResponse {
        let summary = handler.summary_use_case.execute().await;
        (StatusCode::OK, Json(ApiResponse::success(summary)))
    }
}
