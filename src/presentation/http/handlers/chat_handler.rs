use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::application::use_cases::{
    AnswerQueryError, AnswerQueryRequest, AnswerQueryUseCase, UploadPdfError, UploadPdfRequest,
    UploadPdfUseCase,
};
use crate::presentation::http::dto::{
    AnswerRequestDto, AnswerResponseDto, ApiResponse, UploadResponseDto,
};

pub struct ChatHandler {
    answer_use_case: Arc<AnswerQueryUseCase>,
    upload_use_case: Arc<UploadPdfUseCase>,
}

impl ChatHandler {
    pub fn new(
        answer_use_case: Arc<AnswerQueryUseCase>,
        upload_use_case: Arc<UploadPdfUseCase>,
    ) -> Self {
        Self {
            answer_use_case,
            upload_use_case,
        }
    }

    pub fn max_upload_size(&self) -> usize {
        self.upload_use_case.max_file_size()
    }

    pub async fn answer(
        State(handler): State<Arc<ChatHandler>>,
        Json(body): Json<AnswerRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = AnswerQueryRequest { query: body.query };

        match handler.answer_use_case.execute(request).await {
            Ok(reply) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(AnswerResponseDto::from(reply))),
            )),
            Err(AnswerQueryError::ValidationError(message)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "EMPTY_QUERY".to_string(),
                    message,
                    None,
                )),
            )),
        }
    }

    pub async fn upload_pdf(
        State(handler): State<Arc<ChatHandler>>,
        mut multipart: Multipart,
    ) -> Result<impl IntoResponse, StatusCode> {
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Ok(handler.multipart_error(e)),
            };

            if field.name() != Some("file") {
                continue;
            }

            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = match field.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(e) => return Ok(handler.multipart_error(e)),
            };

            let request = UploadPdfRequest {
                file_name,
                file_data: data,
            };

            return Ok(match handler.upload_use_case.execute(request).await {
                Ok(response) => (
                    StatusCode::OK,
                    Json(ApiResponse::success(UploadResponseDto::from(response))),
                ),
                Err(e) => {
                    let (status, code) = match &e {
                        UploadPdfError::ValidationError(_) => {
                            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                        }
                        UploadPdfError::FileTooLarge(_) => {
                            (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE")
                        }
                        _ => {
                            error!("PDF upload failed: {}", e);
                            (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_FAILED")
                        }
                    };
                    (
                        status,
                        Json(ApiResponse::error(code.to_string(), e.to_string(), None)),
                    )
                }
            });
        }

        Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "NO_FILE_PROVIDED".to_string(),
                "No file part in the request".to_string(),
                None,
            )),
        ))
    }

    fn multipart_error(
        &self,
        e: axum::extract::multipart::MultipartError,
    ) -> (StatusCode, Json<ApiResponse<UploadResponseDto>>) {
        warn!("Rejected multipart upload: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ApiResponse::error(
                    "FILE_TOO_LARGE".to_string(),
                    format!(
                        "File too large. Maximum size is {}MB",
                        self.max_upload_size() / (1024 * 1024)
                    ),
                    None,
                )),
            );
        }

        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "INVALID_MULTIPART".to_string(),
                e.body_text(),
                None,
            )),
        )
    }
}
