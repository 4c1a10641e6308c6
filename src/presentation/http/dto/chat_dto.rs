use serde::{Deserialize, Serialize};

use crate::application::agents::{OrchestratorReply, QueryMetadata};
use crate::application::use_cases::upload_pdf::{TableDetail, UploadPdfResponse};

#[derive(Debug, Deserialize)]
pub struct AnswerRequestDto {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponseDto {
    pub answer: String,
    pub success: bool,
    pub error: Option<String>,
    pub metadata: Option<QueryMetadata>,
}

impl From<OrchestratorReply> for AnswerResponseDto {
    fn from(reply: OrchestratorReply) -> Self {
        Self {
            answer: reply.answer,
            success: reply.success,
            error: reply.error,
            metadata: reply.metadata,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponseDto {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub tables_stored: usize,
    pub text_chunks_stored: usize,
    pub schemas_created: usize,
    pub table_details: Vec<TableDetail>,
}

impl From<UploadPdfResponse> for UploadResponseDto {
    fn from(response: UploadPdfResponse) -> Self {
        Self {
            success: response.success,
            message: response.message,
            filename: response.filename,
            tables_stored: response.tables_stored,
            text_chunks_stored: response.text_chunks_stored,
            schemas_created: response.schemas_created,
            table_details: response.table_details,
        }
    }
}
