pub mod answer_query;
pub mod clear_all_data;
pub mod data_summary;
pub mod health_check;
pub mod upload_pdf;

pub use answer_query::{AnswerQueryError, AnswerQueryRequest, AnswerQueryUseCase};
pub use clear_all_data::{ClearAllDataResponse, ClearAllDataUseCase};
pub use data_summary::{DataSummaryResponse, DataSummaryUseCase};
pub use health_check::{HealthCheckResponse, HealthCheckUseCase};
pub use upload_pdf::{UploadPdfError, UploadPdfRequest, UploadPdfResponse, UploadPdfUseCase};
