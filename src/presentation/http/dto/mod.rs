pub mod chat_dto;
pub mod response_dto;
pub mod schema_dto;

pub use chat_dto::*;
pub use response_dto::*;
pub use schema_dto::*;
