pub mod chat_handler;
pub mod data_handler;
pub mod health_handler;
pub mod schema_handler;

pub use chat_handler::ChatHandler;
pub use data_handler::DataHandler;
pub use health_handler::HealthHandler;
pub use schema_handler::SchemaHandler;
