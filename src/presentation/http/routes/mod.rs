pub mod chat_routes;
pub mod data_routes;
pub mod health_routes;
pub mod schema_routes;

pub use chat_routes::*;
pub use data_routes::*;
pub use health_routes::*;
pub use schema_routes::*;
