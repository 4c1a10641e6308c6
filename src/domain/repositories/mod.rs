pub mod schema_registry;
pub mod table_repository;
pub mod vector_repository;

pub use schema_registry::SchemaRegistry;
pub use table_repository::TableRepository;
pub use vector_repository::VectorRepository;
