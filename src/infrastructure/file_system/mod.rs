pub mod json_schema_registry;
pub mod local_file_storage;

pub use json_schema_registry::JsonSchemaRegistry;
pub use local_file_storage::LocalFileStorage;
