pub mod postgres_table_repository;
pub mod postgres_vector_repository;

pub use postgres_table_repository::PostgresTableRepository;
pub use postgres_vector_repository::PostgresVectorRepository;
