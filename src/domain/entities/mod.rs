pub mod agent_state;
pub mod schema_entry;
pub mod table_info;
pub mod table_schema;
pub mod vector_record;

pub use agent_state::AgentState;
pub use schema_entry::SchemaEntry;
pub use table_info::{TableContext, TableInfo};
pub use table_schema::{ColumnDef, TableSchema};
pub use vector_record::{DocumentType, cosine_similarity, VectorMatch, VectorMetadata, VectorRecord};
