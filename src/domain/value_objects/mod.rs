pub mod column_type;
pub mod file_hash;
pub mod route_decision;
pub mod select_statement;
pub mod sql_identifier;
pub mod table_status;

pub use column_type::{CellValue, ColumnType};
pub use file_hash::FileHash;
pub use route_decision::RouteDecision;
pub use select_statement::SelectStatement;
pub use sql_identifier::{SqlIdentifier, dedupe_columns};
pub use table_status::TableStatus;
