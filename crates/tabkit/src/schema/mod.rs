//! Schema types for representing inferred table structure.

mod column;
mod table;
mod types;

pub use column::ColumnSchema;
pub use table::TableSchema;
pub use types::ColumnType;
