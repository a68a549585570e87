//! Immutable in-memory datasets and their dynamic values.

mod table;
mod value;

pub use table::{Dataset, DatasetMetadata, create_dataset};
pub use value::{Row, Value, get_or_null, non_null};
