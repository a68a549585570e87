//! Tabkit: in-memory tabular data toolkit.
//!
//! Tabkit models a table as an immutable [`Dataset`] of dynamic rows with an
//! inferred schema, and layers a transform library, a statistics engine, a
//! sequential pipeline runner and a notebook cell execution model on top.
//!
//! # Core Principles
//!
//! - **Immutable**: every transform returns a new dataset; inputs are never modified
//! - **Inferred schema**: column types come from the data, not declarations
//! - **Failures are data**: pipeline and notebook runs always finish and report
//!   failures through status fields
//!
//! # Example
//!
//! ```
//! use tabkit::{Value, create_dataset, row, stats};
//!
//! let ds = create_dataset(
//!     vec![row! { "a" => 1 }, row! { "a" => Value::Null }, row! { "a" => 3 }],
//!     "example",
//! );
//!
//! let described = stats::describe_column(&ds, "a");
//! assert_eq!(described.count, 2);
//! assert_eq!(described.mean, 2.0);
//! assert_eq!(described.null_count, 1);
//!
//! let sorted = ds.sort_by("a", false);
//! assert_eq!(sorted.rows[0].get("a"), Some(&Value::from(3)));
//! ```

pub mod dataset;
pub mod error;
pub mod inference;
pub mod notebook;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod transform;

pub use dataset::{Dataset, DatasetMetadata, Row, Value, create_dataset};
pub use error::{Result, TabkitError};
pub use inference::infer_schema;
pub use notebook::{Cell, CellExecutor, Notebook, NotebookRunner};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResult, StepRegistry, run_pipeline, step_fn};
pub use schema::{ColumnSchema, ColumnType, TableSchema};
pub use transform::{TransformOperation, TransformStep};
