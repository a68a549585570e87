//! Transform library.
//!
//! Row-level and reshaping transforms are inherent methods on [`Dataset`];
//! every one returns a new dataset and leaves its input untouched.
//! [`TransformOperation`] describes the common transforms as data so they can
//! be serialized or registered as pipeline steps through [`TransformStep`].
//!
//! [`Dataset`]: crate::dataset::Dataset

mod operations;
mod reshape;
mod rows;

pub use operations::{TransformOperation, TransformStep};
pub use reshape::{AggregateFn, Aggregation, concat, inner_join};
