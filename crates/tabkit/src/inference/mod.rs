//! Schema inference over dynamic rows.

mod schema;

pub use schema::infer_schema;
