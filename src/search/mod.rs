pub mod merge;
pub mod vector;

pub use merge::{merge_field_hits, FieldHit};
pub use vector::{VectorField, VectorStore};
