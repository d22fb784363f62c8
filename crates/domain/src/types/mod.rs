//! Domain types and models

pub mod field;
pub mod instance;
pub mod metric;

pub use field::{FieldSet, InstanceField};
pub use instance::InstanceDocument;
pub use metric::{FieldValue, Metric};
