//! Peasys data types for query results.

mod column;
mod outcome;
mod result_set;
mod value;

pub use column::{descriptors_from_json, ColumnDescriptor};
pub use outcome::{CommandOutcome, CommandReplyEntry, CreateOutcome, QueryOutcome, SelectResponse};
pub use result_set::ResultSet;
pub use value::{PackedDecimal, Value};
