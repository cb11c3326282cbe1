//! Tool catalog records.

mod record;

pub(crate) use record::estimate_tokens;
pub use record::ToolRecord;
