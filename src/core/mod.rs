pub mod error;
pub mod types;

pub use error::{CloneError, Result};
pub use types::{FieldMap, FileBlob, Record, RecordId, field_str};
