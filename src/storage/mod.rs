pub mod blob;
pub mod engine;
pub mod memory;

pub use blob::{InMemoryBlobStore, blob_key};
pub use engine::{BlobStore, RecordStore};
pub use memory::{Collection, InMemoryStore};
