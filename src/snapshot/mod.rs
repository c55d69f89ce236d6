pub mod bundle;
pub mod codec;
pub mod records;

pub use bundle::{BUNDLE_VERSION, BundleMetadata, StarterBundle};
pub use codec::{SIGNATURE, Snapshot, SnapshotMetadata, decode, encode};
pub use records::{RecordSet, SourceRecord};
