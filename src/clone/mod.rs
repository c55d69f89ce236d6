//! Site cloning: source loading, the orchestrated build-and-patch run and
//! export back to portable formats.

pub mod export;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod source;

pub use export::{export_bundle, export_snapshot};
pub use orchestrator::{CloneOutcome, SiteCloner};
pub use report::{CloneReport, CollectionReport};
pub use request::CloneRequest;
pub use source::SourceGraph;
