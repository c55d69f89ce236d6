pub mod kind;
pub mod patcher;
pub mod payload;

pub use kind::{FieldKind, PatchContext};
pub use patcher::{PatchStats, ReferencePatcher};
pub use payload::{Payload, normalize_value};
