pub mod catalog;
pub mod collection;

pub use catalog::{BUILD_ORDER, BuildGroup, SchemaCatalog};
pub use collection::{CollectionSchema, FieldDef, FieldRole, MissingTarget, PayloadKind};
