pub mod id_map;

pub use id_map::{IdMap, IdMaps, Resolved};
