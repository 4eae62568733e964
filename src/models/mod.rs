pub mod entity;

pub use entity::{EntityKind, EntityRecord, UnknownEntityKind};
