//! Entity types, instances and materialization.

mod entity;
mod entity_type;
mod materialize;
mod registry;

pub use entity::{Entity, RelationValue};
pub use entity_type::*;
pub use materialize::{Materialized, Materializer};
pub use registry::Registry;
