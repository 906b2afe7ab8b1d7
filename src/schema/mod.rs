//! Entity schema subsystem for aeroquery
//!
//! Entity types declare their properties once; the resolver maps request
//! column names onto those declarations.
//!
//! # Design Principles
//!
//! - Declared, never discovered at request time
//! - Case-insensitive resolution, exactly one match
//! - Immutable after construction, safe for concurrent reads

mod property;
mod resolver;
mod types;

pub use property::{navigation_value, Accessor, Entity, Property};
pub use resolver::{PropertyRef, PropertyResolver};
pub use types::{Value, ValueKind};
