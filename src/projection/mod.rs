//! Projection subsystem for aeroquery
//!
//! Builds ad-hoc output shapes from a requested column set without a
//! hand-written type per query variant.
//!
//! # Flow
//!
//! 1. Derive the column set from select / expand
//! 2. Resolve columns and look up (or publish) the canonical shape
//! 3. Compile a projector from the shape's accessor table
//! 4. Map each entity to a `Record`

mod columns;
mod projector;
mod registry;
mod shape;

pub use columns::derive_columns;
pub use projector::{ProjectionCompiler, Projector, Record};
pub use registry::{ShapeEntry, ShapeRegistry};
pub use shape::{ProjectionShape, ShapeField};
