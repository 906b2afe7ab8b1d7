//! Query execution subsystem for aeroquery
//!
//! # Execution Flow (strict order)
//!
//! 1. Compile filter, order, column set, shape and projector
//! 2. Compose the query against the storage collaborator
//! 3. Materialize (single cancellable fetch)
//! 4. Count the filtered set if requested
//! 5. Project, then paginate
//!
//! Nothing touches storage until step 1 has fully succeeded.

mod executor;
mod queryable;
mod result;

pub use executor::{CompiledQuery, QueryEngine};
pub use queryable::{InMemoryCollection, Queryable, StorageError, StorageResult};
pub use result::{Items, ResultEnvelope};
