//! Query Planner subsystem for aeroquery
//!
//! Turns a query descriptor into executable pieces before any storage
//! access happens.
//!
//! # Pipeline
//!
//! 1. Filter tree -> compiled predicate (properties resolved, types checked)
//! 2. Sort clauses -> composite stable comparator
//!
//! Compilation is all-or-nothing: a query is never partially applied.

mod ast;
mod descriptor;
mod errors;
mod filter;
mod order;

pub use ast::{ComparisonOp, FilterNode, Literal, SortClause, SortDirection};
pub use descriptor::QueryDescriptor;
pub use errors::{QueryError, QueryResult, Severity};
pub use filter::{CompiledFilter, FilterCompiler};
pub use order::{CompiledOrder, OrderCompiler};
