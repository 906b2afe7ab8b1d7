//! aeroquery - dynamic query and projection over typed entity collections
//!
//! Answers filter / order / select / expand / skip / top / count requests
//! against a strongly-typed collection whose output shape is only known at
//! request time.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod projection;
pub mod rest_api;
pub mod schema;
