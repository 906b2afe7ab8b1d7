//! Demo entity catalog
//!
//! Customers, menu items, orders and order items, served from an
//! in-memory store seeded from JSON.

mod entities;
mod store;

pub use entities::{Customer, MenuItem, Order, OrderItem};
pub use store::{CatalogEntity, CatalogError, CatalogStore, Collection, Seed, Tables};
