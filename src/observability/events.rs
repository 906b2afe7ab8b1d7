//! Observability events for aeroquery
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// HTTP server bound and serving
    ServerStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Seed rows loaded into the catalog
    SeedLoaded,

    // Query processing
    /// Query executed successfully
    QueryExecuted,
    /// Query rejected at compile time
    QueryRejected,
    /// Query abandoned before storage returned
    QueryCancelled,
    /// Storage collaborator failed
    StorageFailed,

    // Projection
    /// New projection shape published
    ShapeCreated,
    /// Shape construction invariant violated
    ShapeConstructionFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ServerStart => "SERVER_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SeedLoaded => "SEED_LOADED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::StorageFailed => "STORAGE_FAILED",
            Event::ShapeCreated => "SHAPE_CREATED",
            Event::ShapeConstructionFailed => "SHAPE_CONSTRUCTION_FAILED",
        }
    }

    /// Returns true if this event indicates a defect
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ShapeConstructionFailed)
    }

    /// Returns true if this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::StorageFailed | Event::ShapeConstructionFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
