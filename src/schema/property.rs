//! Declared entity properties
//!
//! Every queryable entity type declares its properties once, in declaration
//! order, with an explicit accessor and serializability flag. Nothing is
//! discovered at request time.

use serde::Serialize;

use super::types::{Value, ValueKind};

/// Reads one property value from an entity
pub type Accessor<E> = fn(&E) -> Value;

/// A single declared property of entity type `E`
pub struct Property<E> {
    name: &'static str,
    kind: ValueKind,
    serializable: bool,
    accessor: Accessor<E>,
}

impl<E> Property<E> {
    /// Declare a scalar property
    pub fn scalar(name: &'static str, kind: ValueKind, accessor: Accessor<E>) -> Self {
        Self {
            name,
            kind,
            serializable: true,
            accessor,
        }
    }

    /// Declare a navigation property (a related entity loaded by storage)
    pub fn navigation(name: &'static str, accessor: Accessor<E>) -> Self {
        Self {
            name,
            kind: ValueKind::Navigation,
            serializable: true,
            accessor,
        }
    }

    /// Mark the property as excluded from external output.
    ///
    /// Used for back-reference collections.
    pub fn hidden(mut self) -> Self {
        self.serializable = false;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Reads this property from an entity
    pub fn read(&self, entity: &E) -> Value {
        (self.accessor)(entity)
    }
}

impl<E> Clone for Property<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            kind: self.kind,
            serializable: self.serializable,
            accessor: self.accessor,
        }
    }
}

impl<E> std::fmt::Debug for Property<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("serializable", &self.serializable)
            .finish()
    }
}

/// A strongly-typed entity that can be queried and projected.
///
/// `Serialize` produces the entity's full public shape, used when a query
/// requests no projection.
pub trait Entity: Serialize + Send + Sync + Sized + 'static {
    /// Collection-facing type name
    const TYPE_NAME: &'static str;

    /// Declared properties, in declaration order
    fn properties() -> Vec<Property<Self>>;
}

/// Serializes a navigation target into a value, null when absent
pub fn navigation_value<T: Serialize>(target: Option<&T>) -> Value {
    match target.map(serde_json::to_value) {
        Some(Ok(json)) => Value::Json(json),
        _ => Value::Null,
    }
}
