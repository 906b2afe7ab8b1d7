//! Projection compilation
//!
//! Maps an entity onto a shape, producing an ordered record of lowercase
//! field names to values. Null values are dropped from the record.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::planner::{QueryError, QueryResult};
use crate::schema::{PropertyResolver, Value};

use super::registry::ShapeEntry;
use super::shape::ProjectionShape;

/// A projected row: lowercase field name -> value, in shape order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(Arc<str>, Value)>,
}

impl Record {
    /// Returns the value for a field name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_ref() == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_ref(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name.as_ref(), value)?;
        }
        map.end()
    }
}

/// A compiled entity -> record mapping for one shape
pub struct Projector<E> {
    resolver: Arc<PropertyResolver<E>>,
    entry: Arc<ShapeEntry>,
}

impl<E> Projector<E> {
    /// Projects one entity. Pure; safe to call concurrently.
    pub fn project(&self, entity: &E) -> Record {
        let fields = self
            .entry
            .shape()
            .fields()
            .iter()
            .zip(self.entry.accessors())
            .filter_map(|(field, property)| {
                let value = self.resolver.read(*property, entity);
                (!value.is_null()).then(|| (Arc::clone(field.shared_name()), value))
            })
            .collect();
        Record { fields }
    }

    pub fn shape(&self) -> &ProjectionShape {
        self.entry.shape()
    }
}

impl<E> Clone for Projector<E> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            entry: Arc::clone(&self.entry),
        }
    }
}

/// Builds projectors from published shapes
pub struct ProjectionCompiler;

impl ProjectionCompiler {
    /// Builds the mapping for a shape.
    ///
    /// The entry must have been built for `E`. Every field is re-resolved
    /// through the resolver and must agree with the entry's accessor table
    /// and declared kind.
    pub fn build<E: 'static>(
        entry: Arc<ShapeEntry>,
        resolver: &Arc<PropertyResolver<E>>,
    ) -> QueryResult<Projector<E>> {
        if !entry.is_for::<E>() {
            return Err(QueryError::ShapeConstructionFailure(format!(
                "shape '{}' was built for {}",
                entry.shape().signature(),
                entry.entity()
            )));
        }

        let shape = entry.shape();
        if shape.len() != entry.accessors().len() {
            return Err(QueryError::ShapeConstructionFailure(format!(
                "shape '{}' has {} fields but {} accessors",
                shape.signature(),
                shape.len(),
                entry.accessors().len()
            )));
        }

        for (field, expected) in shape.fields().iter().zip(entry.accessors()) {
            let property = resolver.resolve(field.name()).map_err(|_| {
                QueryError::ShapeConstructionFailure(format!(
                    "field '{}' does not resolve on {}",
                    field.name(),
                    entry.entity()
                ))
            })?;
            if property != *expected || resolver.property(property)?.kind() != field.kind() {
                return Err(QueryError::ShapeConstructionFailure(format!(
                    "field '{}' does not match its source property",
                    field.name()
                )));
            }
        }

        Ok(Projector {
            resolver: Arc::clone(resolver),
            entry,
        })
    }
}
