//! Case-insensitive property resolution
//!
//! One resolver per entity type, built eagerly on first use and shared
//! read-only afterwards.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::planner::{QueryError, QueryResult};

use super::property::{Entity, Property};
use super::types::Value;

/// Handle to a resolved property (its declaration index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyRef(usize);

impl PropertyRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Maps column names to declared properties of one entity type
#[derive(Debug)]
pub struct PropertyResolver<E> {
    properties: Vec<Property<E>>,
    /// Lowercase name -> declaration indexes (more than one = ambiguous)
    by_name: HashMap<String, Vec<usize>>,
}

static RESOLVERS: OnceLock<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = OnceLock::new();

impl<E: Entity> PropertyResolver<E> {
    /// Builds a resolver from the entity's declared properties
    pub fn new() -> Self {
        Self::from_properties(E::properties())
    }

    /// Returns the process-wide resolver for `E`, building it on first use
    pub fn shared() -> Arc<Self> {
        let resolvers = RESOLVERS.get_or_init(DashMap::new);
        let entry = resolvers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Arc::new(Self::new()) as Arc<dyn Any + Send + Sync>)
            .clone();

        // Keys are TypeIds, so the stored value always has this type
        match entry.downcast::<Self>() {
            Ok(resolver) => resolver,
            Err(_) => Arc::new(Self::new()),
        }
    }

    /// Entity type name
    pub fn entity_name(&self) -> &'static str {
        E::TYPE_NAME
    }
}

impl<E: Entity> Default for PropertyResolver<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> PropertyResolver<E> {
    pub fn from_properties(properties: Vec<Property<E>>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, property) in properties.iter().enumerate() {
            by_name
                .entry(property.name().to_lowercase())
                .or_default()
                .push(index);
        }
        Self {
            properties,
            by_name,
        }
    }

    /// Resolves a column name, ignoring case.
    ///
    /// Fails when no property or more than one property matches.
    pub fn resolve(&self, name: &str) -> QueryResult<PropertyRef> {
        match self.by_name.get(&name.trim().to_lowercase()).map(Vec::as_slice) {
            Some([index]) => Ok(PropertyRef(*index)),
            _ => Err(QueryError::UnknownProperty(name.to_string())),
        }
    }

    /// Returns the declared property behind a handle.
    ///
    /// Fails for a handle that did not come from this resolver's table.
    pub fn property(&self, property: PropertyRef) -> QueryResult<&Property<E>> {
        self.properties.get(property.0).ok_or_else(|| {
            QueryError::ShapeConstructionFailure(format!(
                "property #{} is not declared ({} properties)",
                property.0,
                self.properties.len()
            ))
        })
    }

    /// Reads a resolved property from an entity. Out-of-range handles read
    /// as null.
    pub fn read(&self, property: PropertyRef, entity: &E) -> Value {
        self.properties
            .get(property.0)
            .map_or(Value::Null, |p| p.read(entity))
    }

    /// All declared properties, in declaration order
    pub fn properties(&self) -> impl Iterator<Item = (PropertyRef, &Property<E>)> {
        self.properties
            .iter()
            .enumerate()
            .map(|(index, property)| (PropertyRef(index), property))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
