//! Projection shape registry
//!
//! Process-wide cache of shape metadata keyed by (entity `TypeId`, canonical
//! signature). Accessor tables hold declaration indexes, so entries are never
//! shared between Rust types, even ones with the same `TYPE_NAME`. Reads never take a global lock; a miss publishes through the
//! map's atomic vacant-entry path, so at most one entry is ever visible per
//! key. Entries are immutable once published and never evicted.

use std::any::TypeId;
use std::sync::{Arc, OnceLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::observability::{log_event_with_fields, Event};
use crate::planner::{QueryError, QueryResult};
use crate::schema::{Entity, PropertyRef, PropertyResolver};

use super::shape::ProjectionShape;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShapeKey {
    entity: TypeId,
    signature: String,
}

/// A published shape and the accessor table that feeds it
#[derive(Debug)]
pub struct ShapeEntry {
    entity_type: TypeId,
    entity: &'static str,
    shape: ProjectionShape,
    /// Source property per shape field, in shape order
    accessors: Vec<PropertyRef>,
}

impl ShapeEntry {
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Returns true if the entry was built for entity type `E`
    pub fn is_for<E: 'static>(&self) -> bool {
        self.entity_type == TypeId::of::<E>()
    }

    pub fn shape(&self) -> &ProjectionShape {
        &self.shape
    }

    pub fn accessors(&self) -> &[PropertyRef] {
        &self.accessors
    }
}

/// Cache of projection shapes
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    entries: DashMap<ShapeKey, Arc<ShapeEntry>>,
}

static GLOBAL: OnceLock<Arc<ShapeRegistry>> = OnceLock::new();

impl ShapeRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry
    pub fn global() -> Arc<ShapeRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ShapeRegistry::new())))
    }

    /// Returns the shape for a column set, building and publishing it on
    /// first use.
    ///
    /// Column order and case do not matter. Unresolvable columns fail with
    /// `UnknownProperty`; nothing is published on failure.
    pub fn get_or_create<E: Entity>(
        &self,
        resolver: &PropertyResolver<E>,
        columns: &[String],
    ) -> QueryResult<Arc<ShapeEntry>> {
        let mut resolved: Vec<PropertyRef> = Vec::with_capacity(columns.len());
        for column in columns {
            let property = resolver.resolve(column)?;
            if !resolved.contains(&property) {
                resolved.push(property);
            }
        }
        if resolved.is_empty() {
            return Err(QueryError::EmptySelection);
        }

        let fields = resolved
            .iter()
            .map(|p| resolver.property(*p).map(|property| (property.name(), property.kind())))
            .collect::<QueryResult<Vec<_>>>()?;
        let shape = ProjectionShape::canonical(fields);

        let key = ShapeKey {
            entity: TypeId::of::<E>(),
            signature: shape.signature().to_string(),
        };

        if let Some(existing) = self.entries.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let entry = Arc::new(Self::build_entry(resolver, shape)?);

        match self.entries.entry(key) {
            Entry::Occupied(occupied) => Ok(Arc::clone(occupied.get())),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&entry));
                log_event_with_fields(
                    Event::ShapeCreated,
                    &[
                        ("entity", E::TYPE_NAME),
                        ("signature", entry.shape.signature()),
                    ],
                );
                Ok(entry)
            }
        }
    }

    /// Builds the accessor table for a canonical shape
    fn build_entry<E: Entity>(
        resolver: &PropertyResolver<E>,
        shape: ProjectionShape,
    ) -> QueryResult<ShapeEntry> {
        if shape.has_duplicate_names() {
            return Err(QueryError::ShapeConstructionFailure(format!(
                "duplicate field names in shape '{}'",
                shape.signature()
            )));
        }

        let accessors = shape
            .fields()
            .iter()
            .map(|field| {
                resolver.resolve(field.name()).map_err(|_| {
                    QueryError::ShapeConstructionFailure(format!(
                        "field '{}' no longer resolves on {}",
                        field.name(),
                        E::TYPE_NAME
                    ))
                })
            })
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(ShapeEntry {
            entity_type: TypeId::of::<E>(),
            entity: E::TYPE_NAME,
            shape,
            accessors,
        })
    }

    /// Number of published shapes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionCompiler;
    use crate::schema::{Property, Value, ValueKind};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Dish;

    impl Entity for Dish {
        const TYPE_NAME: &'static str = "dish";

        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::scalar("Id", ValueKind::Int, |_| Value::Int(1)),
                Property::scalar("Name", ValueKind::String, |_| Value::Null),
                Property::scalar("Price", ValueKind::Float, |_| Value::Float(2.0)),
            ]
        }
    }

    fn columns(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_same_columns_same_entry() {
        let registry = ShapeRegistry::new();
        let resolver = PropertyResolver::<Dish>::new();

        let a = registry
            .get_or_create(&resolver, &columns(&["price", "id"]))
            .unwrap();
        let b = registry
            .get_or_create(&resolver, &columns(&["ID", "Price"]))
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.shape().signature(), "id:int,price:float");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_accessors_follow_shape_order() {
        let registry = ShapeRegistry::new();
        let resolver = PropertyResolver::<Dish>::new();
        let entry = registry
            .get_or_create(&resolver, &columns(&["price", "name"]))
            .unwrap();

        let names: Vec<_> = entry.shape().fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["name", "price"]);
        assert_eq!(resolver.property(entry.accessors()[0]).unwrap().name(), "Name");
        assert_eq!(resolver.property(entry.accessors()[1]).unwrap().name(), "Price");
    }

    #[test]
    fn test_unknown_column_publishes_nothing() {
        let registry = ShapeRegistry::new();
        let resolver = PropertyResolver::<Dish>::new();
        let err = registry
            .get_or_create(&resolver, &columns(&["id", "spice"]))
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownProperty(ref n) if n == "spice"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_repeated_column_resolves_once() {
        let registry = ShapeRegistry::new();
        let resolver = PropertyResolver::<Dish>::new();
        let entry = registry
            .get_or_create(&resolver, &columns(&["id", "Id"]))
            .unwrap();
        assert_eq!(entry.shape().len(), 1);
    }

    #[derive(Serialize)]
    struct Plate;

    #[derive(Serialize)]
    struct Bowl;

    impl Entity for Plate {
        const TYPE_NAME: &'static str = "thing";

        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::scalar("X", ValueKind::Int, |_| Value::Int(1)),
                Property::scalar("Y", ValueKind::Int, |_| Value::Int(2)),
            ]
        }
    }

    impl Entity for Bowl {
        const TYPE_NAME: &'static str = "thing";

        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::scalar("Y", ValueKind::Int, |_| Value::Int(3)),
                Property::scalar("X", ValueKind::Int, |_| Value::Int(4)),
            ]
        }
    }

    #[test]
    fn test_types_sharing_a_name_get_separate_entries() {
        let registry = ShapeRegistry::new();
        let plates = Arc::new(PropertyResolver::<Plate>::new());
        let bowls = Arc::new(PropertyResolver::<Bowl>::new());

        let plate_entry = registry.get_or_create(&plates, &columns(&["x"])).unwrap();
        let bowl_entry = registry.get_or_create(&bowls, &columns(&["x"])).unwrap();

        assert!(!Arc::ptr_eq(&plate_entry, &bowl_entry));
        assert_eq!(registry.len(), 2);
        assert!(plate_entry.is_for::<Plate>());
        assert!(bowl_entry.is_for::<Bowl>());

        let plate = ProjectionCompiler::build(plate_entry, &plates).unwrap();
        let bowl = ProjectionCompiler::build(bowl_entry, &bowls).unwrap();
        assert_eq!(plate.project(&Plate).get("x"), Some(&Value::Int(1)));
        assert_eq!(bowl.project(&Bowl).get("x"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_entry_for_another_type_is_refused() {
        let registry = ShapeRegistry::new();
        let plates = Arc::new(PropertyResolver::<Plate>::new());
        let bowls = Arc::new(PropertyResolver::<Bowl>::new());

        let plate_entry = registry.get_or_create(&plates, &columns(&["x", "y"])).unwrap();
        let err = ProjectionCompiler::build(plate_entry, &bowls).err().unwrap();
        assert!(matches!(err, QueryError::ShapeConstructionFailure(_)));
    }
}
