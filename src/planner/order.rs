//! Order compilation
//!
//! Turns sort clauses into a composite comparator. Clause `i` only decides
//! when every earlier clause compared equal. Callers must use a stable sort.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::schema::{PropertyRef, PropertyResolver};

use super::ast::{SortClause, SortDirection};
use super::errors::{QueryError, QueryResult};

/// A compiled multi-key comparator over entities of type `E`
pub struct CompiledOrder<E> {
    resolver: Arc<PropertyResolver<E>>,
    keys: Arc<[(PropertyRef, SortDirection)]>,
}

impl<E> CompiledOrder<E> {
    /// Compares two entities by every key in priority order.
    ///
    /// With no keys every pair compares equal.
    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        for (property, direction) in self.keys.iter() {
            let a_val = self.resolver.read(*property, a);
            let b_val = self.resolver.read(*property, b);

            let ordering = match direction {
                SortDirection::Ascending => a_val.sort_compare(&b_val),
                SortDirection::Descending => b_val.sort_compare(&a_val),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Sorts a slice in place. Stable: ties keep their relative order.
    pub fn sort(&self, entities: &mut [E]) {
        if self.is_unordered() {
            return;
        }
        entities.sort_by(|a, b| self.compare(a, b));
    }

    /// Returns true if the comparator has no keys
    pub fn is_unordered(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<E> Clone for CompiledOrder<E> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            keys: Arc::clone(&self.keys),
        }
    }
}

/// Compiles sort clauses against an entity type
pub struct OrderCompiler;

impl OrderCompiler {
    /// Compiles all clauses or none: the first bad clause fails the whole list
    pub fn compile<E>(
        resolver: &Arc<PropertyResolver<E>>,
        clauses: &[SortClause],
    ) -> QueryResult<CompiledOrder<E>> {
        let keys = clauses
            .iter()
            .map(|clause| {
                let property = resolver.resolve(&clause.property)?;
                if !resolver.property(property)?.kind().is_scalar() {
                    return Err(QueryError::InvalidOrderProperty(clause.property.clone()));
                }
                Ok((property, clause.direction))
            })
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(CompiledOrder {
            resolver: Arc::clone(resolver),
            keys: keys.into(),
        })
    }
}
