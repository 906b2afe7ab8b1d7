//! Column set derivation
//!
//! Decides which columns a projected request covers:
//! - explicit select: the listed columns, in order, first occurrence wins
//! - expand only: every serializable scalar property in declaration order,
//!   plus the expanded properties themselves
//! - neither: no projection

use crate::planner::{QueryError, QueryResult};
use crate::schema::PropertyResolver;

/// Splits and trims list entries, dropping blanks
fn clean(entries: &[String]) -> impl Iterator<Item = &str> {
    entries.iter().map(|e| e.trim()).filter(|e| !e.is_empty())
}

/// Derives the requested column names.
///
/// Returns `Ok(None)` when neither select nor expand is present and
/// `EmptySelection` when they are present but produce no columns.
pub fn derive_columns<E>(
    resolver: &PropertyResolver<E>,
    select: Option<&[String]>,
    expand: Option<&[String]>,
) -> QueryResult<Option<Vec<String>>> {
    let columns = match (select, expand) {
        (None, None) => return Ok(None),
        (Some(select), _) => {
            let mut columns: Vec<String> = Vec::new();
            for column in clean(select) {
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                    columns.push(column.to_string());
                }
            }
            columns
        }
        (None, Some(expand)) => {
            let mut expanded = Vec::new();
            for name in clean(expand) {
                expanded.push(resolver.resolve(name)?);
            }

            resolver
                .properties()
                .filter(|(handle, property)| {
                    expanded.contains(handle)
                        || (property.kind().is_scalar() && property.is_serializable())
                })
                .map(|(_, property)| property.name().to_string())
                .collect()
        }
    };

    if columns.is_empty() {
        return Err(QueryError::EmptySelection);
    }
    Ok(Some(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Entity, Property, Value, ValueKind};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Order;

    impl Entity for Order {
        const TYPE_NAME: &'static str = "order";

        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::scalar("Id", ValueKind::Int, |_| Value::Int(1)),
                Property::scalar("Status", ValueKind::String, |_| Value::Null),
                Property::navigation("Customer", |_| Value::Null),
                Property::navigation("OrderItems", |_| Value::Null).hidden(),
            ]
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_projection() {
        let resolver = PropertyResolver::<Order>::new();
        assert_eq!(derive_columns(&resolver, None, None).unwrap(), None);
    }

    #[test]
    fn test_select_dedupes_keeping_first() {
        let resolver = PropertyResolver::<Order>::new();
        let select = strings(&["status", " Id ", "STATUS"]);
        let columns = derive_columns(&resolver, Some(select.as_slice()), None).unwrap();
        assert_eq!(columns, Some(strings(&["status", "Id"])));
    }

    #[test]
    fn test_select_wins_over_expand() {
        let resolver = PropertyResolver::<Order>::new();
        let select = strings(&["id"]);
        let expand = strings(&["customer"]);
        let columns = derive_columns(&resolver, Some(select.as_slice()), Some(expand.as_slice())).unwrap();
        assert_eq!(columns, Some(strings(&["id"])));
    }

    #[test]
    fn test_expand_adds_scalars_and_navigation() {
        let resolver = PropertyResolver::<Order>::new();
        let expand = strings(&["CUSTOMER"]);
        let columns = derive_columns(&resolver, None, Some(expand.as_slice())).unwrap();
        assert_eq!(columns, Some(strings(&["Id", "Status", "Customer"])));
    }

    #[test]
    fn test_expand_can_include_hidden_collection() {
        let resolver = PropertyResolver::<Order>::new();
        let expand = strings(&["orderitems"]);
        let columns = derive_columns(&resolver, None, Some(expand.as_slice())).unwrap();
        assert_eq!(columns, Some(strings(&["Id", "Status", "OrderItems"])));
    }

    #[test]
    fn test_unknown_expand_fails() {
        let resolver = PropertyResolver::<Order>::new();
        let expand = strings(&["waiter"]);
        assert!(matches!(
            derive_columns(&resolver, None, Some(expand.as_slice())),
            Err(QueryError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_empty_select_is_reported() {
        let resolver = PropertyResolver::<Order>::new();
        let select = strings(&["", "  "]);
        assert!(matches!(
            derive_columns(&resolver, Some(select.as_slice()), None),
            Err(QueryError::EmptySelection)
        ));
    }
}
