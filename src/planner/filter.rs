//! Filter compilation
//!
//! Resolves every property in a filter tree and type-checks each comparison
//! up front. The compiled filter is a pure interpreter over the resolved
//! tree: no side effects, safe to evaluate repeatedly and concurrently.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::schema::{PropertyRef, PropertyResolver, Value, ValueKind};

use super::ast::{ComparisonOp, FilterNode, Literal};
use super::errors::{QueryError, QueryResult};

/// Resolved filter tree
#[derive(Debug)]
enum Node {
    Always,
    Compare {
        property: PropertyRef,
        op: ComparisonOp,
        operand: Value,
    },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

impl Node {
    fn evaluate<E>(&self, resolver: &PropertyResolver<E>, entity: &E) -> bool {
        match self {
            Node::Always => true,
            Node::Compare {
                property,
                op,
                operand,
            } => compare(&resolver.read(*property, entity), *op, operand),
            Node::And(left, right) => {
                left.evaluate(resolver, entity) && right.evaluate(resolver, entity)
            }
            Node::Or(left, right) => {
                left.evaluate(resolver, entity) || right.evaluate(resolver, entity)
            }
        }
    }
}

/// Applies one operator to a property value.
///
/// A null property value only satisfies `ne`; a null operand turns the
/// comparison into a null check.
fn compare(actual: &Value, op: ComparisonOp, operand: &Value) -> bool {
    if operand.is_null() {
        return match op {
            ComparisonOp::Eq => actual.is_null(),
            _ => !actual.is_null(),
        };
    }
    if actual.is_null() {
        return op == ComparisonOp::Ne;
    }

    let ordering = actual.partial_compare(operand);
    match op {
        ComparisonOp::Eq => ordering == Some(Ordering::Equal),
        ComparisonOp::Ne => ordering != Some(Ordering::Equal),
        ComparisonOp::Gt => ordering == Some(Ordering::Greater),
        ComparisonOp::Lt => ordering == Some(Ordering::Less),
        ComparisonOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        ComparisonOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    }
}

/// A compiled predicate over entities of type `E`
pub struct CompiledFilter<E> {
    resolver: Arc<PropertyResolver<E>>,
    root: Arc<Node>,
}

impl<E> CompiledFilter<E> {
    /// Checks if an entity satisfies the filter
    pub fn matches(&self, entity: &E) -> bool {
        self.root.evaluate(&self.resolver, entity)
    }

    /// Returns true if the filter accepts every entity
    pub fn accepts_all(&self) -> bool {
        matches!(*self.root, Node::Always)
    }
}

impl<E> Clone for CompiledFilter<E> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            root: Arc::clone(&self.root),
        }
    }
}

/// Compiles filter trees against an entity type
pub struct FilterCompiler;

impl FilterCompiler {
    /// Compiles a filter tree, failing on the first unresolvable property or
    /// incompatible comparison.
    pub fn compile<E>(
        resolver: &Arc<PropertyResolver<E>>,
        ast: &FilterNode,
    ) -> QueryResult<CompiledFilter<E>> {
        let root = Self::compile_node(resolver, ast)?;
        Ok(CompiledFilter {
            resolver: Arc::clone(resolver),
            root: Arc::new(root),
        })
    }

    /// The explicit empty-filter policy: accept everything
    pub fn accept_all<E>(resolver: &Arc<PropertyResolver<E>>) -> CompiledFilter<E> {
        CompiledFilter {
            resolver: Arc::clone(resolver),
            root: Arc::new(Node::Always),
        }
    }

    fn compile_node<E>(resolver: &PropertyResolver<E>, node: &FilterNode) -> QueryResult<Node> {
        match node {
            FilterNode::AlwaysTrue => Ok(Node::Always),
            FilterNode::Comparison {
                property,
                op,
                literal,
            } => {
                let resolved = resolver.resolve(property)?;
                let kind = resolver.property(resolved)?.kind();
                Self::check_comparison(property, kind, *op, literal)?;
                Ok(Node::Compare {
                    property: resolved,
                    op: *op,
                    operand: literal.to_value(),
                })
            }
            FilterNode::And(left, right) => Ok(Node::And(
                Box::new(Self::compile_node(resolver, left)?),
                Box::new(Self::compile_node(resolver, right)?),
            )),
            FilterNode::Or(left, right) => Ok(Node::Or(
                Box::new(Self::compile_node(resolver, left)?),
                Box::new(Self::compile_node(resolver, right)?),
            )),
        }
    }

    /// Validates that `op literal` makes sense for a property of `kind`
    fn check_comparison(
        property: &str,
        kind: ValueKind,
        op: ComparisonOp,
        literal: &Literal,
    ) -> QueryResult<()> {
        if !kind.is_scalar() {
            return Err(QueryError::invalid_filter(
                property,
                "navigation properties cannot be filtered",
            ));
        }

        if matches!(literal, Literal::Null) {
            if op.is_equality() {
                return Ok(());
            }
            return Err(QueryError::invalid_filter(
                property,
                format!("operator '{}' cannot compare against null", op),
            ));
        }

        let compatible = match kind {
            ValueKind::Int | ValueKind::Float => {
                matches!(literal, Literal::Int(_) | Literal::Float(_))
            }
            ValueKind::String => matches!(literal, Literal::Text(_)),
            ValueKind::DateTime => matches!(literal, Literal::DateTime(_)),
            ValueKind::Bool => matches!(literal, Literal::Bool(_)),
            ValueKind::Uuid => matches!(literal, Literal::Uuid(_)),
            ValueKind::Navigation => false,
        };
        if !compatible {
            return Err(QueryError::invalid_filter(
                property,
                format!(
                    "cannot compare {} property with {} literal",
                    kind,
                    literal.type_name()
                ),
            ));
        }

        if !op.is_equality() && !kind.is_ordered() {
            return Err(QueryError::invalid_filter(
                property,
                format!("operator '{}' is not supported on {} properties", op, kind),
            ));
        }

        Ok(())
    }
}
