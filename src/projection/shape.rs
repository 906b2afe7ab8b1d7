//! Projection shapes
//!
//! A shape is the canonical, order-independent description of the fields a
//! projected record carries. Field names are lowercase; fields are sorted by
//! (name, type) so any two requests for the same column set agree on both
//! the signature and the field order.

use std::sync::Arc;

use crate::schema::ValueKind;

/// One field of a projection shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeField {
    name: Arc<str>,
    kind: ValueKind,
}

impl ShapeField {
    /// Lowercase output name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

/// Canonical field list plus its signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionShape {
    fields: Vec<ShapeField>,
    signature: String,
}

impl ProjectionShape {
    /// Builds the canonical shape for a set of (name, kind) pairs.
    ///
    /// Names are lowercased, pairs sorted and exact duplicates dropped.
    pub fn canonical<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, ValueKind)>,
        S: AsRef<str>,
    {
        let mut pairs: Vec<(String, ValueKind)> = pairs
            .into_iter()
            .map(|(name, kind)| (name.as_ref().to_lowercase(), kind))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.type_name().cmp(b.1.type_name())));
        pairs.dedup();

        let signature = Self::signature_of(&pairs);
        let fields = pairs
            .into_iter()
            .map(|(name, kind)| ShapeField {
                name: Arc::from(name),
                kind,
            })
            .collect();

        Self { fields, signature }
    }

    fn signature_of(pairs: &[(String, ValueKind)]) -> String {
        pairs
            .iter()
            .map(|(name, kind)| format!("{}:{}", name, kind.type_name()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Fields in canonical order
    pub fn fields(&self) -> &[ShapeField] {
        &self.fields
    }

    /// Deterministic cache key: sorted `name:type` pairs joined by commas
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if two fields share an output name
    pub fn has_duplicate_names(&self) -> bool {
        self.fields.windows(2).any(|w| w[0].name == w[1].name)
    }
}
