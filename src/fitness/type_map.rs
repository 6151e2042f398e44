use std::collections::HashMap;

use crate::types::TypeIndex;

/// The immutable zone-name <-> dense-index mapping for one optimization
/// stage. Produced once and passed to every component that translates
/// between zone codes and indices.
#[derive(Clone, Debug)]
pub struct TypeIndexMap {
    names: Vec<String>,
    index: HashMap<String, TypeIndex>,
}

impl TypeIndexMap {
    pub fn new(names: Vec<String>) -> Self {
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Self { names, index }
    }

    /// Get the number of zone types.
    #[inline] pub fn len(&self) -> usize { self.names.len() }

    /// Check if there are no zone types.
    #[inline] pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// Get the dense index of a zone code, if selected.
    #[inline] pub fn get(&self, name: &str) -> Option<TypeIndex> { self.index.get(name).copied() }

    /// Get the zone code at a dense index.
    #[inline] pub fn name(&self, idx: TypeIndex) -> &str { &self.names[idx] }

    /// Get all zone codes in index order.
    #[inline] pub fn names(&self) -> &[String] { &self.names }
}
