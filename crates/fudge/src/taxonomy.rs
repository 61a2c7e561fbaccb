//! Taxonomies translate field ordinals to names and back.
//!
//! A taxonomy is immutable per taxonomy id and shared between concurrent
//! readers, so resolvers hand out `Arc<Taxonomy>`.

use std::collections::HashMap;
use std::sync::Arc;

/// An ordinal ↔ name table.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    by_ordinal: HashMap<i16, String>,
    by_name: HashMap<String, i16>,
}

impl Taxonomy {
    /// Builds a taxonomy from (ordinal, name) entries.
    ///
    /// A name mapped by more than one ordinal is ambiguous and is dropped
    /// from the name → ordinal index entirely, so encode-side substitution
    /// never guesses.
    pub fn new(entries: impl IntoIterator<Item = (i16, String)>) -> Self {
        let mut by_ordinal = HashMap::new();
        let mut by_name: HashMap<String, i16> = HashMap::new();
        let mut ambiguous = Vec::new();
        for (ordinal, name) in entries {
            if by_name.contains_key(&name) {
                ambiguous.push(name.clone());
            } else {
                by_name.insert(name.clone(), ordinal);
            }
            by_ordinal.insert(ordinal, name);
        }
        for name in ambiguous {
            by_name.remove(&name);
        }
        Self {
            by_ordinal,
            by_name,
        }
    }

    /// The name for an ordinal, if the taxonomy defines one.
    pub fn name_of(&self, ordinal: i16) -> Option<&str> {
        self.by_ordinal.get(&ordinal).map(String::as_str)
    }

    /// The ordinal for a name, if the taxonomy maps it unambiguously.
    pub fn ordinal_of(&self, name: &str) -> Option<i16> {
        self.by_name.get(name).copied()
    }
}

/// Resolves 16-bit taxonomy ids to taxonomies. Lookups must be safe for
/// concurrent readers.
pub trait TaxonomyResolver: Send + Sync {
    fn resolve(&self, taxonomy_id: i16) -> Option<Arc<Taxonomy>>;
}

/// A resolver backed by a fixed map of taxonomies.
#[derive(Debug, Clone, Default)]
pub struct MapTaxonomyResolver {
    taxonomies: HashMap<i16, Arc<Taxonomy>>,
}

impl MapTaxonomyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, taxonomy_id: i16, taxonomy: Taxonomy) {
        self.taxonomies.insert(taxonomy_id, Arc::new(taxonomy));
    }
}

impl TaxonomyResolver for MapTaxonomyResolver {
    fn resolve(&self, taxonomy_id: i16) -> Option<Arc<Taxonomy>> {
        self.taxonomies.get(&taxonomy_id).cloned()
    }
}
