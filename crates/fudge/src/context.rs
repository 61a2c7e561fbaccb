//! Process-level configuration for the Fudge system.

use std::sync::Arc;

use crate::json::JsonSettings;
use crate::message::FudgeMsg;
use crate::taxonomy::{Taxonomy, TaxonomyResolver};
use crate::types::TypeDictionary;

/// Resolver used when no taxonomies are configured.
#[derive(Debug, Clone, Copy, Default)]
struct NoTaxonomies;

impl TaxonomyResolver for NoTaxonomies {
    fn resolve(&self, _taxonomy_id: i16) -> Option<Arc<Taxonomy>> {
        None
    }
}

/// The process-wide context: the type dictionary, the taxonomy resolver, the
/// message factory and default JSON settings.
///
/// Constructed by the host and treated as immutable once streams are built
/// from it; cloning is cheap enough that readers and writers each hold one.
#[derive(Clone)]
pub struct FudgeContext {
    dictionary: TypeDictionary,
    resolver: Arc<dyn TaxonomyResolver>,
    json_settings: JsonSettings,
}

impl Default for FudgeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FudgeContext {
    /// A context with the standard type dictionary and no taxonomies.
    pub fn new() -> Self {
        Self {
            dictionary: TypeDictionary::new(),
            resolver: Arc::new(NoTaxonomies),
            json_settings: JsonSettings::default(),
        }
    }

    /// Replaces the taxonomy resolver.
    pub fn with_taxonomy_resolver(mut self, resolver: impl TaxonomyResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Replaces the type dictionary.
    pub fn with_dictionary(mut self, dictionary: TypeDictionary) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Replaces the JSON settings.
    pub fn with_json_settings(mut self, settings: JsonSettings) -> Self {
        self.json_settings = settings;
        self
    }

    pub fn dictionary(&self) -> &TypeDictionary {
        &self.dictionary
    }

    pub fn json_settings(&self) -> &JsonSettings {
        &self.json_settings
    }

    /// Resolves a taxonomy id; 0 always means none.
    pub fn taxonomy(&self, taxonomy_id: i16) -> Option<Arc<Taxonomy>> {
        if taxonomy_id == 0 {
            None
        } else {
            self.resolver.resolve(taxonomy_id)
        }
    }

    /// Creates an empty mutable message.
    pub fn new_message(&self) -> FudgeMsg {
        FudgeMsg::new()
    }
}

impl std::fmt::Debug for FudgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FudgeContext")
            .field("json_settings", &self.json_settings)
            .finish_non_exhaustive()
    }
}
