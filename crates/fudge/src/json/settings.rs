//! Settings for the JSON surface.

use serde::Deserialize;

use crate::error::FudgeError;

/// Key names under which envelope metadata appears in a JSON document.
///
/// Loadable from a JSON settings document; any omitted key keeps its
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonSettings {
    pub processing_directives_field: String,
    pub schema_version_field: String,
    pub taxonomy_field: String,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self {
            processing_directives_field: "fudgeProcessingDirectives".to_owned(),
            schema_version_field: "fudgeSchemaVersion".to_owned(),
            taxonomy_field: "fudgeTaxonomy".to_owned(),
        }
    }
}

impl JsonSettings {
    /// Loads settings from a JSON document.
    pub fn from_json(text: &str) -> Result<Self, FudgeError> {
        serde_json::from_str(text).map_err(|e| FudgeError::InvalidJson(e.to_string()))
    }
}
