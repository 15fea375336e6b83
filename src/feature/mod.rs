//! Per-type feature registry and definition DSL.
//!
//! A resource type declares its optional capabilities ("features") here,
//! each guarded by zero or more confines. Entries are created at
//! type-definition time; after startup the only permitted mutation is
//! appending confines to an existing feature.

pub mod docs;

use crate::capability::ProviderCapabilities;
use crate::confine::{Criteria, FeatureConfineCollection};
use crate::errors::DefinitionError;

/// Canonical feature-name form: trimmed, ASCII-lowercased.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Insertion-tracked mapping from feature name to its confine collection,
/// owned by one resource type.
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    type_name: String,
    features: Vec<FeatureConfineCollection>,
}

impl FeatureRegistry {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            features: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declare a named feature with its documentation and optional initial
    /// criteria. Registering a name twice is a definition error.
    pub fn declare_feature(
        &mut self,
        name: &str,
        docs: &str,
        criteria: Option<Criteria>,
    ) -> Result<(), DefinitionError> {
        let canonical = canonical_name(name);
        if self.get(&canonical).is_some() {
            return Err(DefinitionError::DuplicateFeature {
                type_name: self.type_name.clone(),
                feature: canonical,
            });
        }
        let label = format!("{}.{}", self.type_name, canonical);
        let mut collection = FeatureConfineCollection::new(canonical.clone(), label, docs)?;
        if let Some(criteria) = criteria {
            if !criteria.is_empty() {
                collection.confine(criteria)?;
            }
        }
        log::debug!("declared feature '{}' on type '{}'", canonical, self.type_name);
        self.features.push(collection);
        Ok(())
    }

    /// Declared names in insertion order.
    pub fn feature_names(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|feature| feature.name().to_string())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureConfineCollection> {
        let canonical = canonical_name(name);
        self.features
            .iter()
            .find(|feature| feature.name() == canonical)
    }

    /// Mutable access for type-definition-time confine additions.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FeatureConfineCollection> {
        let canonical = canonical_name(name);
        self.features
            .iter_mut()
            .find(|feature| feature.name() == canonical)
    }

    pub fn features(&self) -> &[FeatureConfineCollection] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Render the feature documentation, with a provider support matrix
    /// when any providers are registered for the type.
    pub fn feature_documentation(
        &self,
        providers: &[(String, &ProviderCapabilities)],
    ) -> String {
        docs::render(self, providers)
    }
}
