//! Per-type capability bundles.
//!
//! A bundle is the reusable set of capability-check operations every
//! provider of a resource type exposes. It is built from the type's
//! feature registry by deep-cloning each feature's confine collection, so
//! the registry master is never touched again after synthesis. Bundles are
//! memoized per type name and live for the process lifetime.

pub mod provider;

pub use provider::{Provider, ProviderCapabilities};

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::confine::FeatureConfineCollection;
use crate::feature::{canonical_name, FeatureRegistry};

static BUNDLES: Lazy<DashMap<String, Arc<CapabilityBundle>>> = Lazy::new(DashMap::new);

/// The synthesized, per-type set of feature confine collections shared by
/// all providers of the type.
#[derive(Debug, Clone)]
pub struct CapabilityBundle {
    type_name: String,
    features: Vec<FeatureConfineCollection>,
}

impl CapabilityBundle {
    /// Build a bundle directly from a feature registry, cloning every
    /// entry. Use [`CapabilityBundle::for_type`] for the memoized form.
    pub fn build(registry: &FeatureRegistry) -> Self {
        Self {
            type_name: registry.type_name().to_string(),
            features: registry.features().to_vec(),
        }
    }

    /// The memoized bundle for a type, built at most once per type name.
    ///
    /// The concurrent-map entry lock is the initialization guard: parallel
    /// first requests for one type agree on a single bundle, and later
    /// requests return the same shared instance.
    pub fn for_type(registry: &FeatureRegistry) -> Arc<Self> {
        BUNDLES
            .entry(registry.type_name().to_string())
            .or_insert_with(|| {
                log::debug!(
                    "building capability bundle for type '{}' ({} features)",
                    registry.type_name(),
                    registry.len()
                );
                Arc::new(Self::build(registry))
            })
            .clone()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Registered capability names in declaration order.
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

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confine::Criteria;

    #[test]
    fn for_type_memoizes_per_type_name() {
        let mut registry = FeatureRegistry::new("bundle-memo-type");
        registry.declare_feature("refreshable", "Refreshes.", None).unwrap();

        let first = CapabilityBundle::for_type(&registry);
        let second = CapabilityBundle::for_type(&registry);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.feature_names(), vec!["refreshable"]);
    }

    #[test]
    fn memoized_bundles_ignore_later_registry_changes() {
        let mut registry = FeatureRegistry::new("bundle-frozen-type");
        registry.declare_feature("one", "One.", None).unwrap();

        let bundle = CapabilityBundle::for_type(&registry);
        registry.declare_feature("two", "Two.", None).unwrap();

        assert_eq!(bundle.feature_names(), vec!["one"]);
        assert!(Arc::ptr_eq(
            &bundle,
            &CapabilityBundle::for_type(&registry)
        ));
    }

    #[test]
    fn built_bundles_are_independent_of_the_registry_master() {
        let mut registry = FeatureRegistry::new("service");
        registry
            .declare_feature(
                "enableable",
                "Enables at boot.",
                Some(Criteria::new().with("has_method", "enable")),
            )
            .unwrap();

        let bundle = CapabilityBundle::build(&registry);
        registry
            .get_mut("enableable")
            .unwrap()
            .confine(Criteria::new().with("has_method", "disable"))
            .unwrap();

        assert_eq!(registry.get("enableable").unwrap().len(), 2);
        assert_eq!(bundle.get("enableable").unwrap().len(), 1);
    }

    #[test]
    fn lookup_is_canonical() {
        let mut registry = FeatureRegistry::new("exec");
        registry.declare_feature("creatable", "Creates.", None).unwrap();
        let bundle = CapabilityBundle::build(&registry);
        assert!(bundle.get(" Creatable ").is_some());
        assert!(bundle.get("deletable").is_none());
    }
}
