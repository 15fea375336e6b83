//! Provider-side capability state and the provider seam.
//!
//! Every provider of a type embeds a [`ProviderCapabilities`]: the bundle
//! reference plus this provider's own declared-capability set and its
//! privately extended confine collections. Capability queries are ordinary
//! method calls on the embedded value.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::confine::{
    ConfineCollection, ConfineSubject, Criteria, FeatureConfineCollection,
};
use crate::errors::DefinitionError;
use crate::feature::canonical_name;

use super::CapabilityBundle;

/// One provider's view of its type's capability bundle.
#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    bundle: Arc<CapabilityBundle>,
    declared: BTreeSet<String>,
    extended: HashMap<String, FeatureConfineCollection>,
}

impl ProviderCapabilities {
    pub fn new(bundle: Arc<CapabilityBundle>) -> Self {
        Self {
            bundle,
            declared: BTreeSet::new(),
            extended: HashMap::new(),
        }
    }

    pub fn bundle(&self) -> &CapabilityBundle {
        &self.bundle
    }

    /// Has the capability been explicitly declared on this provider?
    pub fn declares(&self, name: &str) -> bool {
        self.declared.contains(&canonical_name(name))
    }

    /// Record explicit support for the listed capability names. Idempotent
    /// and accumulating; declaration wins over confine evaluation.
    pub fn declare_capabilities<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.declared.insert(canonical_name(name.as_ref()));
        }
    }

    /// Does the provider support the capability? Explicit declaration is
    /// consulted first; otherwise this provider's confine collection for
    /// the capability (extended or bundle-cloned) is evaluated.
    pub fn has_capability(&self, name: &str, subject: &dyn ConfineSubject) -> bool {
        let canonical = canonical_name(name);
        if self.declared.contains(&canonical) {
            return true;
        }
        match self.collection(&canonical) {
            Some(collection) => collection.valid(subject),
            None => false,
        }
    }

    /// Registered capability names this provider supports, sorted
    /// alphabetically.
    pub fn capabilities(&self, subject: &dyn ConfineSubject) -> Vec<String> {
        let mut names: Vec<String> = self
            .bundle
            .feature_names()
            .into_iter()
            .filter(|name| self.has_capability(name, subject))
            .collect();
        names.sort();
        names
    }

    /// Does the provider support every listed capability? Vacuously true
    /// for an empty list; stops at the first failure.
    pub fn satisfies<S: AsRef<str>>(&self, names: &[S], subject: &dyn ConfineSubject) -> bool {
        names
            .iter()
            .all(|name| self.has_capability(name.as_ref(), subject))
    }

    /// Append confines to this provider's private copy of the named
    /// capability's collection. The bundle and sibling providers are
    /// never affected. Unknown capability names are a definition error.
    pub fn extend_confine(
        &mut self,
        name: &str,
        criteria: Criteria,
    ) -> Result<(), DefinitionError> {
        let canonical = canonical_name(name);
        let collection = match self.extended.entry(canonical.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                let Some(master) = self.bundle.get(&canonical) else {
                    return Err(DefinitionError::UnknownCapability {
                        type_name: self.bundle.type_name().to_string(),
                        capability: canonical,
                    });
                };
                log::debug!(
                    "extending confines of capability '{}' on type '{}'",
                    canonical,
                    self.bundle.type_name()
                );
                slot.insert(master.clone())
            }
        };
        collection.confine(criteria)
    }

    fn collection(&self, canonical: &str) -> Option<&FeatureConfineCollection> {
        self.extended
            .get(canonical)
            .or_else(|| self.bundle.get(canonical))
    }
}

/// The seam a concrete provider implements: it is its own confine subject
/// and carries its capability view and optional provider-level confines.
pub trait Provider: ConfineSubject {
    /// Provider name as registered for its resource type.
    fn name(&self) -> &str;

    /// The embedded capability view.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Provider-level confines gating overall usability, if any were
    /// stated.
    fn confines(&self) -> Option<&ConfineCollection> {
        None
    }

    /// Is the provider usable on this host at all? A provider that states
    /// no confines is not; it opts in by overriding this check.
    fn suitable(&self) -> bool
    where
        Self: Sized,
    {
        match self.confines() {
            Some(confines) => confines.valid(self),
            None => false,
        }
    }
}
