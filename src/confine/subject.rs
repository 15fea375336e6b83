//! The evaluation subject contract.
//!
//! Confines evaluate against a subject: the provider under test together
//! with the collaborators supplying host facts, path resolution, and the
//! process-wide feature oracle. The trait defaults answer "unknown" for
//! subject-owned lookups and delegate path and feature probes to [`host`],
//! so a provider only overrides what it actually knows about.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host;

/// What a confine may ask of its subject.
pub trait ConfineSubject {
    /// Current value of a named host fact, if known.
    fn fact(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Does the subject expose a callable of the given name?
    fn has_method(&self, _name: &str) -> bool {
        false
    }

    /// Is a process-wide feature available?
    fn global_feature(&self, name: &str) -> bool {
        host::global_feature_available(name)
    }

    /// Does the path exist on the host?
    fn path_exists(&self, path: &str) -> bool {
        host::path_exists(path)
    }

    /// Locate an executable by name on the search path.
    fn find_on_search_path(&self, name: &str) -> Option<PathBuf> {
        host::find_on_search_path(name)
    }
}

/// An owned, table-driven subject.
///
/// Embedders hand one to the engine when the provider itself is not the
/// subject (dry runs, remote catalogs); tests use it to pin every lookup.
/// Path and binary tables are optional: when absent, probes fall through
/// to the real host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasicSubject {
    /// Host facts by name.
    #[serde(default)]
    pub facts: HashMap<String, Value>,
    /// Methods the subject answers for.
    #[serde(default)]
    pub methods: BTreeSet<String>,
    /// Process-wide features, overriding the global oracle.
    #[serde(default)]
    pub global_features: BTreeSet<String>,
    /// When set, the only paths that exist.
    #[serde(default)]
    pub paths: Option<BTreeSet<String>>,
    /// When set, the only binaries resolvable on the search path.
    #[serde(default)]
    pub binaries: Option<HashMap<String, PathBuf>>,
}

impl BasicSubject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fact(mut self, name: &str, value: Value) -> Self {
        self.facts.insert(name.to_string(), value);
        self
    }

    pub fn with_method(mut self, name: &str) -> Self {
        self.methods.insert(name.to_string());
        self
    }

    pub fn with_global_feature(mut self, name: &str) -> Self {
        self.global_features.insert(name.to_ascii_lowercase());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.paths
            .get_or_insert_with(BTreeSet::new)
            .insert(path.to_string());
        self
    }

    pub fn with_binary(mut self, name: &str, path: &str) -> Self {
        self.binaries
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), PathBuf::from(path));
        self
    }
}

impl ConfineSubject for BasicSubject {
    fn fact(&self, name: &str) -> Option<Value> {
        self.facts.get(name).cloned()
    }

    fn has_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    fn global_feature(&self, name: &str) -> bool {
        self.global_features.contains(&name.to_ascii_lowercase())
    }

    fn path_exists(&self, path: &str) -> bool {
        match &self.paths {
            Some(paths) => paths.contains(path),
            None => host::path_exists(path),
        }
    }

    fn find_on_search_path(&self, name: &str) -> Option<PathBuf> {
        match &self.binaries {
            Some(binaries) => binaries.get(name).cloned(),
            None => host::find_on_search_path(name),
        }
    }
}
