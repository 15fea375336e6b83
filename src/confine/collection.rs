//! Confine collections: the bags of predicates owned by providers and by
//! declared features.
//!
//! Both collection types share the same evaluation rule: an empty
//! collection is not valid. Absence of any stated requirement means "not
//! explicitly confined", which this layer treats as not applicable; callers
//! opt in through explicit capability declaration instead.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{summarize, truthy, Confine, ConfineKind, ConfineSubject, SummaryOutcome};
use crate::errors::DefinitionError;

/// Reserved criteria key: when truthy, existence values are treated as
/// executable names to locate on the search path.
pub const FOR_BINARY_KEY: &str = "for_binary";

/// Declaration input for one `confine` call: an ordered mapping from
/// predicate-kind name (or arbitrary fact name) to candidate values.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    entries: Vec<(String, Vec<Value>)>,
    for_binary: bool,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one kind with a single candidate value.
    pub fn with(mut self, kind: &str, value: impl Into<Value>) -> Self {
        self.entries.push((kind.to_string(), vec![value.into()]));
        self
    }

    /// Append one kind with several candidate values.
    pub fn with_all(mut self, kind: &str, values: Vec<Value>) -> Self {
        self.entries.push((kind.to_string(), values));
        self
    }

    /// Treat existence values as binaries to locate on the search path.
    pub fn for_binary(mut self, for_binary: bool) -> Self {
        self.for_binary = for_binary;
        self
    }

    /// Build criteria from a JSON object. The reserved [`FOR_BINARY_KEY`]
    /// is stripped and becomes the flag; scalar values normalize to
    /// one-element lists.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut criteria = Self::new();
        for (key, value) in map {
            if key == FOR_BINARY_KEY {
                criteria.for_binary = truthy(&value);
                continue;
            }
            let values = match value {
                Value::Array(list) => list,
                other => vec![other],
            };
            criteria.entries.push((key, values));
        }
        criteria
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve each criteria entry and append the resulting confines.
fn append_criteria(
    label: &str,
    confines: &mut Vec<Confine>,
    criteria: Criteria,
) -> Result<(), DefinitionError> {
    for (key, values) in criteria.entries {
        if values.is_empty() {
            return Err(DefinitionError::MissingField {
                what: format!("confine '{}' on {}", key, label),
                field: "values",
            });
        }
        let kind = ConfineKind::resolve(&key);
        let mut confine = Confine::new(kind, values);
        if criteria.for_binary && matches!(confine.kind(), ConfineKind::Exists) {
            confine.set_for_binary(true);
        }
        confine.set_label(label);
        confines.push(confine);
    }
    Ok(())
}

fn confines_valid(label: &str, confines: &[Confine], subject: &dyn ConfineSubject) -> bool {
    if confines.is_empty() {
        return false;
    }
    let mut ok = true;
    for confine in confines {
        if !confine.valid(subject) {
            ok = false;
            for value in confine.failing_values(subject) {
                log::debug!("{}: {}", label, confine.message(value));
            }
        }
    }
    ok
}

fn confines_summary(
    confines: &[Confine],
    subject: &dyn ConfineSubject,
) -> BTreeMap<String, SummaryOutcome> {
    let mut groups: BTreeMap<&str, Vec<&Confine>> = BTreeMap::new();
    for confine in confines {
        groups
            .entry(confine.kind().group_key())
            .or_default()
            .push(confine);
    }
    let mut summary = BTreeMap::new();
    for (key, group) in groups {
        let outcome = summarize(&group, subject);
        if !outcome.is_empty() {
            summary.insert(key.to_string(), outcome);
        }
    }
    summary
}

/// The unordered bag of confines belonging to one provider definition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfineCollection {
    label: String,
    confines: Vec<Confine>,
}

impl ConfineCollection {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confines: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confines(&self) -> &[Confine] {
        &self.confines
    }

    pub fn len(&self) -> usize {
        self.confines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confines.is_empty()
    }

    /// Append confines for every criteria entry, in declaration order.
    pub fn confine(&mut self, criteria: Criteria) -> Result<(), DefinitionError> {
        append_criteria(&self.label, &mut self.confines, criteria)
    }

    /// Is this provider usable at all? False when no confine was ever
    /// stated.
    pub fn valid(&self, subject: &dyn ConfineSubject) -> bool {
        confines_valid(&self.label, &self.confines, subject)
    }

    /// Failure summary per kind group, diagnostics only. Kinds with
    /// nothing to report are omitted.
    pub fn summary(&self, subject: &dyn ConfineSubject) -> BTreeMap<String, SummaryOutcome> {
        confines_summary(&self.confines, subject)
    }
}

/// The named, documented bag of confines belonging to one declared feature
/// of a resource type.
///
/// The type owns one master instance per feature; capability bundles and
/// extending providers work on clones. All contained state is owned, so
/// `Clone` is a deep copy and appending to a clone is never observable
/// from the original or from sibling clones.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureConfineCollection {
    name: String,
    label: String,
    docs: String,
    confines: Vec<Confine>,
}

impl FeatureConfineCollection {
    /// All three of `name`, `label`, and `docs` are required.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        docs: impl Into<String>,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        let label = label.into();
        let docs = docs.into();
        for (field, value) in [("name", &name), ("label", &label), ("docs", &docs)] {
            if value.trim().is_empty() {
                return Err(DefinitionError::MissingField {
                    what: "feature confine collection".to_string(),
                    field,
                });
            }
        }
        Ok(Self {
            name,
            label,
            docs,
            confines: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn docs(&self) -> &str {
        &self.docs
    }

    pub fn confines(&self) -> &[Confine] {
        &self.confines
    }

    pub fn len(&self) -> usize {
        self.confines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confines.is_empty()
    }

    /// Append confines for every criteria entry.
    pub fn confine(&mut self, criteria: Criteria) -> Result<(), DefinitionError> {
        append_criteria(&self.label, &mut self.confines, criteria)
    }

    /// Does the subject support this feature? False when the feature
    /// states no confines.
    pub fn valid(&self, subject: &dyn ConfineSubject) -> bool {
        confines_valid(&self.label, &self.confines, subject)
    }

    /// Failure summary per kind group, diagnostics only.
    pub fn summary(&self, subject: &dyn ConfineSubject) -> BTreeMap<String, SummaryOutcome> {
        confines_summary(&self.confines, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confine::BasicSubject;
    use serde_json::json;

    #[test]
    fn empty_collections_are_never_valid() {
        let subject = BasicSubject::new();
        let collection = ConfineCollection::new("pkg.apt");
        assert!(!collection.valid(&subject));

        let feature =
            FeatureConfineCollection::new("purgeable", "Pkg.purgeable", "Purges.").unwrap();
        assert!(!feature.valid(&subject));
    }

    #[test]
    fn valid_requires_every_confine_to_hold() {
        let _ = env_logger::builder().is_test(true).try_init();
        let subject = BasicSubject::new().with_method("purge");
        let mut collection = ConfineCollection::new("pkg.apt");
        collection
            .confine(
                Criteria::new()
                    .with("true", true)
                    .with("has_method", "purge"),
            )
            .unwrap();
        assert!(collection.valid(&subject));

        collection
            .confine(Criteria::new().with("has_method", "flush"))
            .unwrap();
        assert!(!collection.valid(&subject));
    }

    #[test]
    fn criteria_map_strips_the_reserved_key() {
        let mut map = Map::new();
        map.insert("exists".to_string(), json!(["mount", "umount"]));
        map.insert(FOR_BINARY_KEY.to_string(), json!(true));
        map.insert("has_method".to_string(), json!("remount"));

        let mut collection = ConfineCollection::new("mount.posix");
        collection.confine(Criteria::from_map(map)).unwrap();

        // Two entries remain after the flag is stripped.
        assert_eq!(collection.len(), 2);
        let exists = collection
            .confines()
            .iter()
            .find(|c| c.kind() == &ConfineKind::Exists)
            .unwrap();
        assert!(exists.for_binary());
        assert_eq!(exists.values().len(), 2);

        let method = collection
            .confines()
            .iter()
            .find(|c| c.kind() == &ConfineKind::HasMethod)
            .unwrap();
        assert!(!method.for_binary());
    }

    #[test]
    fn for_binary_applies_only_to_exists_confines() {
        let mut collection = ConfineCollection::new("svc.init");
        collection
            .confine(
                Criteria::new()
                    .with("exists", "service")
                    .with("has_method", "restart")
                    .for_binary(true),
            )
            .unwrap();
        let flags: Vec<bool> = collection.confines().iter().map(|c| c.for_binary()).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn confines_carry_the_collection_label() {
        let mut collection = ConfineCollection::new("pkg.apt");
        collection.confine(Criteria::new().with("true", true)).unwrap();
        assert_eq!(collection.confines()[0].label(), "pkg.apt");
    }

    #[test]
    fn empty_value_lists_are_a_definition_error() {
        let mut collection = ConfineCollection::new("pkg.apt");
        let err = collection
            .confine(Criteria::new().with_all("exists", vec![]))
            .unwrap_err();
        assert!(matches!(err, DefinitionError::MissingField { .. }));
    }

    #[test]
    fn feature_collections_require_name_label_and_docs() {
        assert!(FeatureConfineCollection::new("", "label", "docs").is_err());
        assert!(FeatureConfineCollection::new("name", " ", "docs").is_err());
        assert!(FeatureConfineCollection::new("name", "label", "").is_err());
        assert!(FeatureConfineCollection::new("name", "label", "docs").is_ok());
    }

    #[test]
    fn cloned_feature_collections_are_structurally_independent() {
        let mut master =
            FeatureConfineCollection::new("holdable", "Pkg.holdable", "Holds.").unwrap();
        master
            .confine(Criteria::new().with("has_method", "hold"))
            .unwrap();

        let mut copy = master.clone();
        copy.confine(Criteria::new().with("exists", "/usr/bin/hold"))
            .unwrap();

        assert_eq!(master.len(), 1);
        assert_eq!(copy.len(), 2);

        let mut sibling = master.clone();
        sibling
            .confine(Criteria::new().with("true", true))
            .unwrap();
        assert_eq!(master.len(), 1);
        assert_eq!(copy.len(), 2);
        assert_eq!(sibling.len(), 2);
    }

    #[test]
    fn summary_groups_by_kind_and_omits_clean_groups() {
        let subject = BasicSubject::new()
            .with_method("one")
            .with_path("/etc/present");
        let mut collection = ConfineCollection::new("pkg.apt");
        collection
            .confine(
                Criteria::new()
                    .with_all("has_method", vec![json!("one"), json!("two")])
                    .with("exists", "/etc/present")
                    .with("false", true),
            )
            .unwrap();

        let summary = collection.summary(&subject);
        assert_eq!(
            summary.get("has_method"),
            Some(&SummaryOutcome::Missing(vec!["two".to_string()]))
        );
        // Every stated path exists, so the group reports nothing.
        assert!(!summary.contains_key("exists"));
        // The false-kind group counts passing (falsy) values: none here.
        assert!(!summary.contains_key("false"));
    }

    #[test]
    fn summary_never_fails_on_an_unhelpful_subject() {
        let subject = BasicSubject::new();
        let mut collection = ConfineCollection::new("pkg.apt");
        collection
            .confine(Criteria::new().with("osfamily", "RedHat"))
            .unwrap();
        let summary = collection.summary(&subject);
        assert_eq!(
            summary.get("variable"),
            Some(&SummaryOutcome::Missing(vec!["osfamily".to_string()]))
        );
    }
}
