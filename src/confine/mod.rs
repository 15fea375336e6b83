//! Confine predicates: the unit of runtime suitability checking.
//!
//! A confine is a single boolean predicate with one or more candidate
//! values, evaluated against a subject (a provider and its host). Providers
//! and declared features own bags of confines (see [`collection`]); a
//! provider is usable, or a feature supported, when its confines hold.
//!
//! The predicate kinds form a closed set. Names that resolve to no built-in
//! kind fall back to the fact-variable kind, with the name itself bound as
//! the fact to check; an unknown kind name is never an error.

pub mod collection;
pub mod subject;

pub use collection::{ConfineCollection, Criteria, FeatureConfineCollection};
pub use subject::{BasicSubject, ConfineSubject};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of predicate kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfineKind {
    /// Every candidate value must be truthy.
    True,
    /// Every candidate value must be falsy.
    False,
    /// Every candidate path (or binary name, with `for_binary`) must exist.
    Exists,
    /// The subject must expose every named method.
    HasMethod,
    /// Every named process-wide feature must be available.
    HasFeature,
    /// Fallback: the named fact's value must match one of the candidates.
    Variable(String),
}

impl ConfineKind {
    /// Kind-name registry. A fixed mapping; anything else routes to the
    /// fact-variable fallback with the name bound as the fact to check.
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "true" => Self::True,
            "false" => Self::False,
            "exists" => Self::Exists,
            "has_method" => Self::HasMethod,
            "feature" => Self::HasFeature,
            other => Self::Variable(other.to_string()),
        }
    }

    /// Grouping key for diagnostics. All fact-variable confines share one
    /// group regardless of which fact they check.
    pub fn group_key(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Exists => "exists",
            Self::HasMethod => "has_method",
            Self::HasFeature => "feature",
            Self::Variable(_) => "variable",
        }
    }
}

/// A single predicate with its candidate values.
///
/// Constructed only by the owning collection, which guarantees the value
/// list is never empty and stamps the diagnostic label.
#[derive(Debug, Clone, Serialize)]
pub struct Confine {
    kind: ConfineKind,
    values: Vec<Value>,
    label: String,
    for_binary: bool,
}

impl Confine {
    pub(crate) fn new(kind: ConfineKind, values: Vec<Value>) -> Self {
        Self {
            kind,
            values,
            label: String::new(),
            for_binary: false,
        }
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub(crate) fn set_for_binary(&mut self, for_binary: bool) {
        self.for_binary = for_binary;
    }

    pub fn kind(&self) -> &ConfineKind {
        &self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// "Type.feature" or provider identity, diagnostics only.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn for_binary(&self) -> bool {
        self.for_binary
    }

    /// One outcome per candidate value, in declaration order.
    pub fn outcomes(&self, subject: &dyn ConfineSubject) -> Vec<bool> {
        self.values
            .iter()
            .map(|value| self.pass(value, subject))
            .collect()
    }

    /// Does the whole confine hold for the subject?
    ///
    /// Fact-variable confines use membership semantics (the fact must match
    /// one of the candidates); every other kind requires all candidates to
    /// pass.
    pub fn valid(&self, subject: &dyn ConfineSubject) -> bool {
        let outcomes = self.outcomes(subject);
        match self.kind {
            ConfineKind::Variable(_) => outcomes.iter().any(|ok| *ok),
            _ => outcomes.iter().all(|ok| *ok),
        }
    }

    /// Candidate values that did not pass, in declaration order.
    pub fn failing_values(&self, subject: &dyn ConfineSubject) -> Vec<&Value> {
        self.values
            .iter()
            .filter(|value| !self.pass(value, subject))
            .collect()
    }

    fn pass(&self, value: &Value, subject: &dyn ConfineSubject) -> bool {
        match &self.kind {
            ConfineKind::True => truthy(value),
            ConfineKind::False => !truthy(value),
            ConfineKind::Exists => match value_str(value) {
                Some(path) if !path.is_empty() => {
                    if self.for_binary {
                        subject.find_on_search_path(&path).is_some()
                    } else {
                        subject.path_exists(&path)
                    }
                }
                _ => false,
            },
            ConfineKind::HasMethod => value_str(value)
                .map(|method| subject.has_method(&method))
                .unwrap_or(false),
            ConfineKind::HasFeature => value_str(value)
                .map(|feature| subject.global_feature(&feature))
                .unwrap_or(false),
            ConfineKind::Variable(fact) => match subject.fact(fact) {
                Some(actual) => fact_matches(&actual, value),
                None => false,
            },
        }
    }

    /// Human-readable reason for one failing value.
    pub fn message(&self, value: &Value) -> String {
        match &self.kind {
            ConfineKind::True => "false value when expecting true".to_string(),
            ConfineKind::False => "true value when expecting false".to_string(),
            ConfineKind::Exists => {
                if self.for_binary {
                    format!("binary '{}' does not exist", display(value))
                } else {
                    format!("file '{}' does not exist", display(value))
                }
            }
            ConfineKind::HasMethod => {
                format!("method '{}' is not available", display(value))
            }
            ConfineKind::HasFeature => {
                format!("global feature '{}' is missing", display(value))
            }
            ConfineKind::Variable(fact) => {
                format!("fact '{}' does not match '{}'", fact, display(value))
            }
        }
    }
}

/// Aggregated failure information for one kind across sibling confines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// Passing-value count (truthiness kinds).
    Count(usize),
    /// Values that failed, deduplicated where the kind calls for a union.
    Missing(Vec<String>),
}

impl SummaryOutcome {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Count(count) => *count == 0,
            Self::Missing(missing) => missing.is_empty(),
        }
    }
}

/// Summarize all sibling confines of one kind group. Best effort: an empty
/// group or an unhelpful subject yields an empty outcome, never a failure.
pub(crate) fn summarize(
    group: &[&Confine],
    subject: &dyn ConfineSubject,
) -> SummaryOutcome {
    let Some(first) = group.first() else {
        return SummaryOutcome::Missing(Vec::new());
    };
    match first.kind() {
        ConfineKind::True | ConfineKind::False => {
            let passing = group
                .iter()
                .map(|confine| {
                    confine
                        .outcomes(subject)
                        .into_iter()
                        .filter(|ok| *ok)
                        .count()
                })
                .sum();
            SummaryOutcome::Count(passing)
        }
        ConfineKind::Exists => {
            let missing = group
                .iter()
                .flat_map(|confine| confine.failing_values(subject))
                .map(display)
                .collect();
            SummaryOutcome::Missing(missing)
        }
        ConfineKind::HasMethod | ConfineKind::HasFeature => {
            let mut missing = Vec::new();
            for confine in group {
                for value in confine.failing_values(subject) {
                    let name = display(value);
                    if !missing.contains(&name) {
                        missing.push(name);
                    }
                }
            }
            SummaryOutcome::Missing(missing)
        }
        ConfineKind::Variable(_) => {
            let mut failing = Vec::new();
            for confine in group {
                if let ConfineKind::Variable(fact) = confine.kind() {
                    if !confine.valid(subject) && !failing.contains(fact) {
                        failing.push(fact.clone());
                    }
                }
            }
            SummaryOutcome::Missing(failing)
        }
    }
}

/// `null` and `false` are falsy; everything else is truthy.
pub(crate) fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Scalar string form, when the value has one.
fn value_str(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn display(value: &Value) -> String {
    value_str(value).unwrap_or_else(|| value.to_string())
}

/// Loose fact comparison: booleans match booleans and the strings
/// "true"/"false"; everything else compares by case-insensitive string
/// form, falling back to structural equality for composite values.
fn fact_matches(actual: &Value, candidate: &Value) -> bool {
    match (actual, candidate) {
        (Value::Bool(actual), Value::Bool(candidate)) => actual == candidate,
        (Value::Bool(actual), Value::String(candidate)) => {
            candidate.eq_ignore_ascii_case(if *actual { "true" } else { "false" })
        }
        _ => match (value_str(actual), value_str(candidate)) {
            (Some(actual), Some(candidate)) => actual.eq_ignore_ascii_case(&candidate),
            _ => actual == candidate,
        },
    }
}
