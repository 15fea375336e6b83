//! Definition-error taxonomy for the confinement engine.
//!
//! These errors mark bugs in type or provider declarations. They abort the
//! defining code path immediately and are never retried. A confine failing
//! to pass, an absent fact, or a missing file is an ordinary `false`
//! evaluation result, not an error.

use thiserror::Error;

/// Fatal errors raised while defining features, confines, or capability
/// extensions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// A feature name was registered twice on the same resource type.
    #[error("feature '{feature}' is already declared on type '{type_name}'")]
    DuplicateFeature { type_name: String, feature: String },

    /// A provider tried to extend the confines of a capability its type
    /// never declared.
    #[error("unknown capability '{capability}' on type '{type_name}'")]
    UnknownCapability {
        type_name: String,
        capability: String,
    },

    /// A required constructor argument was absent or empty.
    #[error("missing required {field} for {what}")]
    MissingField { what: String, field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_feature_message_names_the_feature() {
        let err = DefinitionError::DuplicateFeature {
            type_name: "package".to_string(),
            feature: "purgeable".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("purgeable"));
        assert!(rendered.contains("package"));
    }

    #[test]
    fn unknown_capability_message_names_the_capability() {
        let err = DefinitionError::UnknownCapability {
            type_name: "service".to_string(),
            capability: "enableable".to_string(),
        };
        assert!(err.to_string().contains("enableable"));
    }
}
