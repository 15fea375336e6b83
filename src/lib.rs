//! # confine
//!
//! Capability confinement engine for provider-backed resource types.
//!
//! A configuration-management system needs to decide, at runtime, whether a
//! pluggable implementation ("provider") of an abstract resource type is
//! usable on the current host, and whether it supports particular optional
//! capabilities ("features"). This crate supplies the pieces of that
//! decision:
//!
//! - [`Confine`]: a single boolean predicate over host facts, filesystem
//!   state, method availability, or process-wide features.
//! - [`ConfineCollection`] / [`FeatureConfineCollection`]: the bags of
//!   confines owned by a provider definition or a declared feature.
//! - [`FeatureRegistry`]: the per-type feature declaration DSL.
//! - [`CapabilityBundle`] / [`ProviderCapabilities`]: the synthesized,
//!   memoized per-type capability operations and each provider's private,
//!   extensible view of them.
//!
//! A type registers features; the bundle is built lazily on first use,
//! cloning each feature's confines so providers get independent copies; at
//! evaluation time a provider consults its capability view, which evaluates
//! the cloned collections against the provider as subject. Failed
//! confinement is an ordinary `false`, never an error; detailed reasons are
//! available only through the summary and documentation paths.

pub mod capability;
pub mod confine;
pub mod errors;
pub mod feature;
pub mod host;

pub use capability::{CapabilityBundle, Provider, ProviderCapabilities};
pub use confine::{
    BasicSubject, Confine, ConfineCollection, ConfineKind, ConfineSubject, Criteria,
    FeatureConfineCollection, SummaryOutcome,
};
pub use errors::DefinitionError;
pub use feature::FeatureRegistry;

/// Library version.
pub const VERSION: &str = "0.1.0";

#[cfg(test)]
mod tests {
    use super::*;

    // The full flow: declare features on a type, synthesize the bundle,
    // give two providers independent views, evaluate.
    #[test]
    fn end_to_end_confinement() {
        let mut registry = FeatureRegistry::new("filesystem");
        registry
            .declare_feature(
                "mountable",
                "Can mount and unmount volumes.",
                Some(Criteria::new().with("has_method", "mount")),
            )
            .unwrap();
        registry
            .declare_feature("resizable", "Can grow volumes online.", None)
            .unwrap();

        let bundle = CapabilityBundle::for_type(&registry);
        let mut linux = ProviderCapabilities::new(bundle.clone());
        let mut bsd = ProviderCapabilities::new(bundle);

        let subject = BasicSubject::new().with_method("mount");

        assert!(linux.has_capability("mountable", &subject));
        assert!(!linux.has_capability("resizable", &subject));

        linux
            .extend_confine("resizable", Criteria::new().with("has_method", "mount"))
            .unwrap();
        assert!(linux.has_capability("resizable", &subject));
        assert!(!bsd.has_capability("resizable", &subject));

        bsd.declare_capabilities(["resizable"]);
        assert!(bsd.has_capability("resizable", &subject));

        assert_eq!(
            linux.capabilities(&subject),
            vec!["mountable", "resizable"]
        );
    }
}
