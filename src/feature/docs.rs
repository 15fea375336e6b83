//! Feature documentation rendering.
//!
//! Produces the feature list for a type's reference documentation and,
//! when providers are registered, a provider-by-feature support matrix.
//! Cell truth is the provider's explicit declaration, not a live confine
//! evaluation: the matrix documents what providers claim, independent of
//! the rendering host.

use once_cell::sync::Lazy;
use regex::Regex;

use super::FeatureRegistry;
use crate::capability::ProviderCapabilities;

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse internal whitespace and newline runs to single spaces.
pub fn scrub(text: &str) -> String {
    WHITESPACE_RUNS.replace_all(text.trim(), " ").into_owned()
}

/// Render the documentation text for a feature registry.
pub fn render(registry: &FeatureRegistry, providers: &[(String, &ProviderCapabilities)]) -> String {
    if registry.is_empty() {
        return String::new();
    }

    let mut features: Vec<_> = registry.features().iter().collect();
    features.sort_by(|a, b| a.name().cmp(b.name()));

    let mut out = String::from("Available features:\n\n");
    for feature in &features {
        out.push_str(&format!("- `{}`: {}\n", feature.name(), scrub(feature.docs())));
    }

    if !providers.is_empty() {
        out.push_str("\nProvider support:\n\n");
        out.push_str("| Provider |");
        for feature in &features {
            out.push_str(&format!(" {} |", feature.name()));
        }
        out.push('\n');
        out.push_str("| --- |");
        for _ in &features {
            out.push_str(" --- |");
        }
        out.push('\n');
        for (name, capabilities) in providers {
            out.push_str(&format!("| {} |", name));
            for feature in &features {
                let marker = if capabilities.declares(feature.name()) {
                    "X"
                } else {
                    " "
                };
                out.push_str(&format!(" {} |", marker));
            }
            out.push('\n');
        }
    }

    out
}
