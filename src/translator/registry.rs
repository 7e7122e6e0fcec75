//! # Translator Registry
//!
//! Immutable mapping from routing key to translator, built once at process
//! start. Lookup is exact string equality — no wildcards, no partial
//! matches. Read-only after construction, so concurrent lookups need no
//! locking.

use crate::translator::gitea::{
    GiteaCreateTranslator, GiteaDeleteTranslator, GiteaPullRequestTranslator, GiteaPushTranslator,
};
use crate::translator::CdEventTranslator;
use std::collections::HashMap;
use std::sync::Arc;

/// Routing-key → translator table, frozen at startup.
pub struct TranslatorRegistry {
    translators: HashMap<String, Arc<dyn CdEventTranslator>>,
}

impl TranslatorRegistry {
    /// Build a registry from an explicit enumeration of entries.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<dyn CdEventTranslator>)>,
    {
        Self {
            translators: entries.into_iter().collect(),
        }
    }

    /// Registry with the built-in Gitea translators.
    pub fn with_default_translators() -> Self {
        Self::new([
            (
                "gitea.push".to_string(),
                Arc::new(GiteaPushTranslator) as Arc<dyn CdEventTranslator>,
            ),
            (
                "gitea.pull_request".to_string(),
                Arc::new(GiteaPullRequestTranslator) as Arc<dyn CdEventTranslator>,
            ),
            (
                "gitea.create".to_string(),
                Arc::new(GiteaCreateTranslator) as Arc<dyn CdEventTranslator>,
            ),
            (
                "gitea.delete".to_string(),
                Arc::new(GiteaDeleteTranslator) as Arc<dyn CdEventTranslator>,
            ),
        ])
    }

    /// Exact-match lookup of the translator for a routing key.
    pub fn lookup(&self, routing_key: &str) -> Option<&Arc<dyn CdEventTranslator>> {
        self.translators.get(routing_key)
    }

    /// Registered routing keys, for startup logging.
    pub fn routing_keys(&self) -> Vec<&str> {
        self.translators.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_four_entries() {
        let registry = TranslatorRegistry::with_default_translators();
        assert_eq!(registry.len(), 4);
        for key in [
            "gitea.push",
            "gitea.pull_request",
            "gitea.create",
            "gitea.delete",
        ] {
            assert!(registry.lookup(key).is_some(), "missing entry for {key}");
        }
    }

    #[test]
    fn test_lookup_is_exact_match_only() {
        let registry = TranslatorRegistry::with_default_translators();
        assert!(registry.lookup("gitea").is_none());
        assert!(registry.lookup("gitea.push.extra").is_none());
        assert!(registry.lookup("Gitea.push").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = TranslatorRegistry::new([]);
        assert!(registry.is_empty());
        assert!(registry.lookup("gitea.push").is_none());
    }
}
