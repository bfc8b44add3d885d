//! Sites and their configured languages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::connection_config::ConnectionConfig;
use crate::types::{LanguageId, DEFAULT_LANGUAGE};

/// How a language behaves when a record has no translation into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackType {
    /// Untranslated records are not shown.
    Strict,
    /// Untranslated records are substituted along the fallback chain.
    #[default]
    Fallback,
    /// Free-standing language with no relationship to the default language.
    Free,
}

/// One language configured on a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLanguage {
    pub id: LanguageId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fallback_type: FallbackType,
    /// Ordered languages to substitute when no direct translation exists.
    #[serde(default)]
    pub fallback_chain: Vec<LanguageId>,
    #[serde(default)]
    pub connection: Option<ConnectionConfig>,
}

impl SiteLanguage {
    pub fn new(id: LanguageId) -> Self {
        Self {
            id,
            title: String::new(),
            fallback_type: FallbackType::default(),
            fallback_chain: Vec::new(),
            connection: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_fallback_type(mut self, fallback_type: FallbackType) -> Self {
        self.fallback_type = fallback_type;
        self
    }

    pub fn with_fallback_chain(mut self, chain: Vec<LanguageId>) -> Self {
        self.fallback_chain = chain;
        self
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = Some(connection.with_language(self.id));
        self
    }

    /// Whether the language is free-standing ("independent").
    pub fn is_independent(&self) -> bool {
        self.fallback_type == FallbackType::Free
    }

    /// Whether this language has a connection configuration that validates.
    pub fn has_valid_connection(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.validate().is_ok())
    }
}

/// A content root plus its configured languages and connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub root_id: u64,
    pub identifier: String,
    pub site_hash: String,
    pub default_language: LanguageId,
    /// Root record asks to hide the default translation.
    pub hide_default_translation: bool,
    languages: BTreeMap<LanguageId, SiteLanguage>,
}

impl Site {
    /// Create a site from its root id, identifier and languages.
    pub fn new(root_id: u64, identifier: impl Into<String>, languages: Vec<SiteLanguage>) -> Self {
        let identifier = identifier.into();
        Self {
            root_id,
            site_hash: site_hash(root_id, &identifier),
            identifier,
            default_language: DEFAULT_LANGUAGE,
            hide_default_translation: false,
            languages: languages.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    pub fn with_hide_default_translation(mut self, hide: bool) -> Self {
        self.hide_default_translation = hide;
        self
    }

    /// All configured language ids, ascending.
    pub fn available_language_ids(&self) -> Vec<LanguageId> {
        self.languages.keys().copied().collect()
    }

    /// Language ids that have a resolvable connection configuration, ascending.
    pub fn enabled_language_ids(&self) -> Vec<LanguageId> {
        self.languages
            .values()
            .filter(|l| l.has_valid_connection())
            .map(|l| l.id)
            .collect()
    }

    /// A site is enabled iff at least one language can be connected.
    pub fn is_enabled(&self) -> bool {
        self.languages.values().any(SiteLanguage::has_valid_connection)
    }

    pub fn language(&self, id: LanguageId) -> Option<&SiteLanguage> {
        self.languages.get(&id)
    }

    pub fn has_language(&self, id: LanguageId) -> bool {
        self.languages.contains_key(&id)
    }

    pub fn languages(&self) -> impl Iterator<Item = &SiteLanguage> {
        self.languages.values()
    }

    /// Connection configuration for a language, if one is declared.
    pub fn connection_config(&self, id: LanguageId) -> Option<&ConnectionConfig> {
        self.languages.get(&id).and_then(|l| l.connection.as_ref())
    }

    /// Fallback chain of a language; empty when the language is unknown.
    pub fn fallback_chain(&self, id: LanguageId) -> &[LanguageId] {
        self.languages
            .get(&id)
            .map(|l| l.fallback_chain.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_independent(&self, id: LanguageId) -> bool {
        self.languages.get(&id).is_some_and(SiteLanguage::is_independent)
    }
}

/// Stable hash identifying a site in the index.
pub fn site_hash(root_id: u64, identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root_id.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(identifier.as_bytes());
    hex::encode(hasher.finalize())
}
