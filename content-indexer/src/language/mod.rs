//! Language fallback resolution.
//!
//! Decides, for one item, which languages get a document and which search
//! core each of those documents goes to.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use content_indexer_repository::{ConnectionRegistry, CoreConnection};
use content_indexer_shared::{Item, LanguageId, Site};
use tracing::{debug, instrument, warn};

use crate::errors::IndexerError;
use crate::interfaces::ContentRepository;

/// Which language a document is built for and whose content it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePlan {
    /// Language the document is built for.
    pub target: LanguageId,
    /// Language whose record overlay supplies the content.
    pub content: LanguageId,
}

impl LanguagePlan {
    /// Plan for a language that has its own translation.
    pub fn direct(language: LanguageId) -> Self {
        Self {
            target: language,
            content: language,
        }
    }

    /// Plan for a language substituted by a fallback language.
    pub fn fallback(target: LanguageId, content: LanguageId) -> Self {
        Self { target, content }
    }

    pub fn is_fallback(&self) -> bool {
        self.target != self.content
    }
}

/// A resolved connection together with the plan it serves.
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    pub plan: LanguagePlan,
    pub connection: Arc<CoreConnection>,
}

/// Outcome of looking up the connection of one language.
#[derive(Debug, Clone)]
pub enum ConnectionLookup {
    Found(Arc<CoreConnection>),
    /// The language has no connection configuration; it does not apply.
    Skipped,
}

/// Default language of a site after applying the "hide default translation" flag.
///
/// With the flag set, the only other language becomes the default; with
/// several others the lowest non-zero one does.
///
/// # Returns
///
/// * `Ok(LanguageId)` - The effective default language
/// * `Err(IndexerError::NoUsableLanguage)` - The default is hidden and no
///   other language is configured
pub fn resolve_default_language(site: &Site) -> Result<LanguageId, IndexerError> {
    if !site.hide_default_translation {
        return Ok(site.default_language);
    }

    let others: Vec<LanguageId> = site
        .available_language_ids()
        .into_iter()
        .filter(|id| *id != site.default_language)
        .collect();

    match others.as_slice() {
        [] => Err(IndexerError::NoUsableLanguage {
            root_id: site.root_id,
        }),
        [only] => Ok(*only),
        _ => others
            .iter()
            .copied()
            .filter(|id| *id != 0)
            .min()
            .ok_or(IndexerError::NoUsableLanguage {
                root_id: site.root_id,
            }),
    }
}

/// Languages that receive a document, keyed by target language.
///
/// `translated` lists the languages the item's page has translations for;
/// languages the site does not configure are ignored. Languages without a
/// translation walk their fallback chain and take the first candidate that is
/// the site default or translated. Independent languages never fall back.
pub fn plan_languages(
    site: &Site,
    translated: &[LanguageId],
) -> Result<BTreeMap<LanguageId, LanguagePlan>, IndexerError> {
    let default_language = resolve_default_language(site)?;
    let translated: BTreeSet<LanguageId> = translated
        .iter()
        .copied()
        .filter(|id| site.has_language(*id) && *id != site.default_language)
        .collect();

    let mut plans = BTreeMap::new();
    if default_language == site.default_language {
        plans.insert(default_language, LanguagePlan::direct(default_language));
    }
    for &language in &translated {
        plans.insert(language, LanguagePlan::direct(language));
    }

    for language in site.languages() {
        let id = language.id;
        if id == site.default_language || id == default_language || translated.contains(&id) {
            continue;
        }
        if language.is_independent() {
            debug!(language = id, "Independent language without translation");
            continue;
        }

        let candidate = language
            .fallback_chain
            .iter()
            .copied()
            .find(|candidate| *candidate == site.default_language || translated.contains(candidate));
        match candidate {
            Some(fallback) => {
                plans.insert(id, LanguagePlan::fallback(id, fallback));
            }
            None => {
                debug!(language = id, "No translation and no usable fallback");
            }
        }
    }

    Ok(plans)
}

/// Resolves the connections applicable to an item.
pub struct LanguageFallbackResolver {
    repository: Arc<dyn ContentRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl LanguageFallbackResolver {
    pub fn new(repository: Arc<dyn ContentRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// Connection of one language of a site.
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionLookup::Found)` - The language's connection
    /// * `Ok(ConnectionLookup::Skipped)` - The language declares no connection
    /// * `Err(IndexerError::InvalidConnectionConfig)` - The declared
    ///   configuration is malformed
    pub fn lookup(&self, site: &Site, language: LanguageId) -> Result<ConnectionLookup, IndexerError> {
        match site.connection_config(language) {
            Some(config) => Ok(ConnectionLookup::Found(self.registry.get(config)?)),
            None => Ok(ConnectionLookup::Skipped),
        }
    }

    /// Map from target language to the connection its document goes to.
    ///
    /// The effective default language must have a connection; a missing one
    /// is fatal for the item. Every other language whose connection is
    /// missing or malformed is left out.
    #[instrument(skip(self, site, item), fields(root_id = site.root_id, item_type = %item.item_type, record_uid = item.record_uid))]
    pub async fn connections_for_item(
        &self,
        site: &Site,
        item: &Item,
    ) -> Result<BTreeMap<LanguageId, ResolvedConnection>, IndexerError> {
        let default_language = resolve_default_language(site)?;
        let default_connection = match self.lookup(site, default_language)? {
            ConnectionLookup::Found(connection) => connection,
            ConnectionLookup::Skipped => {
                return Err(IndexerError::NoConnectionFound {
                    root_id: site.root_id,
                    language: default_language,
                })
            }
        };

        let translated = self
            .repository
            .page_translation_languages(item.translation_page_id())
            .await?;
        let plans = plan_languages(site, &translated)?;

        let mut connections = BTreeMap::new();
        for (language, plan) in plans {
            let connection = if plan.content == default_language {
                ConnectionLookup::Found(Arc::clone(&default_connection))
            } else {
                match self.lookup(site, plan.content) {
                    Ok(lookup) => lookup,
                    Err(e) => {
                        warn!(language, error = %e, "Ignoring language with invalid connection");
                        ConnectionLookup::Skipped
                    }
                }
            };

            match connection {
                ConnectionLookup::Found(connection) => {
                    connections.insert(language, ResolvedConnection { plan, connection });
                }
                ConnectionLookup::Skipped => {
                    debug!(language, "No connection configured for language, skipping");
                }
            }
        }

        debug!(languages = ?connections.keys().collect::<Vec<_>>(), "Resolved connections");
        Ok(connections)
    }
}
