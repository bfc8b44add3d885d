//! Connection configuration for one search-engine core.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::ModelError;
use crate::types::{LanguageId, DEFAULT_LANGUAGE};

fn default_scheme() -> String {
    "http".to_string()
}

fn default_port() -> u16 {
    9200
}

fn default_path() -> String {
    "/".to_string()
}

/// Credentials presented to the search engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credentials {
    /// HTTP basic authentication.
    Basic { username: String, password: String },
    /// API key authentication.
    ApiKey { id: String, key: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::ApiKey { id, .. } => f
                .debug_struct("ApiKey")
                .field("id", id)
                .field("key", &"***")
                .finish(),
        }
    }
}

/// Configuration of a connection to one search-engine core (index).
///
/// Two configurations denote the same connection iff their
/// [`identity_hash`](Self::identity_hash) values are equal. The hash is taken
/// over the normalized endpoint, core and credentials, so cosmetic differences
/// like host case or a missing trailing slash do not produce separate handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    /// Core (index) name.
    pub core: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Language this configuration was declared for.
    #[serde(default)]
    pub language: LanguageId,
    /// Request timeout enforced by the HTTP transport.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    /// Create a configuration with default scheme and path.
    pub fn new(host: impl Into<String>, port: u16, core: impl Into<String>) -> Self {
        Self {
            scheme: default_scheme(),
            host: host.into(),
            port,
            path: default_path(),
            core: core.into(),
            credentials: None,
            language: DEFAULT_LANGUAGE,
            timeout_secs: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_language(mut self, language: LanguageId) -> Self {
        self.language = language;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Return the normalized form of this configuration.
    ///
    /// Scheme and host are lowercased and trimmed, the core is trimmed and the
    /// path gets exactly one leading and one trailing slash.
    pub fn normalized(&self) -> Self {
        let trimmed_path = self.path.trim().trim_matches('/');
        let path = if trimmed_path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", trimmed_path)
        };

        Self {
            scheme: self.scheme.trim().to_lowercase(),
            host: self.host.trim().to_lowercase(),
            port: self.port,
            path,
            core: self.core.trim().to_string(),
            credentials: self.credentials.clone(),
            language: self.language,
            timeout_secs: self.timeout_secs,
        }
    }

    /// Validate the configuration without touching the network.
    pub fn validate(&self) -> Result<(), ModelError> {
        let normalized = self.normalized();

        if normalized.host.is_empty() {
            return Err(ModelError::invalid_connection_config("host is required"));
        }
        if normalized.host.contains('/') || normalized.host.contains(' ') {
            return Err(ModelError::invalid_connection_config(format!(
                "host '{}' must be a bare host name",
                normalized.host
            )));
        }
        if normalized.scheme != "http" && normalized.scheme != "https" {
            return Err(ModelError::invalid_connection_config(format!(
                "unsupported scheme '{}'",
                normalized.scheme
            )));
        }
        if normalized.port == 0 {
            return Err(ModelError::invalid_connection_config("port must not be 0"));
        }
        if normalized.core.is_empty() {
            return Err(ModelError::invalid_connection_config("core is required"));
        }
        if normalized.core.contains('/') {
            return Err(ModelError::invalid_connection_config(format!(
                "core '{}' must not contain '/'",
                normalized.core
            )));
        }
        if let Some(Credentials::Basic { username, .. }) = &normalized.credentials {
            if username.is_empty() {
                return Err(ModelError::invalid_connection_config(
                    "basic credentials require a username",
                ));
            }
        }

        Ok(())
    }

    /// Base URL of the engine endpoint, e.g. `http://localhost:9200/`.
    pub fn base_url(&self) -> String {
        let n = self.normalized();
        format!("{}://{}:{}{}", n.scheme, n.host, n.port, n.path)
    }

    /// Deterministic identity of the connection this configuration denotes.
    pub fn identity_hash(&self) -> String {
        let n = self.normalized();
        let credentials = match &n.credentials {
            None => String::new(),
            Some(Credentials::Basic { username, password }) => {
                format!("basic:{}:{}", username, password)
            }
            Some(Credentials::ApiKey { id, key }) => format!("apikey:{}:{}", id, key),
        };

        let mut hasher = Sha256::new();
        for part in [
            n.scheme.as_str(),
            n.host.as_str(),
            &n.port.to_string(),
            n.path.as_str(),
            n.core.as_str(),
            credentials.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_is_hash_stable() {
        let a = ConnectionConfig::new("Search.Local ", 9200, "core_en").with_path("solr");
        let b = ConnectionConfig::new("search.local", 9200, " core_en").with_path("/solr/");

        assert_eq!(a.identity_hash(), b.identity_hash());
        assert_eq!(a.base_url(), "http://search.local:9200/solr/");
    }

    #[test]
    fn test_hash_differs_by_core_and_credentials() {
        let base = ConnectionConfig::new("localhost", 9200, "core_en");
        let other_core = ConnectionConfig::new("localhost", 9200, "core_de");
        let with_auth = base.clone().with_credentials(Credentials::Basic {
            username: "admin".to_string(),
            password: "secret".to_string(),
        });

        assert_ne!(base.identity_hash(), other_core.identity_hash());
        assert_ne!(base.identity_hash(), with_auth.identity_hash());
    }

    #[test]
    fn test_hash_ignores_language() {
        let en = ConnectionConfig::new("localhost", 9200, "shared").with_language(0);
        let de = ConnectionConfig::new("localhost", 9200, "shared").with_language(1);
        assert_eq!(en.identity_hash(), de.identity_hash());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert!(ConnectionConfig::new("localhost", 9200, "core").validate().is_ok());
        assert!(ConnectionConfig::new("", 9200, "core").validate().is_err());
        assert!(ConnectionConfig::new("localhost", 0, "core").validate().is_err());
        assert!(ConnectionConfig::new("localhost", 9200, " ").validate().is_err());
        assert!(ConnectionConfig::new("localhost", 9200, "core")
            .with_scheme("ftp")
            .validate()
            .is_err());
        assert!(matches!(
            ConnectionConfig::new("http://localhost", 9200, "core").validate(),
            Err(ModelError::InvalidConnectionConfig(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ConnectionConfig::new("localhost", 9200, "core").with_credentials(
            Credentials::ApiKey {
                id: "key-id".to_string(),
                key: "top-secret".to_string(),
            },
        );
        let printed = format!("{:?}", config);
        assert!(printed.contains("key-id"));
        assert!(!printed.contains("top-secret"));
    }
}
