//! API key providers.
//!
//! The orchestrator asks a `CredentialProvider` for the key right before it
//! builds upstream URLs; a failure aborts the fetch before any network call.

use skyward_core::CredentialError;

/// Supplies the API key required by upstream calls.
pub trait CredentialProvider: Send + Sync {
    /// Short label used in logs (never the key itself)
    fn name(&self) -> &str;

    /// Return the API key, or why it is unavailable.
    fn api_key(&self) -> Result<String, CredentialError>;
}

/// Fixed key, for tests and embedding.
#[derive(Clone)]
pub struct StaticCredentialProvider {
    key: Option<String>,
}

impl StaticCredentialProvider {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    /// A provider that never has a key.
    pub fn missing() -> Self {
        Self { key: None }
    }
}

impl std::fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialProvider")
            .field("has_key", &self.key.is_some())
            .finish()
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn api_key(&self) -> Result<String, CredentialError> {
        match &self.key {
            Some(key) => non_empty(key.clone()),
            None => Err(CredentialError::NotFound("static".to_string())),
        }
    }
}

/// Reads the key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn name(&self) -> &str {
        &self.var
    }

    fn api_key(&self) -> Result<String, CredentialError> {
        match std::env::var(&self.var) {
            Ok(value) => non_empty(value),
            Err(std::env::VarError::NotPresent) => Err(CredentialError::NotFound(self.var.clone())),
            Err(std::env::VarError::NotUnicode(_)) => Err(CredentialError::StorageError(format!(
                "{} is not valid unicode",
                self.var
            ))),
        }
    }
}

/// Tries each provider in order and returns the first key found.
///
/// Storage errors are logged and skipped; if every provider fails, the last
/// error is returned.
pub struct ChainedCredentialProvider {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainedCredentialProvider {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }
}

impl CredentialProvider for ChainedCredentialProvider {
    fn name(&self) -> &str {
        "chain"
    }

    fn api_key(&self) -> Result<String, CredentialError> {
        let mut last_error = CredentialError::NotFound("no providers configured".to_string());

        for provider in &self.providers {
            match provider.api_key() {
                Ok(key) => {
                    tracing::debug!("API key supplied by {}", provider.name());
                    return Ok(key);
                }
                Err(e) => {
                    tracing::debug!("No API key from {}: {}", provider.name(), e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

fn non_empty(key: String) -> Result<String, CredentialError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        Err(CredentialError::Empty)
    } else {
        Ok(trimmed.to_string())
    }
}
