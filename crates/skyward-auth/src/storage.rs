use skyward_core::CredentialError;

use crate::provider::CredentialProvider;

/// API key held in the system keyring.
///
/// The entry is addressed by a service/account pair, e.g. `skyward` /
/// `openweather`.
#[derive(Debug, Clone)]
pub struct KeyringCredentialProvider {
    service: String,
    user: String,
}

impl KeyringCredentialProvider {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, CredentialError> {
        keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| CredentialError::StorageError(e.to_string()))
    }

    /// Store (or replace) the API key
    pub fn store_key(&self, key: &str) -> Result<(), CredentialError> {
        if key.trim().is_empty() {
            return Err(CredentialError::Empty);
        }

        self.entry()?
            .set_password(key.trim())
            .map_err(|e| CredentialError::StorageError(e.to_string()))?;

        tracing::info!("Stored API key for {}/{}", self.service, self.user);
        Ok(())
    }

    /// Delete the API key; succeeds if none was stored
    pub fn delete_key(&self) -> Result<(), CredentialError> {
        match self.entry()?.delete_password() {
            Ok(()) => {
                tracing::info!("Deleted API key for {}/{}", self.service, self.user);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::StorageError(e.to_string())),
        }
    }

    /// Check if a key is stored
    pub fn has_key(&self) -> bool {
        self.api_key().is_ok()
    }
}

impl CredentialProvider for KeyringCredentialProvider {
    fn name(&self) -> &str {
        "keyring"
    }

    fn api_key(&self) -> Result<String, CredentialError> {
        match self.entry()?.get_password() {
            Ok(key) if key.trim().is_empty() => Err(CredentialError::Empty),
            Ok(key) => Ok(key.trim().to_string()),
            Err(keyring::Error::NoEntry) => Err(CredentialError::NotFound(format!(
                "{}/{}",
                self.service, self.user
            ))),
            Err(e) => Err(CredentialError::StorageError(e.to_string())),
        }
    }
}
