//! API key sources for Skyward.

pub mod provider;
pub mod storage;

pub use provider::{
    ChainedCredentialProvider, CredentialProvider, EnvCredentialProvider,
    StaticCredentialProvider,
};
pub use storage::KeyringCredentialProvider;

use skyward_core::CredentialsConfig;

/// Build the default lookup chain: environment variable first, then keyring.
pub fn from_config(config: &CredentialsConfig) -> ChainedCredentialProvider {
    ChainedCredentialProvider::new(vec![
        Box::new(EnvCredentialProvider::new(config.env_var.clone())),
        Box::new(KeyringCredentialProvider::new(
            config.keyring_service.clone(),
            config.keyring_user.clone(),
        )),
    ])
}
