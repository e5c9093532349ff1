use skyward_core::{AppError, CredentialError, TransportError};
use skyward_places::PersistError;
use thiserror::Error;

/// Why a resolve did not produce fresh data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No device location available")]
    NoLocation,

    #[error("API key unavailable: {0}")]
    MissingCredential(#[from] CredentialError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ResolveError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ResolveError::NoLocation => "Waiting for your location. Check location permissions.",
            ResolveError::MissingCredential(e) => e.user_message(),
            ResolveError::BadRequest(_) => {
                "The weather request could not be built. Check your settings."
            }
            ResolveError::Transport(e) => e.user_message(),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoLocation => AppError::NoLocation,
            ResolveError::MissingCredential(e) => AppError::Credential(e),
            ResolveError::BadRequest(msg) => AppError::BadRequest(msg),
            ResolveError::Transport(e) => AppError::Transport(e),
        }
    }
}

/// The last error recorded by the orchestrator, shown until dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl OrchestratorError {
    pub fn user_message(&self) -> &'static str {
        match self {
            OrchestratorError::Resolve(e) => e.user_message(),
            OrchestratorError::Persist(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_into_app_error() {
        let app: AppError = ResolveError::Transport(TransportError::Unreachable("dns".into())).into();
        assert!(matches!(app, AppError::Transport(TransportError::Unreachable(_))));

        let app: AppError = ResolveError::MissingCredential(CredentialError::Empty).into();
        assert!(matches!(app, AppError::Credential(CredentialError::Empty)));

        let app: AppError = ResolveError::NoLocation.into();
        assert_eq!(app.user_message(), ResolveError::NoLocation.user_message());
    }

    #[test]
    fn test_orchestrator_error_messages() {
        let err: OrchestratorError = PersistError::Save("disk full".into()).into();
        assert_eq!(err.user_message(), "Could not save this place. Please try again.");
        assert!(err.to_string().contains("disk full"));
    }
}
