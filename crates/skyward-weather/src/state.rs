//! Refresh state machine.
//!
//! Ensures only one fetch runs at a time. Used by `ForecastOrchestrator`.

use crate::error::ResolveError;

/// `Inactive -> Loading -> {Inactive, Failed}`, `Failed -> Loading` on the
/// next accepted resolve, `Failed -> Inactive` on dismiss.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RefreshState {
    #[default]
    Inactive,
    Loading,
    /// Inactive, carrying the failure of the last fetch
    Failed(ResolveError),
}

impl RefreshState {
    /// True if a new fetch can be started.
    pub fn can_start_refresh(&self) -> bool {
        !matches!(self, RefreshState::Loading)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RefreshState::Loading)
    }

    pub fn error(&self) -> Option<&ResolveError> {
        match self {
            RefreshState::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// State after both upstream calls succeeded.
    pub fn on_refresh_done(&self) -> Self {
        RefreshState::Inactive
    }

    /// State after a fetch (or its preparation) failed.
    pub fn on_refresh_failed(&self, error: ResolveError) -> Self {
        RefreshState::Failed(error)
    }

    /// State after the user dismissed the error.
    pub fn on_dismiss(&self) -> Self {
        match self {
            RefreshState::Failed(_) => RefreshState::Inactive,
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_and_failed_allow_refresh() {
        assert!(RefreshState::Inactive.can_start_refresh());
        assert!(RefreshState::Failed(ResolveError::NoLocation).can_start_refresh());
    }

    #[test]
    fn loading_blocks_refresh() {
        assert!(!RefreshState::Loading.can_start_refresh());
    }

    #[test]
    fn refresh_done_transitions_to_inactive() {
        assert_eq!(RefreshState::Loading.on_refresh_done(), RefreshState::Inactive);
    }

    #[test]
    fn refresh_failed_carries_error() {
        let state = RefreshState::Loading.on_refresh_failed(ResolveError::BadRequest("x".into()));
        assert_eq!(state.error(), Some(&ResolveError::BadRequest("x".into())));
    }

    #[test]
    fn dismiss_clears_only_failure() {
        assert_eq!(
            RefreshState::Failed(ResolveError::NoLocation).on_dismiss(),
            RefreshState::Inactive
        );
        assert_eq!(RefreshState::Loading.on_dismiss(), RefreshState::Loading);
    }
}
