//! Weather service for Skyward
//!
//! Resolves the device location or a chosen place into an OpenWeather
//! forecast plus reverse-geocoded address, and keeps it fresh.

pub mod dto;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod location;
pub mod orchestrator;
pub mod retry;
pub mod state;
pub mod types;

pub use endpoints::{Endpoints, RequestUrls};
pub use error::{OrchestratorError, ResolveError};
pub use http::{get_typed, HttpClient, ReqwestHttpClient};
pub use location::{ChannelLocationSource, LocationFix, LocationSource, LocationTracker};
pub use orchestrator::{ForecastOrchestrator, OrchestratorState, ResolveOutcome};
pub use retry::{RetryConfig, RetryingHttpClient};
pub use state::RefreshState;
pub use types::*;
