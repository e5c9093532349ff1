//! Forecast orchestrator.
//!
//! Resolves a place reference into a forecast plus reverse-geocoded address,
//! publishes the combined state on a `watch` channel, and keeps it fresh on a
//! timer while a consumer is watching.
//!
//! All mutable state sits behind one `parking_lot::Mutex` that is never held
//! across an `.await`. Background tasks hold a `Weak` reference and stop once
//! the orchestrator is disposed or dropped.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use skyward_auth::CredentialProvider;
use skyward_core::{Coordinate, CredentialError, PlaceReference};
use skyward_places::{PersistError, PlaceStore, SavedPlace};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::dto::{first_geocode, GeocodeDto, OneCallResponse};
use crate::endpoints::{Endpoints, RequestUrls};
use crate::error::{OrchestratorError, ResolveError};
use crate::http::{get_typed, HttpClient};
use crate::location::{LocationFix, LocationSource, LocationTracker};
use crate::state::RefreshState;
use crate::types::{ForecastSnapshot, GeocodeResult};

/// What a call to `resolve` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Both calls succeeded and the snapshot was replaced.
    Updated,
    /// A fetch was already in flight; nothing happened.
    Skipped,
    /// The orchestrator was disposed before the fetch completed.
    Disposed,
}

/// Everything observers can bind to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestratorState {
    pub refresh: RefreshState,
    pub snapshot: Option<ForecastSnapshot>,
    pub geocode: Option<GeocodeResult>,
    pub last_error: Option<OrchestratorError>,
    /// Reference used by the last accepted resolve; the timer re-resolves it.
    pub last_reference: Option<PlaceReference>,
}

struct Inner {
    state: OrchestratorState,
    tracker: LocationTracker,
}

impl Inner {
    fn fail(&mut self, error: ResolveError) {
        self.state.refresh = self.state.refresh.on_refresh_failed(error.clone());
        self.state.last_error = Some(error.into());
    }
}

struct Shared {
    http: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialProvider>,
    places: Arc<dyn PlaceStore>,
    endpoint: String,
    inner: Mutex<Inner>,
    tx: watch::Sender<OrchestratorState>,
    disposed: CancellationToken,
    timer: Mutex<Option<CancellationToken>>,
    location_task: Mutex<Option<CancellationToken>>,
}

/// Coordinates location, credentials, the two upstream calls and the place
/// store.
///
/// Dropping the orchestrator disposes it.
pub struct ForecastOrchestrator {
    shared: Arc<Shared>,
}

impl ForecastOrchestrator {
    pub fn new(
        http: Arc<dyn HttpClient>,
        credentials: Arc<dyn CredentialProvider>,
        places: Arc<dyn PlaceStore>,
        endpoint: impl Into<String>,
    ) -> Self {
        let (tx, _rx) = watch::channel(OrchestratorState::default());

        Self {
            shared: Arc::new(Shared {
                http,
                credentials,
                places,
                endpoint: endpoint.into(),
                inner: Mutex::new(Inner {
                    state: OrchestratorState::default(),
                    tracker: LocationTracker::new(),
                }),
                tx,
                disposed: CancellationToken::new(),
                timer: Mutex::new(None),
                location_task: Mutex::new(None),
            }),
        }
    }

    /// Fetch forecast and geocode for `reference`.
    ///
    /// Refused with `Skipped` while another fetch is in flight. On failure the
    /// previous snapshot and geocode are kept.
    pub async fn resolve(&self, reference: PlaceReference) -> Result<ResolveOutcome, ResolveError> {
        self.shared.resolve(reference).await
    }

    /// Current state snapshot.
    pub fn state(&self) -> OrchestratorState {
        self.shared.tx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.shared.tx.subscribe()
    }

    /// Clear the stored error; `Failed` becomes `Inactive`.
    pub fn dismiss_error(&self) {
        if self.shared.disposed.is_cancelled() {
            return;
        }
        let mut inner = self.shared.inner.lock();
        inner.state.last_error = None;
        inner.state.refresh = inner.state.refresh.on_dismiss();
        self.shared.publish(&inner);
    }

    /// Re-resolve the last reference every `period`, first tick after one full
    /// period. Replaces any running timer. Outside a Tokio runtime this only
    /// logs a warning.
    pub fn start_periodic_refresh(&self, period: Duration) {
        if self.shared.disposed.is_cancelled() {
            return;
        }
        if period.is_zero() {
            tracing::warn!("Ignoring zero refresh interval");
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No Tokio runtime, periodic refresh not started");
            return;
        };

        let token = self.shared.disposed.child_token();
        if let Some(previous) = self.shared.timer.lock().replace(token.clone()) {
            previous.cancel();
        }

        let weak = Arc::downgrade(&self.shared);
        runtime.spawn(run_timer(weak, token, period));
        tracing::info!("Periodic refresh started every {:?}", period);
    }

    /// Stop the timer. Safe to call when none is running.
    pub fn stop_periodic_refresh(&self) {
        if let Some(token) = self.shared.timer.lock().take() {
            token.cancel();
            tracing::info!("Periodic refresh stopped");
        }
    }

    /// Feed a device location update.
    ///
    /// Returns the resolve result when the update was the first usable fix
    /// (after construction or re-authorization), `None` otherwise.
    pub async fn on_location_changed(
        &self,
        coordinate: Option<Coordinate>,
        authorized: bool,
    ) -> Option<Result<ResolveOutcome, ResolveError>> {
        self.shared.location_changed(coordinate, authorized).await
    }

    /// Forward every fix from `source` to `on_location_changed`. Replaces a
    /// previously attached source. Outside a Tokio runtime this only logs a
    /// warning.
    pub fn attach_location_source(&self, source: &dyn LocationSource) {
        if self.shared.disposed.is_cancelled() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No Tokio runtime, location source not attached");
            return;
        };

        let token = self.shared.disposed.child_token();
        if let Some(previous) = self.shared.location_task.lock().replace(token.clone()) {
            previous.cancel();
        }

        let rx = source.subscribe();
        let weak = Arc::downgrade(&self.shared);
        runtime.spawn(run_location_listener(weak, token, rx));
    }

    /// Persist `place`. Failures are stored as the last error; the refresh
    /// state and forecast data are left alone.
    pub async fn save_place(&self, place: SavedPlace) -> Result<(), PersistError> {
        let store = self.shared.places.clone();
        let result = tokio::task::spawn_blocking(move || store.save(&place))
            .await
            .map_err(|e| PersistError::Save(e.to_string()))
            .and_then(|saved| saved);

        self.shared.record_persist_result(result)
    }

    pub async fn list_places(&self) -> Result<Vec<SavedPlace>, PersistError> {
        let store = self.shared.places.clone();
        let result = tokio::task::spawn_blocking(move || store.list())
            .await
            .map_err(|e| PersistError::List(e.to_string()))
            .and_then(|places| places);

        self.shared.record_persist_result(result)
    }

    pub async fn remove_place(&self, id: i64) -> Result<(), PersistError> {
        let store = self.shared.places.clone();
        let result = tokio::task::spawn_blocking(move || store.remove(id))
            .await
            .map_err(|e| PersistError::Remove(e.to_string()))
            .and_then(|removed| removed);

        self.shared.record_persist_result(result)
    }

    /// Cancel the timer, the location listener and any in-flight fetch.
    /// Terminal: no state changes after this.
    pub fn dispose(&self) {
        if self.shared.disposed.is_cancelled() {
            return;
        }
        self.shared.disposed.cancel();
        self.shared.timer.lock().take();
        self.shared.location_task.lock().take();
        tracing::info!("Forecast orchestrator disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.is_cancelled()
    }
}

impl Drop for ForecastOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(inner.state.clone());
    }

    #[tracing::instrument(skip_all, fields(place = %describe(&reference)))]
    async fn resolve(&self, reference: PlaceReference) -> Result<ResolveOutcome, ResolveError> {
        if self.disposed.is_cancelled() {
            return Ok(ResolveOutcome::Disposed);
        }

        {
            let inner = self.inner.lock();
            if !inner.state.refresh.can_start_refresh() {
                tracing::debug!("Fetch already in flight, skipping");
                return Ok(ResolveOutcome::Skipped);
            }
            if let Err(e) = locate(&inner, &reference) {
                tracing::debug!("No usable device location yet");
                return Err(e);
            }
        }

        // The keyring may block, so the lookup runs without the state lock.
        let api_key = self.api_key().await;
        if self.disposed.is_cancelled() {
            return Ok(ResolveOutcome::Disposed);
        }

        let (coordinate, urls) = {
            let mut inner = self.inner.lock();

            if !inner.state.refresh.can_start_refresh() {
                tracing::debug!("Fetch started during key lookup, skipping");
                return Ok(ResolveOutcome::Skipped);
            }

            match prepare(&inner, &reference, api_key, &self.endpoint) {
                Ok(prepared) => {
                    inner.state.last_reference = Some(reference);
                    inner.state.refresh = RefreshState::Loading;
                    self.publish(&inner);
                    prepared
                }
                Err(ResolveError::NoLocation) => {
                    tracing::debug!("Device location lost during key lookup");
                    return Err(ResolveError::NoLocation);
                }
                Err(e) => {
                    tracing::warn!("Fetch not started: {}", e);
                    inner.fail(e.clone());
                    self.publish(&inner);
                    return Err(e);
                }
            }
        };

        let http = self.http.as_ref();
        let fetch = async {
            tokio::join!(
                get_typed::<OneCallResponse>(http, &urls.forecast),
                get_typed::<Vec<GeocodeDto>>(http, &urls.geocode),
            )
        };

        let (forecast, geocode) = tokio::select! {
            biased;
            _ = self.disposed.cancelled() => {
                tracing::debug!("Disposed during fetch, abandoning results");
                return Ok(ResolveOutcome::Disposed);
            }
            results = fetch => results,
        };

        let mut inner = self.inner.lock();
        if self.disposed.is_cancelled() {
            return Ok(ResolveOutcome::Disposed);
        }

        match (forecast, geocode) {
            (Ok(forecast), Ok(geocode)) => {
                inner.state.snapshot = Some(forecast.into_snapshot(Utc::now()));
                inner.state.geocode = first_geocode(geocode, coordinate);
                inner.state.refresh = inner.state.refresh.on_refresh_done();
                inner.state.last_error = None;
                self.publish(&inner);

                match &inner.state.geocode {
                    Some(geocode) => tracing::info!("Forecast updated for {}", geocode.formatted_address),
                    None => tracing::info!("Forecast updated for {} (no geocode)", coordinate),
                }
                Ok(ResolveOutcome::Updated)
            }
            // The forecast result is inspected first, so it wins when both fail.
            (Err(e), _) | (Ok(_), Err(e)) => {
                let error = ResolveError::Transport(e);
                tracing::warn!("Fetch failed: {}", error);
                inner.fail(error.clone());
                self.publish(&inner);
                Err(error)
            }
        }
    }

    async fn api_key(&self) -> Result<String, CredentialError> {
        let credentials = self.credentials.clone();
        tokio::task::spawn_blocking(move || credentials.api_key())
            .await
            .map_err(|e| CredentialError::StorageError(e.to_string()))
            .and_then(|key| key)
    }

    async fn location_changed(
        &self,
        coordinate: Option<Coordinate>,
        authorized: bool,
    ) -> Option<Result<ResolveOutcome, ResolveError>> {
        if self.disposed.is_cancelled() {
            return None;
        }

        let first_fix = self.inner.lock().tracker.observe(coordinate, authorized);
        if !first_fix {
            return None;
        }

        tracing::info!("First usable device location, resolving");
        Some(self.resolve(PlaceReference::CurrentLocation).await)
    }

    async fn tick(&self) {
        let reference = self.inner.lock().state.last_reference.clone();
        let Some(reference) = reference else {
            tracing::debug!("Refresh tick with nothing resolved yet");
            return;
        };

        match self.resolve(reference).await {
            Ok(outcome) => tracing::debug!("Refresh tick: {:?}", outcome),
            Err(e) => tracing::warn!("Refresh tick failed: {}", e),
        }
    }

    fn record_persist_result<T>(&self, result: Result<T, PersistError>) -> Result<T, PersistError> {
        if let Err(e) = &result {
            tracing::warn!("{}", e);
            if !self.disposed.is_cancelled() {
                let mut inner = self.inner.lock();
                inner.state.last_error = Some(e.clone().into());
                self.publish(&inner);
            }
        }
        result
    }
}

async fn run_timer(shared: Weak<Shared>, token: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(shared) = shared.upgrade() else { break };
        shared.tick().await;
    }
}

async fn run_location_listener(
    shared: Weak<Shared>,
    token: CancellationToken,
    mut rx: watch::Receiver<LocationFix>,
) {
    loop {
        let fix = *rx.borrow_and_update();
        {
            let Some(shared) = shared.upgrade() else { break };
            if let Some(Err(e)) = shared.location_changed(fix.coordinate, fix.authorized).await {
                tracing::warn!("Location-triggered resolve failed: {}", e);
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    tracing::debug!("Location source closed");
                    break;
                }
            }
        }
    }
}

fn locate(inner: &Inner, reference: &PlaceReference) -> Result<Coordinate, ResolveError> {
    match reference {
        PlaceReference::CurrentLocation => inner
            .tracker
            .usable_coordinate()
            .ok_or(ResolveError::NoLocation),
        PlaceReference::NamedPlace { coordinate, .. } => Ok(*coordinate),
    }
}

/// Coordinate, then API key, then URLs. Nothing is mutated here.
fn prepare(
    inner: &Inner,
    reference: &PlaceReference,
    api_key: Result<String, CredentialError>,
    endpoint: &str,
) -> Result<(Coordinate, RequestUrls), ResolveError> {
    let coordinate = locate(inner, reference)?;
    let api_key = api_key?;

    let coordinate = coordinate
        .validated()
        .map_err(|e| ResolveError::BadRequest(e.to_string()))?;
    let urls = Endpoints::parse(endpoint)
        .and_then(|endpoints| endpoints.build(coordinate, &api_key))
        .map_err(ResolveError::BadRequest)?;

    Ok((coordinate, urls))
}

fn describe(reference: &PlaceReference) -> String {
    match reference {
        PlaceReference::CurrentLocation => "current location".to_string(),
        PlaceReference::NamedPlace {
            formatted_address, ..
        } => formatted_address.clone(),
    }
}
