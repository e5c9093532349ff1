use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use skyward_auth::KeyringCredentialProvider;
use skyward_core::{AppError, Config, Coordinate, PlaceReference, TemperatureUnit};
use skyward_places::{SavedPlace, SqlitePlaceStore};
use skyward_weather::{
    ForecastOrchestrator, ForecastSnapshot, GeocodeResult, HttpClient, OrchestratorState,
    RefreshState, ReqwestHttpClient, RetryConfig, RetryingHttpClient,
};

use crate::cli::{Command, ShowArgs};

/// Wires configuration and real adapters around the orchestrator
pub struct App {
    config: Config,
    keyring: KeyringCredentialProvider,
    orchestrator: ForecastOrchestrator,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let credentials = Arc::new(skyward_auth::from_config(&config.credentials));
        let keyring = KeyringCredentialProvider::new(
            config.credentials.keyring_service.clone(),
            config.credentials.keyring_user.clone(),
        );

        let client = ReqwestHttpClient::new(Duration::from_secs(config.weather.request_timeout_secs))
            .context("Failed to create HTTP client")?;
        let http: Arc<dyn HttpClient> = if config.weather.max_retries > 0 {
            let retry = RetryConfig {
                max_retries: config.weather.max_retries,
                ..RetryConfig::default()
            };
            Arc::new(RetryingHttpClient::new(Arc::new(client), retry))
        } else {
            Arc::new(client)
        };

        let store = SqlitePlaceStore::open(&config.places_database_path())
            .map_err(AppError::from)
            .context("Failed to open saved places")?;

        let orchestrator = ForecastOrchestrator::new(
            http,
            credentials,
            Arc::new(store),
            config.weather.endpoint.clone(),
        );

        tracing::info!("Skyward initialized");
        Ok(Self {
            config,
            keyring,
            orchestrator,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Show(args) => self.show(args).await,
            Command::Places => self.list_places().await,
            Command::Forget { id } => {
                self.orchestrator.remove_place(id).await.map_err(AppError::from)?;
                println!("Removed place {}", id);
                Ok(())
            }
            Command::SetKey { key } => {
                self.keyring.store_key(&key).map_err(AppError::from)?;
                println!("API key stored in the system keyring");
                Ok(())
            }
            Command::DeleteKey => {
                self.keyring.delete_key().map_err(AppError::from)?;
                println!("API key removed from the system keyring");
                Ok(())
            }
        }
    }

    /// Cancel background work before exit
    pub fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.orchestrator.dispose();
    }

    async fn show(&self, args: ShowArgs) -> Result<()> {
        let reference = self.pick_place(&args).await?;
        self.orchestrator.resolve(reference).await.map_err(AppError::from)?;

        let state = self.orchestrator.state();
        self.print_state(&state);

        if args.save {
            self.save_current(&state, args.name.as_deref()).await?;
        }

        if args.watch {
            self.watch().await?;
        }
        Ok(())
    }

    async fn pick_place(&self, args: &ShowArgs) -> Result<PlaceReference> {
        if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
            let coordinate = Coordinate::new(lat, lon);
            let name = args.name.clone().unwrap_or_else(|| coordinate.to_string());
            return Ok(PlaceReference::named(format!("{},{}", lat, lon), coordinate, name));
        }

        let saved = self.orchestrator.list_places().await.map_err(AppError::from)?;

        if let Some(id) = args.saved {
            return saved
                .iter()
                .find(|place| place.id == id)
                .map(SavedPlace::to_reference)
                .with_context(|| format!("No saved place with id {}", id));
        }

        if let Some(default) = &self.config.default_place {
            return Ok(default.to_reference());
        }

        saved
            .first()
            .map(SavedPlace::to_reference)
            .ok_or_else(|| AppError::NoLocation.into())
    }

    async fn save_current(&self, state: &OrchestratorState, name: Option<&str>) -> Result<()> {
        let Some(PlaceReference::NamedPlace {
            place_id,
            coordinate,
            formatted_address,
        }) = &state.last_reference
        else {
            return Ok(());
        };

        let existing = self.orchestrator.list_places().await.map_err(AppError::from)?;
        let previous = saved_place_for(place_id, &existing);
        let id = previous.map_or_else(|| next_place_id(&existing), |p| p.id);

        let geocode = state.geocode.as_ref();
        let name = name
            .map(str::to_string)
            .or_else(|| previous.map(|p| p.name.clone()))
            .or_else(|| geocode.map(|g| g.formatted_address.clone()))
            .unwrap_or_else(|| formatted_address.clone());

        let mut place = SavedPlace::from_named_place(id, name, *coordinate);
        if let Some(country) = geocode.and_then(|g| g.country.clone()) {
            place.country = country;
        }
        if let Some(snapshot) = &state.snapshot {
            place.timezone = snapshot.timezone_offset_secs;
            place.sunrise = snapshot.current.sunrise;
            place.sunset = snapshot.current.sunset;
        }

        self.orchestrator.save_place(place.clone()).await.map_err(AppError::from)?;
        println!("Saved as #{} ({})", place.id, place.display_name());
        Ok(())
    }

    async fn list_places(&self) -> Result<()> {
        let places = self.orchestrator.list_places().await.map_err(AppError::from)?;
        if places.is_empty() {
            println!("No saved places");
        }
        for place in places {
            println!("{:>4}  {}  ({})", place.id, place.display_name(), place.coordinate);
        }
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        let Some(interval) = self.config.weather.refresh_interval() else {
            println!("Refreshing is disabled (weather.refresh_minutes = 0)");
            return Ok(());
        };

        let mut rx = self.orchestrator.subscribe();
        rx.borrow_and_update();
        self.orchestrator.start_periodic_refresh(interval);
        println!("Refreshing every {} minutes, Ctrl-C to stop", interval.as_secs() / 60);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = rx.borrow_and_update().clone();
                    match &state.refresh {
                        RefreshState::Loading => {}
                        RefreshState::Failed(e) => eprintln!("Refresh failed: {}", e.user_message()),
                        RefreshState::Inactive => self.print_state(&state),
                    }
                }
            }
        }

        self.orchestrator.stop_periodic_refresh();
        Ok(())
    }

    fn print_state(&self, state: &OrchestratorState) {
        let unit = self.config.weather.temperature_unit;

        let title = match (&state.geocode, &state.last_reference) {
            (Some(geocode), _) => geocode.display_name(),
            (None, Some(PlaceReference::NamedPlace { formatted_address, .. })) => {
                formatted_address.clone()
            }
            _ => "Current location".to_string(),
        };

        println!("{}", title);
        if let Some(snapshot) = &state.snapshot {
            for line in summary_lines(snapshot, state.geocode.as_ref(), unit) {
                println!("  {}", line);
            }
        }
    }
}

/// The stored place a reference was built from, so re-saving overwrites it.
fn saved_place_for<'a>(place_id: &str, existing: &'a [SavedPlace]) -> Option<&'a SavedPlace> {
    let id: i64 = place_id.parse().ok()?;
    existing.iter().find(|p| p.id == id)
}

fn next_place_id(existing: &[SavedPlace]) -> i64 {
    existing.iter().map(|p| p.id).max().unwrap_or(0) + 1
}

fn summary_lines(
    snapshot: &ForecastSnapshot,
    geocode: Option<&GeocodeResult>,
    unit: TemperatureUnit,
) -> Vec<String> {
    let current = &snapshot.current;
    let mut lines = Vec::new();

    let description = snapshot
        .headline()
        .map(|h| h.description)
        .unwrap_or_default();
    lines.push(format!(
        "Now: {} {} (feels like {})",
        unit.format_degrees(current.temp),
        description,
        unit.format_degrees(current.feels_like)
    ));

    if let Some(high_low) = snapshot.today_high_low(unit) {
        lines.push(format!("Today: {}", high_low));
    }

    if !snapshot.hourly.is_empty() {
        let next: Vec<String> = snapshot
            .hourly
            .iter()
            .take(6)
            .map(|h| unit.format_degrees(h.temp))
            .collect();
        lines.push(format!("Next hours: {}", next.join(" ")));
    }

    if let Some(geocode) = geocode {
        lines.push(format!("Location: {}", geocode.coordinate));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyward_weather::{ConditionSummary, CurrentConditions};

    #[test]
    fn test_resaving_reuses_saved_id() {
        let places = vec![
            SavedPlace::from_named_place(4, "Cairns", Coordinate::new(-16.92, 145.77)),
            SavedPlace::from_named_place(2, "Darwin", Coordinate::new(-12.46, 130.84)),
        ];

        let PlaceReference::NamedPlace { place_id, .. } = places[1].to_reference() else {
            panic!("saved places resolve to named references");
        };
        assert_eq!(saved_place_for(&place_id, &places).map(|p| p.id), Some(2));

        assert!(saved_place_for("9", &places).is_none());
        assert!(saved_place_for("-16.92,145.77", &places).is_none());
        assert_eq!(next_place_id(&places), 5);
        assert_eq!(next_place_id(&[]), 1);
    }

    #[test]
    fn test_summary_lines() {
        let snapshot = ForecastSnapshot {
            current: CurrentConditions {
                temp: 295.37,
                feels_like: 295.37,
                conditions: vec![ConditionSummary {
                    id: 800,
                    main: "Clear".into(),
                    description: "clear sky".into(),
                    icon: "01d".into(),
                }],
                ..CurrentConditions::default()
            },
            hourly: Vec::new(),
            daily: Vec::new(),
            fetched_at: Default::default(),
            timezone_offset_secs: 0,
        };

        let lines = summary_lines(&snapshot, None, TemperatureUnit::Fahrenheit);
        assert_eq!(lines, vec!["Now: 72° clear sky (feels like 72°)".to_string()]);
    }
}
