use clap::{Parser, Subcommand};

const ABOUT: &str = "Forecasts and saved places from OpenWeather";

const LONG_ABOUT: &str = "
Shows the current conditions and forecast for a place using the OpenWeather One Call API.

Without arguments the configured default place is used, falling back to the first saved place.
The API key is read from the OPENWEATHER_API_KEY environment variable or the system keyring
(see `skyward set-key`).
";

#[derive(Parser, Debug)]
#[command(version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the forecast for a place (default)
    Show(ShowArgs),
    /// List saved places
    Places,
    /// Remove a saved place by id
    Forget { id: i64 },
    /// Store the OpenWeather API key in the system keyring
    SetKey { key: String },
    /// Remove the API key from the system keyring
    DeleteKey,
}

impl Default for Command {
    fn default() -> Self {
        Command::Show(ShowArgs::default())
    }
}

#[derive(clap::Args, Debug, Default)]
pub struct ShowArgs {
    #[arg(long, allow_hyphen_values = true, requires = "lon", help = "Latitude in degrees")]
    pub lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, requires = "lat", help = "Longitude in degrees")]
    pub lon: Option<f64>,

    #[arg(long, help = "Display name for --lat/--lon")]
    pub name: Option<String>,

    #[arg(long, conflicts_with_all = ["lat", "lon"], help = "Id of a saved place")]
    pub saved: Option<i64>,

    #[arg(long, help = "Save the place after a successful fetch")]
    pub save: bool,

    #[arg(long, help = "Keep refreshing until interrupted")]
    pub watch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_show() {
        let args = Args::parse_from(["skyward"]);
        assert!(args.command.is_none());
        assert!(matches!(Command::default(), Command::Show(_)));
    }

    #[test]
    fn test_negative_coordinates() {
        let args = Args::parse_from(["skyward", "show", "--lat", "-33.87", "--lon", "151.21"]);
        match args.command {
            Some(Command::Show(show)) => {
                assert_eq!(show.lat, Some(-33.87));
                assert_eq!(show.lon, Some(151.21));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lat_requires_lon() {
        assert!(Args::try_parse_from(["skyward", "show", "--lat", "10"]).is_err());
    }
}
