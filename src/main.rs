use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use trash_mboa_client::api::{auth, collectes, dechets, geo, signalements, stats, users};
use trash_mboa_client::configuration::{get_configuration, Settings};
use trash_mboa_client::routing::LatLon;
use trash_mboa_client::telemetry::init_telemetry;
use trash_mboa_client::{
    ApiClient, ApiError, FileTokenStore, Notification, RoutingClient, SessionEvents,
};

#[derive(Parser)]
#[command(name = "trash-mboa", about = "Command-line client for the Trash Mboa waste platform")]
struct Cli {
    /// Configuration file (defaults to an optional `configuration.*` in the working directory)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session tokens
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the logged-in user
    Me,
    Dechets,
    Signalements,
    /// Pickups waiting for a collector
    Pending,
    /// Mark a pickup as collected
    Validate { id: i64 },
    /// Collected and processed pickups
    History,
    /// Waste items around a position
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Search radius in kilometres
        #[arg(long, default_value_t = geo::DEFAULT_RADIUS_KM)]
        radius: f64,
    },
    /// Admin dashboard figures
    Stats,
    /// Driving route between two `lat,lon` positions
    Route {
        #[arg(long, value_parser = parse_lat_lon, allow_hyphen_values = true)]
        from: LatLon,
        #[arg(long, value_parser = parse_lat_lon, allow_hyphen_values = true)]
        to: LatLon,
    },
}

fn parse_lat_lon(value: &str) -> Result<LatLon, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lon`, got `{}`", value))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let lon = lon.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((lat, lon))
}

/// Session events for a terminal: notifications go to stderr, and a
/// navigation to the login route becomes a hint to log in again.
struct ConsoleSessionEvents;

impl SessionEvents for ConsoleSessionEvents {
    fn notify(&self, notification: Notification) {
        eprintln!("{}: {}", notification.title, notification.message);
    }

    fn navigate(&self, route: &str) {
        tracing::info!(route = route, "Session ended");
        eprintln!("Run `trash-mboa login` to start a new session.");
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

async fn run(command: Command, settings: &Settings, client: &ApiClient) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let session = auth::login(client, &email, &password).await?;
            print_json(&session.user)
        }
        Command::Logout => Ok(auth::logout(client).await?),
        Command::Me => print_json(&users::current_user(client).await?),
        Command::Dechets => print_json(&dechets::list(client).await?),
        Command::Signalements => print_json(&signalements::list(client).await?),
        Command::Pending => print_json(&collectes::pending(client).await?),
        Command::Validate { id } => print_json(&collectes::validate(client, id).await?),
        Command::History => print_json(&collectes::history(client).await?),
        Command::Nearby { lat, lon, radius } => print_json(
            &geo::nearby(client, Some(lat), Some(lon), radius, geo::ProximityKind::Dechets).await?,
        ),
        Command::Stats => print_json(&stats::fetch_stats(client).await?),
        Command::Route { from, to } => {
            let routing = RoutingClient::from_settings(&settings.routing)?;
            print_json(&routing.directions(from, to).await?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match get_configuration(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to read configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_telemetry(&settings.log.filter);
    tracing::debug!(base_url = %settings.api.base_url, "Configuration loaded");

    let store = Arc::new(FileTokenStore::new(settings.storage.token_file.clone()));
    let client = match ApiClient::from_settings(&settings.api, store, Arc::new(ConsoleSessionEvents)) {
        Ok(client) => client,
        Err(e) => {
            e.log_error("build_client");
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &settings, &client).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(api_error) => {
                    api_error.log_error("command");
                    eprintln!("{}", api_error.user_message());
                }
                None => {
                    tracing::error!(error = %e, "Command failed");
                    eprintln!("{:#}", e);
                }
            }
            ExitCode::FAILURE
        }
    }
}
