use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use ecoroute::api::AppState;
use ecoroute::config::EcoRouteConfig;
use ecoroute::geocoding::{LocationInput, LocationParser};
use ecoroute::planner::{RoutePlanner, RouteRequest};
use ecoroute::render;
use ecoroute::{
    EcoRouteError, OpenWeatherMapClient, RouteModel, ScoringStrategy, VehicleType,
    WeatherProvider, analyze_weather, chat, telemetry, web,
};

/// Weather-aware delivery route planning with learned route scoring
#[derive(Parser, Debug)]
#[command(name = "ecoroute", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find, score and rank routes between two locations
    Route {
        #[arg(long, value_name = "LOCATION")]
        from: String,
        #[arg(long, value_name = "LOCATION")]
        to: String,
        /// DRIVING, BICYCLING, WALKING, TRANSIT, CARGO_SMALL, CARGO_MEDIUM, CARGO_LARGE or CARGO_REF
        #[arg(long)]
        vehicle: Option<VehicleType>,
        /// Cargo weight in kg
        #[arg(long, value_name = "KG", default_value_t = 0.0)]
        cargo: f64,
        /// Only ask for the provider's primary route
        #[arg(long = "no-alternatives", action = clap::ArgAction::SetTrue)]
        no_alternatives: bool,
        #[arg(long = "avoid-highways", action = clap::ArgAction::SetTrue)]
        avoid_highways: bool,
        #[arg(long = "avoid-tolls", action = clap::ArgAction::SetTrue)]
        avoid_tolls: bool,
        /// Departure as RFC 3339, e.g. 2026-10-16T08:00:00Z; defaults to now
        #[arg(long = "depart-at", value_name = "TIME")]
        depart_at: Option<DateTime<Utc>>,
        /// model or closed-form
        #[arg(long)]
        scoring: Option<ScoringStrategy>,
        /// Write the best route as GPX
        #[arg(long, value_name = "PATH")]
        gpx: Option<PathBuf>,
        /// Print the vehicle animation frames of the best route
        #[arg(long, action = clap::ArgAction::SetTrue)]
        animate: bool,
    },
    /// Current weather and travel safety at a point
    Weather {
        /// Coordinates as "lat,lng"
        #[arg(long, value_name = "LAT,LNG")]
        location: String,
    },
    /// Ask the route planning helper
    Chat {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Train the route model and print the training report
    Train,
    /// Serve the JSON API and the static front-end
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match EcoRouteConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", describe(&e, cli.verbose));
            return ExitCode::FAILURE;
        }
    };

    let _telemetry = match telemetry::init(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", describe(&e, cli.verbose));
            ExitCode::FAILURE
        }
    }
}

/// User-facing text for an error; the full chain when verbose
fn describe(err: &anyhow::Error, verbose: bool) -> String {
    if verbose {
        return format!("{err:#}");
    }
    match err.downcast_ref::<EcoRouteError>() {
        Some(EcoRouteError::Config { message }) => message.clone(),
        Some(e) => e.user_message(),
        None => format!("{err:#}"),
    }
}

async fn run(command: Command, mut config: EcoRouteConfig) -> Result<()> {
    match command {
        Command::Route {
            from,
            to,
            vehicle,
            cargo,
            no_alternatives,
            avoid_highways,
            avoid_tolls,
            depart_at,
            scoring,
            gpx,
            animate,
        } => {
            if let Some(scoring) = scoring {
                config.defaults.scoring = scoring.as_str().to_string();
            }
            let vehicle = match vehicle {
                Some(vehicle) => vehicle,
                None => config.defaults.vehicle.parse()?,
            };
            let request = RouteRequest {
                origin: from,
                destination: to,
                vehicle,
                cargo_weight_kg: cargo,
                alternatives: !no_alternatives,
                avoid_highways,
                avoid_tolls,
                departure_time: depart_at,
            };
            route(&config, request, gpx, animate).await
        }
        Command::Weather { location } => weather(&config, &location).await,
        Command::Chat { message } => {
            // No route has been planned in a one-shot session
            if let Some(reply) = chat::reply(&message.join(" "), None) {
                println!("{reply}");
            }
            Ok(())
        }
        Command::Train => {
            let model = RouteModel::new(config.model.clone());
            let report = train_in_background(Arc::new(model)).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let model = Arc::new(RouteModel::new(config.model.clone()));
            let planner = RoutePlanner::from_config(&config, model.clone())?;
            train_in_background(model.clone()).await?;
            web::run(AppState::new(planner, model), port, &config.server.static_dir).await
        }
    }
}

/// Training is CPU-bound, keep it off the async workers
async fn train_in_background(model: Arc<RouteModel>) -> Result<ecoroute::TrainingReport> {
    tokio::task::spawn_blocking(move || model.ensure_trained().cloned())
        .await
        .context("Model training task failed")?
}

async fn route(
    config: &EcoRouteConfig,
    request: RouteRequest,
    gpx: Option<PathBuf>,
    animate: bool,
) -> Result<()> {
    let model = Arc::new(RouteModel::new(config.model.clone()));
    let mut planner = RoutePlanner::from_config(config, model.clone())?;
    if config.defaults.scoring.parse::<ScoringStrategy>()? == ScoringStrategy::Model {
        let report = train_in_background(model).await?;
        debug!("Route model validation loss {:.4}", report.validation_loss);
    }

    info!(
        "Planning {} route from {} to {}",
        request.vehicle, request.origin, request.destination
    );
    let plan = planner.plan(request).await?;

    println!("{}\n", plan.weather_panel().to_text());
    for card in plan.cards() {
        println!("{}\n", card.to_text());
    }

    if animate {
        for frame in plan.best_animation() {
            println!(
                "{} step {} point {}: {:.5}, {:.5} ({:.0} m)",
                frame.icon,
                frame.step_index + 1,
                frame.point_index + 1,
                frame.position.lat,
                frame.position.lng,
                frame.travelled_m
            );
        }
    }

    if let Some(path) = gpx {
        let document = render::to_gpx(plan.best())?;
        std::fs::write(&path, document)
            .with_context(|| format!("Failed to write GPX file {}", path.display()))?;
        println!("Best route written to {}", path.display());
    }

    Ok(())
}

async fn weather(config: &EcoRouteConfig, location: &str) -> Result<()> {
    let LocationInput::Coordinates(position) = LocationParser::parse(location)? else {
        return Err(EcoRouteError::validation(
            "Weather lookup needs coordinates in the form 'lat,lng'",
        )
        .into());
    };

    let api_key = config
        .weather
        .api_key
        .clone()
        .ok_or_else(|| EcoRouteError::config("Weather API key is required (OPENWEATHER_API_KEY)"))?;
    let client = OpenWeatherMapClient::new(&config.weather, api_key)?;

    info!("Fetching weather for: {}", position.to_query());
    let snapshot = client.current(position.lat, position.lng).await?;
    let analysis = analyze_weather(Some(&snapshot));
    println!("{}", render::weather_panel(&analysis).to_text());
    Ok(())
}
