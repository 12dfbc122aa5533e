use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use satpass::catalog::Catalog;
use satpass::config::{parse_duration, Config, ConfigError};
use satpass::elements::OrbitalElementRecord;
use satpass::frames::StationPosition;
use satpass::predict::{PassAggregator, PassQuery, PredictError};
use satpass::propagate::PropagationError;
use satpass::tracker::{doppler_shift, get_footprint, get_position, get_track, pass_path, Link};

#[derive(Parser)]
#[command(name = "satpass")]
#[command(about = "Satellite pass prediction and tracking")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and satellite catalog
    Validate,
    /// Predict passes of all catalog satellites over the station
    Passes {
        /// Start time (RFC3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        hours: Option<u32>,
        #[arg(long)]
        min_elevation: Option<f64>,
        /// Only satellites tagged with one of these modes
        #[arg(long, value_delimiter = ',')]
        modes: Vec<String>,
        /// Print the azimuth/elevation path of every pass
        #[arg(long)]
        paths: bool,
    },
    /// Observe one satellite from the station
    Position {
        norad_id: u32,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Transmitter frequency in Hz, prints the Doppler corrected value
        #[arg(long)]
        frequency: Option<f64>,
        #[arg(long, default_value = "downlink")]
        link: Link,
    },
    /// Sub-satellite ground track, split at the antimeridian
    Track {
        norad_id: u32,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Track length, defaults to one orbital period
        #[arg(long, value_parser = parse_duration)]
        length: Option<Duration>,
        #[arg(long, value_parser = parse_duration)]
        step: Option<Duration>,
    },
    /// Visibility footprint around the sub-satellite point
    Footprint {
        norad_id: u32,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Bearing step in degrees
        #[arg(long)]
        resolution: Option<f64>,
    },
    /// Run the HTTP API
    Serve,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("NORAD {0} is not in the catalog")]
    NotFound(u32),
    #[error("{0}")]
    Argument(String),
    #[error(transparent)]
    Propagation(#[from] PropagationError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

struct Context {
    config: Config,
    station: StationPosition,
    catalog: Catalog,
    json: bool,
}

impl Context {
    fn load(path: &str, json: bool) -> Result<Self, CliError> {
        let config = Config::from_file(path)?;
        let station = config.station.position()?;
        let catalog = Catalog::from_entries(&config.satellites);
        Ok(Self {
            config,
            station,
            catalog,
            json,
        })
    }

    fn record(&self, norad_id: u32) -> Result<&OrbitalElementRecord, CliError> {
        self.catalog
            .get(norad_id)
            .map(|r| r.as_ref())
            .ok_or(CliError::NotFound(norad_id))
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<(), CliError> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let ctx = Context::load(&cli.config, cli.json)?;

    match cli.command {
        Commands::Validate => Ok(validate(&ctx)),
        Commands::Passes {
            start,
            hours,
            min_elevation,
            modes,
            paths,
        } => passes(&ctx, start, hours, min_elevation, modes, paths).await,
        Commands::Position {
            norad_id,
            at,
            frequency,
            link,
        } => position(&ctx, norad_id, at, frequency, link),
        Commands::Track {
            norad_id,
            start,
            length,
            step,
        } => track(&ctx, norad_id, start, length, step),
        Commands::Footprint {
            norad_id,
            at,
            resolution,
        } => footprint(&ctx, norad_id, at, resolution),
        Commands::Serve => {
            satpass::web::run_server(ctx.config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn validate(ctx: &Context) -> ExitCode {
    println!(
        "Station {} at {:.4}, {:.4} ({} m)",
        ctx.config.station.name.as_deref().unwrap_or("(unnamed)"),
        ctx.station.latitude_deg,
        ctx.station.longitude_deg,
        ctx.station.altitude_m
    );
    println!("{} satellite(s) loaded", ctx.catalog.len());
    for record in ctx.catalog.records() {
        println!(
            "  {:>6} {:<24} epoch {} period {:.1} min{}",
            record.norad_id(),
            record.name(),
            record.epoch().format("%Y-%m-%d %H:%M:%S"),
            record.period_minutes(),
            if record.is_deep_space() { " (deep space)" } else { "" }
        );
    }

    if ctx.catalog.rejected().is_empty() {
        ExitCode::SUCCESS
    } else {
        for e in ctx.catalog.rejected() {
            eprintln!("  rejected: {}", e);
        }
        ExitCode::FAILURE
    }
}

async fn passes(
    ctx: &Context,
    start: Option<DateTime<Utc>>,
    hours: Option<u32>,
    min_elevation: Option<f64>,
    modes: Vec<String>,
    paths: bool,
) -> Result<ExitCode, CliError> {
    let defaults = &ctx.config.predict;
    let mut query = PassQuery::new(
        start.unwrap_or_else(Utc::now),
        hours.unwrap_or(defaults.horizon_hours),
        min_elevation.unwrap_or(defaults.min_elevation_deg),
    );
    if !modes.is_empty() {
        query = query.with_modes(ctx.catalog.mode_filter(&modes));
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling pass search");
            on_signal.cancel();
        }
    });

    let report = PassAggregator::new(defaults.pass_finder())
        .compute_passes(ctx.catalog.records(), ctx.station, &query, &cancel)
        .await?;

    if ctx.json {
        ctx.print_json(&report.passes)?;
    } else {
        println!(
            "{:<20} {:>6}  {:<20} {:<20} {:>6} {:>7}  AZ (AOS/TCA/LOS)",
            "SATELLITE", "NORAD", "AOS", "LOS", "MAX EL", "MINUTES"
        );
        for pass in &report.passes {
            println!(
                "{:<20} {:>6}  {:<20} {:<20} {:>6.1} {:>7.1}  {:.0}/{:.0}/{:.0}{}",
                pass.satellite,
                pass.norad_id,
                pass.aos.format("%Y-%m-%d %H:%M:%S"),
                pass.los.format("%Y-%m-%d %H:%M:%S"),
                pass.max_elevation_deg,
                pass.duration_seconds / 60.0,
                pass.aos_azimuth_deg,
                pass.tca_azimuth_deg,
                pass.los_azimuth_deg,
                if pass.is_partial() { " (partial)" } else { "" }
            );
            if paths {
                let record = ctx.record(pass.norad_id)?;
                for point in pass_path(record, &ctx.station, pass, defaults.track_step)? {
                    println!(
                        "    {}  az {:>6.1}  el {:>5.1}",
                        point.at.format("%H:%M:%S"),
                        point.azimuth_deg,
                        point.elevation_deg
                    );
                }
            }
        }
    }

    for failure in &report.failures {
        eprintln!("Failed: {}", failure);
    }
    Ok(ExitCode::SUCCESS)
}

fn position(
    ctx: &Context,
    norad_id: u32,
    at: Option<DateTime<Utc>>,
    frequency: Option<f64>,
    link: Link,
) -> Result<ExitCode, CliError> {
    let record = ctx.record(norad_id)?;
    let pos = get_position(record, &ctx.station, at.unwrap_or_else(Utc::now))?;

    if ctx.json {
        ctx.print_json(&pos)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} ({}) at {}", record.name(), norad_id, pos.at);
    println!(
        "  sub-satellite {:.4}, {:.4}  altitude {:.1} km{}",
        pos.latitude_deg,
        pos.longitude_deg,
        pos.altitude_km,
        if pos.eclipsed { "  (eclipsed)" } else { "" }
    );
    println!(
        "  azimuth {:.2}  elevation {:.2}  range {:.1} km  range rate {:.3} km/s",
        pos.azimuth_deg, pos.elevation_deg, pos.range_km, pos.range_rate_km_s
    );
    if let Some(frequency) = frequency {
        println!(
            "  {} {:.0} Hz -> {:.0} Hz",
            link,
            frequency,
            doppler_shift(frequency, pos.range_rate_km_s, link)
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn track(
    ctx: &Context,
    norad_id: u32,
    start: Option<DateTime<Utc>>,
    length: Option<Duration>,
    step: Option<Duration>,
) -> Result<ExitCode, CliError> {
    let record = ctx.record(norad_id)?;
    let start = start.unwrap_or_else(Utc::now);
    let length = length.unwrap_or_else(|| {
        Duration::milliseconds((record.period_minutes() * 60_000.0).round() as i64)
    });
    let step = step.unwrap_or(ctx.config.predict.track_step);
    let end = start
        .checked_add_signed(length)
        .ok_or_else(|| CliError::Argument("track ends beyond the supported calendar".into()))?;

    let segments = get_track(record, start, end, step)
        .segments(&ctx.config.predict.antimeridian())?;

    if ctx.json {
        ctx.print_json(&segments)?;
        return Ok(ExitCode::SUCCESS);
    }
    for (i, segment) in segments.iter().enumerate() {
        println!("segment {}", i + 1);
        for point in segment {
            println!(
                "  {}  {:>8.3} {:>9.3}  {:>8.1} km",
                point.at.format("%Y-%m-%d %H:%M:%S"),
                point.latitude_deg,
                point.longitude_deg,
                point.altitude_km
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn footprint(
    ctx: &Context,
    norad_id: u32,
    at: Option<DateTime<Utc>>,
    resolution: Option<f64>,
) -> Result<ExitCode, CliError> {
    let record = ctx.record(norad_id)?;
    let points = get_footprint(
        record,
        at.unwrap_or_else(Utc::now),
        resolution.unwrap_or(ctx.config.predict.footprint_resolution_deg),
    )?;

    if ctx.json {
        ctx.print_json(&points)?;
    } else {
        for point in &points {
            println!("{:.4}, {:.4}", point.latitude_deg, point.longitude_deg);
        }
    }
    Ok(ExitCode::SUCCESS)
}
