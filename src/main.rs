use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::path::PathBuf;

use specular::batch::Pipeline;
use specular::config::Config;
use specular::elevation::{ElevationProvider, NoTerrain, SrtmTiles};
use specular::export::export_all;
use specular::footprint::{FootprintSynthesizer, Winding, DEFAULT_VERTICES};
use specular::geodesy::Vincenty;
use specular::observer::ObserverState;
use specular::radio::Band;
use specular::specular::{SolverConfig, SpecularSolver, DEFAULT_ITERATIONS};
use specular::tle::{fetch_tle, load_tle_file};

#[derive(Parser)]
#[command(version, about = "GNSS-R specular point and footprint estimator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Specular points and footprints for every catalog satellite
    Batch {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Observation time (RFC 3339), defaults to now
        #[arg(short, long)]
        time: Option<DateTime<Utc>>,
        /// Overrides the configured output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Specular point and footprint for a single geometry
    Point {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Receiver altitude above mean sea level (m)
        #[arg(long, allow_negative_numbers = true)]
        alt: f64,
        #[arg(long, allow_negative_numbers = true)]
        elevation: f64,
        #[arg(long)]
        azimuth: f64,
        #[arg(long, value_enum, default_value = "l1")]
        band: Band,
        /// Overrides the band's carrier wavelength (m)
        #[arg(long)]
        wavelength: Option<f64>,
        #[arg(long, default_value_t = DEFAULT_VERTICES)]
        vertices: usize,
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,
        #[arg(long)]
        tolerance: Option<f64>,
        /// Directory of SRTM .hgt tiles
        #[arg(long)]
        dem_dir: Option<PathBuf>,
    },
}

fn terrain_provider(dem_dir: Option<&PathBuf>) -> Box<dyn ElevationProvider> {
    match dem_dir {
        Some(dir) => Box::new(SrtmTiles::new(dir)),
        None => Box::new(NoTerrain),
    }
}

fn run_batch(config_path: PathBuf, time: Option<DateTime<Utc>>, output: Option<PathBuf>) -> Result<()> {
    let config = Config::load(&config_path)?;
    let time = time.unwrap_or_else(Utc::now);

    let observer = ObserverState::new(
        config.observer.name.clone(),
        config.observer.latitude,
        config.observer.longitude,
        config.observer.altitude,
    )?;

    let tle_path = match &config.satellites.tle_file {
        Some(path) => path.clone(),
        None => fetch_tle(
            &config.satellites.tle_url,
            &config.satellites.cache_dir(),
            time.date_naive(),
        )?,
    };
    let satellites = load_tle_file(&tle_path, &config.satellites.tracked_satellites)
        .with_context(|| format!("loading satellites from {}", tle_path.display()))?;
    info!("Loaded {} satellites from {}", satellites.len(), tle_path.display());

    let geodesic = Vincenty::wgs84();
    let terrain = terrain_provider(config.specular.dem_dir.as_ref());
    let pipeline = Pipeline::new(&config, &observer, &geodesic, terrain.as_ref());
    let observations = pipeline.run(&satellites, time);

    let directory = output.unwrap_or_else(|| config.output.directory.clone());
    let (csv_path, geojson_path) = export_all(&directory, &observations, &observer, time)?;
    info!("Wrote {} and {}", csv_path.display(), geojson_path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_point(
    lat: f64,
    lon: f64,
    alt: f64,
    elevation: f64,
    azimuth: f64,
    wavelength: f64,
    vertices: usize,
    solver_config: SolverConfig,
    dem_dir: Option<PathBuf>,
) -> Result<()> {
    let geodesic = Vincenty::wgs84();
    let terrain = terrain_provider(dem_dir.as_ref());

    let specular = SpecularSolver::new(&geodesic, terrain.as_ref(), solver_config)
        .solve(lat, lon, alt, elevation, azimuth)?;
    let footprint = FootprintSynthesizer::new(&geodesic).synthesize(
        specular.point.latitude,
        specular.point.longitude,
        alt - specular.terrain_elevation_m,
        elevation,
        azimuth,
        wavelength,
        vertices,
    )?;

    let report = json!({
        "specular_lat": specular.point.latitude,
        "specular_lon": specular.point.longitude,
        "specular_dem": specular.terrain_elevation_m,
        "iterations": specular.diagnostics.iterations,
        "last_step_m": specular.diagnostics.last_step_m,
        "converged": specular.diagnostics.converged,
        "semi_major_m": footprint.axes.semi_major_m,
        "semi_minor_m": footprint.axes.semi_minor_m,
        "polygon": footprint.ring(Winding::Clockwise),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Batch {
            config,
            time,
            output,
        } => run_batch(config, time, output),
        Command::Point {
            lat,
            lon,
            alt,
            elevation,
            azimuth,
            band,
            wavelength,
            vertices,
            iterations,
            tolerance,
            dem_dir,
        } => run_point(
            lat,
            lon,
            alt,
            elevation,
            azimuth,
            wavelength.unwrap_or_else(|| band.wavelength_m()),
            vertices,
            SolverConfig {
                iterations,
                tolerance_m: tolerance,
            },
            dem_dir,
        ),
    }
}
