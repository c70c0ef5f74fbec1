use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::footprint::DEFAULT_VERTICES;
use crate::radio::Band;
use crate::specular::{SolverConfig, DEFAULT_ITERATIONS};

/// Longest visibility search accepted, one leap year.
pub const MAX_SEARCH_HOURS: f64 = 24.0 * 366.0;

pub const GPS_OPS_URL: &str = "https://celestrak.com/NORAD/elements/gps-ops.txt";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub observer: ObserverConfig,
    #[serde(default)]
    pub satellites: SatellitesConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub specular: SpecularConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_observer_name")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64, // meters above mean sea level
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SatellitesConfig {
    pub tle_url: String,
    /// Read this TLE file instead of downloading.
    pub tle_file: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub tracked_satellites: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub min_elevation: f64, // degrees
    pub search_hours: f64,
    pub time_step: f64, // seconds
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SpecularConfig {
    pub iterations: usize,
    pub tolerance_m: Option<f64>,
    pub band: Band,
    /// Overrides the band's carrier wavelength.
    pub wavelength_m: Option<f64>,
    pub vertices: usize,
    pub dem_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

fn default_observer_name() -> String {
    "observer".to_string()
}

impl Default for SatellitesConfig {
    fn default() -> Self {
        Self {
            tle_url: GPS_OPS_URL.to_string(),
            tle_file: None,
            cache_dir: None,
            tracked_satellites: Vec::new(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            min_elevation: 10.0,
            search_hours: 24.0,
            time_step: 30.0,
        }
    }
}

impl Default for SpecularConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            tolerance_m: None,
            band: Band::L1,
            wavelength_m: None,
            vertices: DEFAULT_VERTICES,
            dem_dir: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("observation_output"),
        }
    }
}

impl SatellitesConfig {
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join("specular").join("tle"))
                .unwrap_or_else(|| PathBuf::from("tle_cache"))
        })
    }
}

impl SpecularConfig {
    pub fn wavelength_m(&self) -> f64 {
        self.wavelength_m.unwrap_or_else(|| self.band.wavelength_m())
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            iterations: self.iterations,
            tolerance_m: self.tolerance_m,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.observer.latitude) {
            bail!("observer latitude {} outside [-90, 90]", self.observer.latitude);
        }
        if self.specular.iterations == 0 {
            bail!("specular.iterations must be at least 1");
        }
        if self.specular.vertices == 0 {
            bail!("specular.vertices must be at least 1");
        }
        if let Some(tolerance) = self.specular.tolerance_m {
            if !(tolerance >= 0.0) {
                bail!("specular.tolerance_m must be non-negative, got {tolerance}");
            }
        }
        if !(self.specular.wavelength_m() > 0.0) {
            bail!("signal wavelength must be positive");
        }
        let max_step = MAX_SEARCH_HOURS * 3600.0;
        if !(self.prediction.time_step > 0.0 && self.prediction.time_step <= max_step) {
            bail!("prediction.time_step must be positive and at most {max_step} s");
        }
        if !(0.0..=MAX_SEARCH_HOURS).contains(&self.prediction.search_hours) {
            bail!("prediction.search_hours must be within [0, {MAX_SEARCH_HOURS}]");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINIMAL: &str = r#"
        [observer]
        latitude = 43.5585024
        longitude = 1.4712832
        altitude = 151.0
    "#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.observer.name, "observer");
        assert_eq!(config.satellites.tle_url, GPS_OPS_URL);
        assert_eq!(config.prediction.min_elevation, 10.0);
        assert_eq!(config.specular.solver_config(), SolverConfig::default());
        assert_eq!(config.specular.vertices, 10);
        assert_relative_eq!(config.specular.wavelength_m(), 0.19029367279836487);
        assert_eq!(config.output.directory, PathBuf::from("observation_output"));
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            [observer]
            name = "Toulouse"
            latitude = 43.5585024
            longitude = 1.4712832
            altitude = 151.0

            [satellites]
            tle_file = "gps-ops.txt"
            cache_dir = "/tmp/tle"
            tracked_satellites = ["PRN 05", "PRN 12"]

            [prediction]
            min_elevation = 5.0
            search_hours = 12.0
            time_step = 10.0

            [specular]
            iterations = 6
            tolerance_m = 0.01
            band = "L5"
            vertices = 36
            dem_dir = "/data/srtm"

            [output]
            directory = "out"
            "#,
        )
        .unwrap();
        assert_eq!(config.observer.name, "Toulouse");
        assert_eq!(config.satellites.tle_file, Some(PathBuf::from("gps-ops.txt")));
        assert_eq!(config.satellites.cache_dir(), PathBuf::from("/tmp/tle"));
        assert_eq!(config.satellites.tracked_satellites.len(), 2);
        assert_eq!(
            config.specular.solver_config(),
            SolverConfig {
                iterations: 6,
                tolerance_m: Some(0.01)
            }
        );
        assert_eq!(config.specular.band, Band::L5);
        assert_relative_eq!(config.specular.wavelength_m(), Band::L5.wavelength_m());
    }

    #[test]
    fn test_wavelength_override() {
        let config = Config::from_toml(&format!("{MINIMAL}\n[specular]\nwavelength_m = 0.2\n")).unwrap();
        assert_eq!(config.specular.wavelength_m(), 0.2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Config::from_toml(&format!("{MINIMAL}\n[specular]\niterations = 0\n")).is_err());
        assert!(Config::from_toml(&format!("{MINIMAL}\n[specular]\nwavelength_m = -1.0\n")).is_err());
        assert!(Config::from_toml(&format!("{MINIMAL}\n[prediction]\ntime_step = 0.0\n")).is_err());
        assert!(Config::from_toml(&format!("{MINIMAL}\n[prediction]\ntime_step = 1e15\n")).is_err());
        assert!(Config::from_toml(&format!("{MINIMAL}\n[prediction]\nsearch_hours = 1e15\n")).is_err());
        assert!(Config::from_toml(&format!("{MINIMAL}\n[prediction]\nsearch_hours = 8784.0\n")).is_ok());
        assert!(Config::from_toml("[observer]\nlatitude = 1.0\n").is_err());
    }
}
