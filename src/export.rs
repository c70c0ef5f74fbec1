//! Tabular (CSV) and GeoJSON output of a batch run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::Observation;
use crate::footprint::Winding;
use crate::observer::ObserverState;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Serialize)]
pub struct ObservationRow {
    pub prn_id: String,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub distance_km: f64,
    pub observer_lat: f64,
    pub observer_lon: f64,
    pub observer_alt: f64,
    pub observer_date: String,
    pub next_rise: Option<String>,
    pub culminate: Option<String>,
    pub next_set: Option<String>,
    pub specular_lat: Option<f64>,
    pub specular_lon: Option<f64>,
    pub specular_dem: Option<f64>,
    pub semi_major_m: Option<f64>,
    pub semi_minor_m: Option<f64>,
    pub iterations: Option<usize>,
}

fn format_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
}

impl ObservationRow {
    pub fn new(observation: &Observation, observer: &ObserverState) -> Self {
        let reflection = observation.reflection.as_ref();
        Self {
            prn_id: observation.prn_id.clone(),
            elevation_deg: observation.look.elevation,
            azimuth_deg: observation.look.azimuth,
            distance_km: observation.look.slant_range_km,
            observer_lat: observer.latitude(),
            observer_lon: observer.longitude(),
            observer_alt: observer.altitude,
            observer_date: observation.time.format(TIME_FORMAT).to_string(),
            next_rise: format_time(observation.events.rise),
            culminate: format_time(observation.events.culmination),
            next_set: format_time(observation.events.set),
            specular_lat: reflection.map(|r| r.specular.point.latitude),
            specular_lon: reflection.map(|r| r.specular.point.longitude),
            specular_dem: reflection.map(|r| r.specular.terrain_elevation_m),
            semi_major_m: reflection.map(|r| r.footprint.axes.semi_major_m),
            semi_minor_m: reflection.map(|r| r.footprint.axes.semi_minor_m),
            iterations: reflection.map(|r| r.specular.diagnostics.iterations),
        }
    }
}

pub fn write_csv(path: &Path, observations: &[Observation], observer: &ObserverState) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for observation in observations {
        writer.serialize(ObservationRow::new(observation, observer))?;
    }
    writer.flush()?;
    Ok(())
}

/// FeatureCollection with one footprint polygon per reflected satellite.
/// Rings are counter-clockwise as RFC 7946 requires for exterior rings.
pub fn footprints_geojson(observations: &[Observation]) -> Value {
    let features: Vec<Value> = observations
        .iter()
        .filter_map(|observation| {
            let reflection = observation.reflection.as_ref()?;
            Some(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [reflection.footprint.ring(Winding::CounterClockwise)],
                },
                "properties": {
                    "ID": observation.prn_id,
                    "elevation": observation.look.elevation,
                    "azimuth": observation.look.azimuth,
                    "specular_dem": reflection.specular.terrain_elevation_m,
                },
            }))
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn write_geojson(path: &Path, observations: &[Observation]) -> Result<()> {
    let contents = serde_json::to_string_pretty(&footprints_geojson(observations))?;
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Writes `observations_<time>.csv` and `Ellipse_layer.json` into `directory`.
pub fn export_all(
    directory: &Path,
    observations: &[Observation],
    observer: &ObserverState,
    time: DateTime<Utc>,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(directory)
        .with_context(|| format!("creating output directory {}", directory.display()))?;

    let csv_path = directory.join(format!("observations_{}.csv", time.format("%Y%m%dT%H%M%S")));
    write_csv(&csv_path, observations, observer)?;

    let geojson_path = directory.join("Ellipse_layer.json");
    write_geojson(&geojson_path, observations)?;

    Ok((csv_path, geojson_path))
}
