//! Terrain height lookup.
//!
//! A missing sample is never an error for the solver: providers return
//! `None` and the caller substitutes sea level.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use thiserror::Error;

const SRTM_VOID: i16 = -32768;

#[derive(Debug, Error)]
pub enum DemError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} has {len} bytes, not a square SRTM grid")]
    BadTileSize { path: PathBuf, len: usize },
}

pub trait ElevationProvider: Send + Sync {
    /// Terrain height in meters above mean sea level, `None` where there is
    /// no data.
    fn elevation(&self, latitude: f64, longitude: f64) -> Option<f64>;
}

impl<F> ElevationProvider for F
where
    F: Fn(f64, f64) -> Option<f64> + Send + Sync,
{
    fn elevation(&self, latitude: f64, longitude: f64) -> Option<f64> {
        self(latitude, longitude)
    }
}

/// Flat Earth at sea level.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTerrain;

impl ElevationProvider for NoTerrain {
    fn elevation(&self, _latitude: f64, _longitude: f64) -> Option<f64> {
        None
    }
}

/// One SRTM `.hgt` tile: a square grid of big-endian heights, north row first.
#[derive(Debug)]
pub struct HgtTile {
    samples: usize,
    heights: Vec<i16>,
}

impl HgtTile {
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, DemError> {
        let count = bytes.len() / 2;
        let samples = (count as f64).sqrt().round() as usize;
        if bytes.len() % 2 != 0 || samples < 2 || samples * samples != count {
            return Err(DemError::BadTileSize {
                path: path.to_path_buf(),
                len: bytes.len(),
            });
        }
        let heights = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self { samples, heights })
    }

    pub fn load(path: &Path) -> Result<Self, DemError> {
        let bytes = fs::read(path).map_err(|source| DemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, &bytes)
    }

    /// Nearest sample to the point; `south`/`west` are the tile's corner.
    pub fn sample(&self, latitude: f64, longitude: f64, south: f64, west: f64) -> Option<f64> {
        let last = (self.samples - 1) as f64;
        let row = ((south + 1.0 - latitude) * last).round();
        let col = ((longitude - west) * last).round();
        if !(0.0..=last).contains(&row) || !(0.0..=last).contains(&col) {
            return None;
        }
        let value = self.heights[row as usize * self.samples + col as usize];
        (value != SRTM_VOID).then_some(value as f64)
    }
}

/// Tile name covering a point, e.g. `N43E001`.
pub fn tile_name(latitude: f64, longitude: f64) -> String {
    let south = latitude.floor() as i32;
    let west = longitude.floor() as i32;
    format!(
        "{}{:02}{}{:03}",
        if south >= 0 { 'N' } else { 'S' },
        south.abs(),
        if west >= 0 { 'E' } else { 'W' },
        west.abs()
    )
}

/// SRTM tiles read lazily from a directory and kept in memory.
///
/// Only `.hgt` files already present in the directory are used; nothing is
/// downloaded, so populate it beforehand (e.g. unzipped tiles from a SRTM
/// mirror). Tiles that are missing or unreadable are remembered as absent so
/// the directory is probed only once per tile.
pub struct SrtmTiles {
    directory: PathBuf,
    tiles: Mutex<HashMap<String, Option<Arc<HgtTile>>>>,
}

impl SrtmTiles {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            tiles: Mutex::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn tile(&self, name: &str) -> Option<Arc<HgtTile>> {
        let mut tiles = match self.tiles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(cached) = tiles.get(name) {
            return cached.clone();
        }

        let path = self.directory.join(format!("{name}.hgt"));
        let loaded = if path.exists() {
            match HgtTile::load(&path) {
                Ok(tile) => {
                    info!("Loaded SRTM tile {}", path.display());
                    Some(Arc::new(tile))
                }
                Err(e) => {
                    warn!("Ignoring SRTM tile: {e}");
                    None
                }
            }
        } else {
            debug!("No SRTM tile {}", path.display());
            None
        };
        tiles.insert(name.to_string(), loaded.clone());
        loaded
    }
}

impl ElevationProvider for SrtmTiles {
    fn elevation(&self, latitude: f64, longitude: f64) -> Option<f64> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        let tile = self.tile(&tile_name(latitude, longitude))?;
        tile.sample(latitude, longitude, latitude.floor(), longitude.floor())
    }
}
