//! Specular point localization.
//!
//! The reflection point is found by marching from the observer along the
//! satellite azimuth for `(observer altitude - terrain) / tan(elevation)`
//! meters, then refreshing the terrain height at the candidate and repeating.
//! The loop runs a fixed number of passes; an optional tolerance stops it
//! early once two successive candidates are close enough.

use log::debug;

use crate::elevation::ElevationProvider;
use crate::error::{check_elevation, DomainError, DomainResult};
use crate::geo::{GeoPoint, LookAngle};
use crate::geodesy::Geodesic;
use crate::observer::ObserverState;

pub const DEFAULT_ITERATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub iterations: usize,
    /// Stop as soon as successive candidates are closer than this (meters).
    pub tolerance_m: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            tolerance_m: None,
        }
    }
}

/// How the solver loop ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub iterations: usize,
    /// Distance between the last two candidates, `None` after a single pass.
    pub last_step_m: Option<f64>,
    /// Whether the requested tolerance was met; `None` when none was set.
    pub converged: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecularResult {
    pub point: GeoPoint,
    pub terrain_elevation_m: f64,
    pub diagnostics: Diagnostics,
}

pub struct SpecularSolver<'a> {
    geodesic: &'a dyn Geodesic,
    terrain: &'a dyn ElevationProvider,
    config: SolverConfig,
}

impl<'a> SpecularSolver<'a> {
    pub fn new(
        geodesic: &'a dyn Geodesic,
        terrain: &'a dyn ElevationProvider,
        config: SolverConfig,
    ) -> Self {
        Self {
            geodesic,
            terrain,
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve_for(
        &self,
        observer: &ObserverState,
        look: &LookAngle,
    ) -> DomainResult<SpecularResult> {
        self.solve(
            observer.latitude(),
            observer.longitude(),
            observer.altitude,
            look.elevation,
            look.azimuth,
        )
    }

    pub fn solve(
        &self,
        observer_lat: f64,
        observer_lon: f64,
        observer_alt: f64,
        elevation_deg: f64,
        azimuth_deg: f64,
    ) -> DomainResult<SpecularResult> {
        check_elevation(elevation_deg)?;
        if self.config.iterations == 0 {
            return Err(DomainError::InvalidCoordinate(
                "solver needs at least one iteration".to_string(),
            ));
        }
        let observer = GeoPoint::checked(observer_lat, observer_lon)?;
        if !observer_alt.is_finite() || !azimuth_deg.is_finite() {
            return Err(DomainError::InvalidCoordinate(format!(
                "altitude {observer_alt} m / azimuth {azimuth_deg}° must be finite"
            )));
        }

        let tan_elevation = elevation_deg.to_radians().tan();
        let mut terrain = 0.0;
        let mut candidate = observer;
        let mut previous: Option<GeoPoint> = None;
        let mut last_step_m = None;
        let mut iterations = 0;

        while iterations < self.config.iterations {
            let distance = (observer_alt - terrain) / tan_elevation;
            candidate = self.geodesic.forward(observer, azimuth_deg, distance)?;
            terrain = match self.terrain.elevation(candidate.latitude, candidate.longitude) {
                Some(height) if height.is_finite() => height,
                _ => {
                    debug!(
                        "No terrain at ({:.6}, {:.6}), using sea level",
                        candidate.latitude, candidate.longitude
                    );
                    0.0
                }
            };
            iterations += 1;

            if let Some(prev) = previous {
                // the step is diagnostic only; a failed inverse never fails the solve
                last_step_m = match self.geodesic.inverse(prev, candidate) {
                    Ok(step) => Some(step.distance_m),
                    Err(e) => {
                        debug!("No step length after iteration {iterations}: {e}");
                        None
                    }
                };
            }
            debug!(
                "Specular iteration {}: distance {:.3} m -> ({:.8}, {:.8}), terrain {:.1} m",
                iterations, distance, candidate.latitude, candidate.longitude, terrain
            );

            if let (Some(tolerance), Some(step)) = (self.config.tolerance_m, last_step_m) {
                if step <= tolerance {
                    break;
                }
            }
            previous = Some(candidate);
        }

        let converged = self
            .config
            .tolerance_m
            .map(|tolerance| last_step_m.is_some_and(|step| step <= tolerance));

        Ok(SpecularResult {
            point: candidate,
            terrain_elevation_m: terrain,
            diagnostics: Diagnostics {
                iterations,
                last_step_m,
                converged,
            },
        })
    }
}

/// One-shot solve with explicit collaborators.
#[allow(clippy::too_many_arguments)]
pub fn solve_specular_point(
    geodesic: &dyn Geodesic,
    terrain: &dyn ElevationProvider,
    config: &SolverConfig,
    observer_lat: f64,
    observer_lon: f64,
    observer_alt: f64,
    elevation_deg: f64,
    azimuth_deg: f64,
) -> DomainResult<SpecularResult> {
    SpecularSolver::new(geodesic, terrain, *config).solve(
        observer_lat,
        observer_lon,
        observer_alt,
        elevation_deg,
        azimuth_deg,
    )
}
