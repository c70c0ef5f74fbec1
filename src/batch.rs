//! Batch orchestration: look angles, specular points and footprints for
//! every satellite in the catalog at one observation time.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::config::Config;
use crate::elevation::ElevationProvider;
use crate::error::DomainResult;
use crate::footprint::{FootprintPolygon, FootprintSynthesizer};
use crate::geo::LookAngle;
use crate::geodesy::Geodesic;
use crate::observer::ObserverState;
use crate::pass_prediction::{find_events, VisibilityEvents};
use crate::satellite::{LookAngleProvider, Satellite};
use crate::specular::{SpecularResult, SpecularSolver};

/// Specular point and footprint of one satellite; both or neither.
#[derive(Debug, Clone)]
pub struct Reflection {
    pub specular: SpecularResult,
    pub footprint: FootprintPolygon,
}

#[derive(Debug, Clone)]
pub struct Observation {
    pub prn_id: String,
    pub time: DateTime<Utc>,
    pub look: LookAngle,
    pub events: VisibilityEvents,
    pub reflection: Option<Reflection>,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    observer: &'a ObserverState,
    solver: SpecularSolver<'a>,
    synthesizer: FootprintSynthesizer<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        observer: &'a ObserverState,
        geodesic: &'a dyn Geodesic,
        terrain: &'a dyn ElevationProvider,
    ) -> Self {
        Self {
            config,
            observer,
            solver: SpecularSolver::new(geodesic, terrain, config.specular.solver_config()),
            synthesizer: FootprintSynthesizer::new(geodesic),
        }
    }

    /// Look angle and events for one satellite, plus its reflection when it
    /// is above the elevation filter.
    pub fn observe(
        &self,
        prn_id: &str,
        provider: &dyn LookAngleProvider,
        time: DateTime<Utc>,
    ) -> Result<Observation> {
        let look = provider.look_angle(self.observer, time)?;
        let events = find_events(provider, self.observer, time, &self.config.prediction)?;

        let reflection = if look.elevation >= self.config.prediction.min_elevation {
            match self.reflect(&look) {
                Ok(reflection) => Some(reflection),
                Err(e) => {
                    warn!("{prn_id}: no reflection computed: {e}");
                    None
                }
            }
        } else {
            debug!(
                "{prn_id}: elevation {:.2}° below the {:.1}° filter",
                look.elevation, self.config.prediction.min_elevation
            );
            None
        };

        Ok(Observation {
            prn_id: prn_id.to_string(),
            time,
            look,
            events,
            reflection,
        })
    }

    pub fn reflect(&self, look: &LookAngle) -> DomainResult<Reflection> {
        let specular = self.solver.solve_for(self.observer, look)?;
        let clearance = self.observer.altitude - specular.terrain_elevation_m;
        let footprint = self.synthesizer.synthesize(
            specular.point.latitude,
            specular.point.longitude,
            clearance,
            look.elevation,
            look.azimuth,
            self.config.specular.wavelength_m(),
            self.config.specular.vertices,
        )?;
        Ok(Reflection {
            specular,
            footprint,
        })
    }

    /// Observes every satellite, skipping those whose propagation fails.
    /// Rows are sorted by PRN.
    pub fn run(&self, satellites: &[Satellite], time: DateTime<Utc>) -> Vec<Observation> {
        let mut observations: Vec<Observation> = satellites
            .iter()
            .filter_map(|sat| match self.observe(&sat.prn, sat, time) {
                Ok(observation) => Some(observation),
                Err(e) => {
                    warn!("{}: skipped: {e:#}", sat.name);
                    None
                }
            })
            .collect();
        observations.sort_by(|a, b| a.prn_id.cmp(&b.prn_id));

        let reflected = observations
            .iter()
            .filter(|o| o.reflection.is_some())
            .count();
        info!(
            "Observed {} satellites at {}, {} with a specular point",
            observations.len(),
            time.format("%Y-%m-%dT%H:%M:%S"),
            reflected
        );
        observations
    }
}
