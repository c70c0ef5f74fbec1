use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;

use crate::config::PredictionConfig;
use crate::geo::LookAngle;
use crate::observer::ObserverState;
use crate::satellite::LookAngleProvider;

/// First occurrence of each visibility event inside the search window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisibilityEvents {
    pub rise: Option<DateTime<Utc>>,        // elevation crosses above the filter
    pub culmination: Option<DateTime<Utc>>, // local maximum above the filter
    pub set: Option<DateTime<Utc>>,         // elevation drops below the filter
}

impl VisibilityEvents {
    fn complete(&self) -> bool {
        self.rise.is_some() && self.culmination.is_some() && self.set.is_some()
    }
}

pub fn calculate_look_angles(
    sat_pos_eci: &Vector3<f64>,
    observer_ecef: &Vector3<f64>,
    gmst: f64,
    observer_lat: f64,
    observer_lon: f64,
) -> LookAngle {
    // Convert satellite ECI to ECEF
    let sat_ecef = eci_to_ecef(sat_pos_eci, gmst);

    // Range vector from observer to satellite
    let range_vec = sat_ecef - observer_ecef;
    let range_m = range_vec.norm();

    // Convert to topocentric (SEZ) coordinates
    let lat_rad = observer_lat.to_radians();
    let lon_rad = observer_lon.to_radians();

    let south = range_vec.x * lat_rad.sin() * lon_rad.cos()
        + range_vec.y * lat_rad.sin() * lon_rad.sin()
        - range_vec.z * lat_rad.cos();

    let east = -range_vec.x * lon_rad.sin() + range_vec.y * lon_rad.cos();

    let zenith = range_vec.x * lat_rad.cos() * lon_rad.cos()
        + range_vec.y * lat_rad.cos() * lon_rad.sin()
        + range_vec.z * lat_rad.sin();

    let azimuth = east.atan2(-south).to_degrees();
    let azimuth = if azimuth < 0.0 {
        azimuth + 360.0
    } else {
        azimuth
    };

    let elevation = (zenith / range_m).asin().to_degrees();

    LookAngle {
        elevation,
        azimuth,
        slant_range_km: range_m / 1000.0,
    }
}

pub(crate) fn eci_to_ecef(eci: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();

    Vector3::new(
        eci.x * cos_gmst + eci.y * sin_gmst,
        -eci.x * sin_gmst + eci.y * cos_gmst,
        eci.z,
    )
}

// 2000-01-01T12:00:00Z as Unix milliseconds
const J2000_UNIX_MS: i64 = 946_728_000_000;

// Durations beyond this are rejected before they reach chrono arithmetic
const MAX_SPAN_MS: f64 = (i64::MAX / 4) as f64;

/// Greenwich mean sidereal time in radians.
pub fn calculate_gmst(time: DateTime<Utc>) -> f64 {
    let jd_epoch = (time.timestamp_millis() - J2000_UNIX_MS) as f64 / 86_400_000.0;

    let gmst_hours = (18.697374558 + 24.06570982441908 * jd_epoch).rem_euclid(24.0);

    (gmst_hours * 15.0).to_radians()
}

/// Scans the look angle at `time_step` intervals over `search_hours` and
/// records the first rise, culmination and set relative to `min_elevation`.
pub fn find_events(
    provider: &dyn LookAngleProvider,
    observer: &ObserverState,
    start: DateTime<Utc>,
    config: &PredictionConfig,
) -> Result<VisibilityEvents> {
    let mut events = VisibilityEvents::default();
    let step = span_ms(config.time_step * 1000.0)?;
    let end = start
        .checked_add_signed(span_ms(config.search_hours * 3_600_000.0)?)
        .ok_or_else(|| anyhow!("search window of {} h overflows", config.search_hours))?;
    if step <= Duration::zero() {
        return Ok(events);
    }

    let threshold = config.min_elevation;
    let mut before_previous: Option<f64> = None;
    let mut previous = provider.look_angle(observer, start)?.elevation;
    let Some(mut current_time) = start.checked_add_signed(step) else {
        return Ok(events);
    };

    while current_time <= end && !events.complete() {
        let elevation = provider.look_angle(observer, current_time)?.elevation;

        if previous < threshold && elevation >= threshold && events.rise.is_none() {
            events.rise = Some(current_time);
        }
        if previous >= threshold && elevation < threshold && events.set.is_none() {
            events.set = Some(current_time);
        }
        if let Some(earlier) = before_previous {
            if events.culmination.is_none()
                && previous >= threshold
                && previous >= earlier
                && previous > elevation
            {
                events.culmination = Some(current_time - step);
            }
        }

        before_previous = Some(previous);
        previous = elevation;
        current_time = match current_time.checked_add_signed(step) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(events)
}

fn span_ms(milliseconds: f64) -> Result<Duration> {
    if !milliseconds.is_finite() || milliseconds.abs() > MAX_SPAN_MS {
        bail!("prediction span of {milliseconds} ms is out of range");
    }
    Ok(Duration::milliseconds(milliseconds as i64))
}
