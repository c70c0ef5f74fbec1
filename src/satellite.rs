use anyhow::Result;
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use sgp4::{Constants, Elements, MinutesSinceEpoch};

use crate::geo::LookAngle;
use crate::observer::ObserverState;
use crate::pass_prediction::{calculate_gmst, calculate_look_angles};

/// Source of satellite look angles for an observer at a given instant.
pub trait LookAngleProvider {
    fn look_angle(&self, observer: &ObserverState, time: DateTime<Utc>) -> Result<LookAngle>;
}

#[derive(Clone)]
pub struct Satellite {
    pub name: String,
    pub prn: String,
    pub elements: Elements,
}

impl Satellite {
    pub fn new(name: String, elements: Elements) -> Self {
        let prn = prn_id(&name);
        Self {
            name,
            prn,
            elements,
        }
    }

    /// TEME position in kilometers at `time`.
    pub fn position_km(&self, time: DateTime<Utc>) -> Result<Vector3<f64>> {
        let constants = Constants::from_elements(&self.elements)?;
        let minutes_since_epoch = time
            .naive_utc()
            .signed_duration_since(self.elements.datetime)
            .num_milliseconds() as f64
            / 60000.0;

        let prediction = constants.propagate(MinutesSinceEpoch(minutes_since_epoch))?;

        Ok(Vector3::new(
            prediction.position[0],
            prediction.position[1],
            prediction.position[2],
        ))
    }
}

impl LookAngleProvider for Satellite {
    fn look_angle(&self, observer: &ObserverState, time: DateTime<Utc>) -> Result<LookAngle> {
        // Convert to meters for calculations
        let sat_pos = self.position_km(time)? * 1000.0;

        Ok(calculate_look_angles(
            &sat_pos,
            &observer.to_ecef(),
            calculate_gmst(time),
            observer.latitude(),
            observer.longitude(),
        ))
    }
}

/// `PRN nn` tag from a catalog name such as `GPS BIIR-2  (PRN 13)`, or the
/// trimmed name when there is none.
pub fn prn_id(name: &str) -> String {
    match name.find("PRN ") {
        Some(start) => name[start..]
            .chars()
            .take(6)
            .collect::<String>()
            .trim_end_matches(')')
            .trim()
            .to_string(),
        None => name.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // GPS BIIR-2 (PRN 13), epoch 2021-07-06 12:00 UTC
    const NAME: &str = "GPS BIIR-2  (PRN 13)";
    const LINE1: &str = "1 24876U 97035A   21187.50000000  .00000034  00000-0  00000-0 0  9992";
    const LINE2: &str = "2 24876  55.7058 142.8561 0044429  54.5437 305.9264  2.00562986176154";

    fn satellite() -> Satellite {
        let elements =
            Elements::from_tle(Some(NAME.to_string()), LINE1.as_bytes(), LINE2.as_bytes())
                .unwrap();
        Satellite::new(NAME.to_string(), elements)
    }

    #[test]
    fn test_prn_id() {
        assert_eq!(prn_id(NAME), "PRN 13");
        assert_eq!(prn_id("GPS BIII-1  (PRN 04)"), "PRN 04");
        assert_eq!(prn_id("NAVSTAR 80 (USA 309)"), "NAVSTAR 80 (USA 309)");
        assert_eq!(prn_id("  GALILEO 1 "), "GALILEO 1");
    }

    #[test]
    fn test_gps_orbit_radius() {
        let sat = satellite();
        let time = Utc.with_ymd_and_hms(2021, 7, 7, 15, 45, 0).unwrap();
        let radius = sat.position_km(time).unwrap().norm();
        // semi-synchronous orbit, a ≈ 26560 km, e ≈ 0.004
        assert!((26_400.0..26_700.0).contains(&radius), "radius {radius}");
    }

    #[test]
    fn test_look_angle_ranges() {
        let sat = satellite();
        let observer = ObserverState::new("Toulouse".into(), 43.5585024, 1.4712832, 151.0).unwrap();
        let time = Utc.with_ymd_and_hms(2021, 7, 7, 15, 45, 0).unwrap();
        let look = sat.look_angle(&observer, time).unwrap();
        assert!((-90.0..=90.0).contains(&look.elevation));
        assert!((0.0..360.0).contains(&look.azimuth));
        // between the zenith distance and the antipodal side of a GPS orbit
        assert!((19_000.0..34_000.0).contains(&look.slant_range_km));
    }
}
