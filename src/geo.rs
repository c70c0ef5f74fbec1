use serde::Serialize;

use crate::error::{DomainError, DomainResult};

/// A position on the WGS84 ellipsoid in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,  // degrees
    pub longitude: f64, // degrees
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point after checking latitude bounds; longitude is wrapped
    /// into [-180, 180).
    pub fn checked(latitude: f64, longitude: f64) -> DomainResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidCoordinate(format!(
                "latitude {latitude}° outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() {
            return Err(DomainError::InvalidCoordinate(format!(
                "longitude {longitude}° is not finite"
            )));
        }
        Ok(Self::new(latitude, normalize_longitude(longitude)))
    }

    /// GeoJSON position order.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Elevation, azimuth and slant range of a satellite as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngle {
    pub elevation: f64,      // degrees
    pub azimuth: f64,        // degrees, clockwise from north
    pub slant_range_km: f64, // kilometers
}

impl LookAngle {
    pub fn is_visible(&self) -> bool {
        self.elevation > 0.0
    }
}

pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub fn normalize_azimuth(azimuth: f64) -> f64 {
    let wrapped = azimuth.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_longitude() {
        assert_abs_diff_eq!(normalize_longitude(0.0), 0.0);
        assert_abs_diff_eq!(normalize_longitude(181.0), -179.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_longitude(-181.0), 179.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_longitude(180.0), -180.0);
        assert_abs_diff_eq!(normalize_longitude(540.5), -179.5, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_azimuth() {
        assert_abs_diff_eq!(normalize_azimuth(-90.0), 270.0);
        assert_abs_diff_eq!(normalize_azimuth(720.0), 0.0);
        assert_abs_diff_eq!(normalize_azimuth(142.5), 142.5);
    }

    #[test]
    fn test_checked_point() {
        assert!(GeoPoint::checked(91.0, 0.0).is_err());
        assert!(GeoPoint::checked(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::checked(0.0, f64::INFINITY).is_err());

        let p = GeoPoint::checked(45.0, 190.0).unwrap();
        assert_abs_diff_eq!(p.longitude, -170.0, epsilon = 1e-12);
        assert_eq!(p.lon_lat(), [p.longitude, 45.0]);
    }
}
