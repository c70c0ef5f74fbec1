use nalgebra::Vector3;

use crate::error::DomainResult;
use crate::geo::GeoPoint;
use crate::geodesy::Ellipsoid;

/// Receiver on the ground. Never mutated during a computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverState {
    pub name: String,
    pub position: GeoPoint,
    pub altitude: f64, // meters above mean sea level
}

impl ObserverState {
    pub fn new(name: String, lat: f64, lon: f64, alt: f64) -> DomainResult<Self> {
        Ok(Self {
            name,
            position: GeoPoint::checked(lat, lon)?,
            altitude: alt,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.position.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.position.longitude
    }

    // Convert observer location to ECEF coordinates (meters)
    pub fn to_ecef(&self) -> Vector3<f64> {
        let lat_rad = self.latitude().to_radians();
        let lon_rad = self.longitude().to_radians();

        let ellipsoid = Ellipsoid::WGS84;
        let a = ellipsoid.semi_major_axis;
        let f = ellipsoid.flattening;
        let e2 = f * (2.0 - f); // eccentricity squared

        let n = a / (1.0 - e2 * lat_rad.sin().powi(2)).sqrt();

        let x = (n + self.altitude) * lat_rad.cos() * lon_rad.cos();
        let y = (n + self.altitude) * lat_rad.cos() * lon_rad.sin();
        let z = (n * (1.0 - e2) + self.altitude) * lat_rad.sin();

        Vector3::new(x, y, z)
    }
}
