use thiserror::Error;

use crate::geodesy::GeodesicError;

/// Invalid geometric input to the solver or the footprint synthesizer.
///
/// These are never corrected silently: the (observer, satellite, time)
/// triple that produced one is abandoned by the caller.
#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("satellite elevation must be above the horizon, got {0}°")]
    ElevationNotPositive(f64),

    #[error("signal wavelength must be positive, got {0} m")]
    WavelengthNotPositive(f64),

    #[error("footprint needs at least one vertex")]
    NoVertices,

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("geodesic transform failed: {0}")]
    Geodesic(#[from] GeodesicError),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Elevation must be finite and strictly above the horizon.
pub(crate) fn check_elevation(elevation_deg: f64) -> DomainResult<()> {
    if elevation_deg.is_finite() && elevation_deg > 0.0 && elevation_deg <= 90.0 {
        Ok(())
    } else if elevation_deg > 90.0 {
        Err(DomainError::InvalidCoordinate(format!(
            "elevation {elevation_deg}° is beyond zenith"
        )))
    } else {
        Err(DomainError::ElevationNotPositive(elevation_deg))
    }
}
