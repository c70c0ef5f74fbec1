//! Reflection footprint ellipse around a specular point.
//!
//! The semi-minor axis follows a first-Fresnel-zone style model:
//!
//! ```text
//! b = sqrt(λ·h / sin(e) + (λ / (2·sin(e)))²)
//! a = b / sin(e)
//! ```
//!
//! with `h` the receiver clearance above the reflecting surface and `e` the
//! satellite elevation. The ellipse is traced in a local metric frame with the
//! major axis along the satellite azimuth, then converted to degree offsets
//! using the length of one degree of latitude and longitude at the specular
//! point. That planar approximation holds for footprints of a few kilometers
//! away from the poles.
//!
//! Vertices are emitted clockwise in a north-up (longitude, latitude) plane for
//! every azimuth and elevation: the rotation is proper and both scale factors
//! are positive, so the orientation of the unit trace is preserved. Longitudes
//! are not wrapped, so a ring straddling the antimeridian stays continuous.

use crate::error::{check_elevation, DomainError, DomainResult};
use crate::geo::GeoPoint;
use crate::geodesy::Geodesic;

pub const DEFAULT_VERTICES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseAxes {
    pub semi_major_m: f64,
    pub semi_minor_m: f64,
}

impl EllipseAxes {
    /// Major over minor axis; equals `1 / sin(elevation)`.
    pub fn elongation(&self) -> f64 {
        self.semi_major_m / self.semi_minor_m
    }
}

/// Axis lengths for a receiver `clearance_m` above the surface. Negative
/// clearances are clipped to zero.
pub fn ellipse_axes(
    clearance_m: f64,
    elevation_deg: f64,
    wavelength_m: f64,
) -> DomainResult<EllipseAxes> {
    check_elevation(elevation_deg)?;
    if !wavelength_m.is_finite() || wavelength_m <= 0.0 {
        return Err(DomainError::WavelengthNotPositive(wavelength_m));
    }
    if !clearance_m.is_finite() {
        return Err(DomainError::InvalidCoordinate(format!(
            "clearance height {clearance_m} m is not finite"
        )));
    }

    let height = clearance_m.max(0.0);
    let sin_e = elevation_deg.to_radians().sin();
    let semi_minor_m =
        (wavelength_m * height / sin_e + (wavelength_m / 2.0 / sin_e).powi(2)).sqrt();

    Ok(EllipseAxes {
        semi_major_m: semi_minor_m / sin_e,
        semi_minor_m,
    })
}

/// Length of one degree along each axis at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeScale {
    pub meters_per_degree_lat: f64,
    pub meters_per_degree_lon: f64,
}

pub fn degree_scale(geodesic: &dyn Geodesic, at: GeoPoint) -> DomainResult<DegreeScale> {
    // within a degree of the north pole, measure southwards instead
    let lat_offset = if at.latitude + 1.0 > 90.0 { -1.0 } else { 1.0 };
    let along_lat = geodesic.inverse(at, GeoPoint::new(at.latitude + lat_offset, at.longitude))?;
    let along_lon = geodesic.inverse(at, GeoPoint::new(at.latitude, at.longitude + 1.0))?;

    if along_lon.distance_m <= 0.0 {
        return Err(DomainError::InvalidCoordinate(format!(
            "longitude scale vanishes at latitude {}°",
            at.latitude
        )));
    }
    Ok(DegreeScale {
        meters_per_degree_lat: along_lat.distance_m,
        meters_per_degree_lon: along_lon.distance_m,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Closed ring of vertices; the last vertex repeats the first.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintPolygon {
    pub center: GeoPoint,
    pub axes: EllipseAxes,
    pub vertices: Vec<GeoPoint>,
}

impl FootprintPolygon {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }

    /// Shoelace area in square degrees, positive when counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|w| w[0].longitude * w[1].latitude - w[1].longitude * w[0].latitude)
            .sum::<f64>()
            / 2.0
    }

    pub fn winding(&self) -> Winding {
        if self.signed_area() < 0.0 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }

    /// Vertices as `[lon, lat]` positions in the requested orientation.
    pub fn ring(&self, winding: Winding) -> Vec<[f64; 2]> {
        let mut ring: Vec<[f64; 2]> = self.vertices.iter().map(GeoPoint::lon_lat).collect();
        if self.winding() != winding {
            ring.reverse();
        }
        ring
    }
}

pub struct FootprintSynthesizer<'a> {
    geodesic: &'a dyn Geodesic,
}

impl<'a> FootprintSynthesizer<'a> {
    pub fn new(geodesic: &'a dyn Geodesic) -> Self {
        Self { geodesic }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn synthesize(
        &self,
        specular_lat: f64,
        specular_lon: f64,
        clearance_m: f64,
        elevation_deg: f64,
        azimuth_deg: f64,
        wavelength_m: f64,
        vertex_count: usize,
    ) -> DomainResult<FootprintPolygon> {
        let axes = ellipse_axes(clearance_m, elevation_deg, wavelength_m)?;
        if vertex_count == 0 {
            return Err(DomainError::NoVertices);
        }
        if !azimuth_deg.is_finite() {
            return Err(DomainError::InvalidCoordinate(format!(
                "azimuth {azimuth_deg}° is not finite"
            )));
        }
        let center = GeoPoint::checked(specular_lat, specular_lon)?;
        let scale = degree_scale(self.geodesic, center)?;

        let (sin_rot, cos_rot) = (-azimuth_deg).to_radians().sin_cos();
        let step = 360.0 / vertex_count as f64;

        let mut vertices: Vec<GeoPoint> = (0..vertex_count)
            .map(|i| {
                let (sin_t, cos_t) = (i as f64 * step).to_radians().sin_cos();
                let x = axes.semi_minor_m * sin_t;
                let y = axes.semi_major_m * cos_t;
                let east = x * cos_rot - y * sin_rot;
                let north = y * cos_rot + x * sin_rot;
                GeoPoint::new(
                    center.latitude + north / scale.meters_per_degree_lat,
                    center.longitude + east / scale.meters_per_degree_lon,
                )
            })
            .collect();
        // the 360° sample closes the ring on the 0° one
        vertices.push(vertices[0]);

        Ok(FootprintPolygon {
            center,
            axes,
            vertices,
        })
    }
}

/// One-shot synthesis with an explicit geodesic provider.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_footprint(
    geodesic: &dyn Geodesic,
    specular_lat: f64,
    specular_lon: f64,
    clearance_m: f64,
    elevation_deg: f64,
    azimuth_deg: f64,
    wavelength_m: f64,
    vertex_count: usize,
) -> DomainResult<FootprintPolygon> {
    FootprintSynthesizer::new(geodesic).synthesize(
        specular_lat,
        specular_lon,
        clearance_m,
        elevation_deg,
        azimuth_deg,
        wavelength_m,
        vertex_count,
    )
}
