//! Ellipsoidal forward and inverse geodesic problems.
//!
//! The solver and the footprint synthesizer only need two primitives: the
//! destination reached from a start point along an initial azimuth for a
//! given distance, and the azimuth/distance between two points. Both are
//! exposed through the [`Geodesic`] trait so callers can inject another
//! implementation; [`Vincenty`] on WGS84 is the default.
//!
//! Vincenty's iterations are accurate to well under a millimeter for the
//! short lines used here. The inverse problem fails to converge for nearly
//! antipodal points, which is reported as [`GeodesicError::NoConvergence`].

use thiserror::Error;

use crate::geo::{normalize_azimuth, normalize_longitude, GeoPoint};

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum GeodesicError {
    #[error("latitude {0}° outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("non-finite input to geodesic problem")]
    NonFinite,

    #[error("inverse problem did not converge (nearly antipodal points)")]
    NoConvergence,
}

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub semi_major_axis: f64, // meters
    pub flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: 6378137.0,
        flattening: 1.0 / 298.257223563,
    };

    pub fn semi_minor_axis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.flattening)
    }

    // reduced latitude as (sin U, cos U)
    fn reduced_latitude(&self, latitude_rad: f64) -> (f64, f64) {
        let tan_u = (1.0 - self.flattening) * latitude_rad.tan();
        let cos_u = 1.0 / (1.0 + tan_u * tan_u).sqrt();
        (tan_u * cos_u, cos_u)
    }

    // Vincenty's A and B series in u²
    fn series(&self, cos_sq_alpha: f64) -> (f64, f64) {
        let a = self.semi_major_axis;
        let b = self.semi_minor_axis();
        let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
        let big_a =
            1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        (big_a, big_b)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Ellipsoid::WGS84
    }
}

/// Solution of the inverse problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseSolution {
    pub azimuth: f64,    // degrees at the first point, [0, 360)
    pub distance_m: f64, // meters
}

pub trait Geodesic: Send + Sync {
    /// Destination reached from `start` along `azimuth_deg` after `distance_m`.
    /// Negative distances walk backwards along the same geodesic.
    fn forward(
        &self,
        start: GeoPoint,
        azimuth_deg: f64,
        distance_m: f64,
    ) -> Result<GeoPoint, GeodesicError>;

    fn inverse(&self, from: GeoPoint, to: GeoPoint) -> Result<InverseSolution, GeodesicError>;
}

/// Vincenty's direct and inverse formulae.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vincenty {
    pub ellipsoid: Ellipsoid,
}

impl Vincenty {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }

    pub fn wgs84() -> Self {
        Self::new(Ellipsoid::WGS84)
    }
}

fn check_point(point: &GeoPoint) -> Result<(), GeodesicError> {
    if !point.latitude.is_finite() || !point.longitude.is_finite() {
        return Err(GeodesicError::NonFinite);
    }
    if !(-90.0..=90.0).contains(&point.latitude) {
        return Err(GeodesicError::LatitudeOutOfRange(point.latitude));
    }
    Ok(())
}

fn delta_sigma(big_b: f64, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
    let c2 = cos_2sigma_m * cos_2sigma_m;
    big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * c2)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * c2)))
}

struct AuxiliarySphere {
    sin_sigma: f64,
    cos_sigma: f64,
    sigma: f64,
    sin_alpha: f64,
    cos_sq_alpha: f64,
    cos_2sigma_m: f64,
}

fn auxiliary_sphere(
    lambda: f64,
    sin_u1: f64,
    cos_u1: f64,
    sin_u2: f64,
    cos_u2: f64,
) -> AuxiliarySphere {
    let (sin_lambda, cos_lambda) = lambda.sin_cos();
    let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
        + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
    .sqrt();
    let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
    let sin_alpha = if sin_sigma == 0.0 {
        0.0
    } else {
        cos_u1 * cos_u2 * sin_lambda / sin_sigma
    };
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    // equatorial line: cos²α = 0
    let cos_2sigma_m = if cos_sq_alpha != 0.0 {
        cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
    } else {
        0.0
    };
    AuxiliarySphere {
        sin_sigma,
        cos_sigma,
        sigma: sin_sigma.atan2(cos_sigma),
        sin_alpha,
        cos_sq_alpha,
        cos_2sigma_m,
    }
}

impl Geodesic for Vincenty {
    fn forward(
        &self,
        start: GeoPoint,
        azimuth_deg: f64,
        distance_m: f64,
    ) -> Result<GeoPoint, GeodesicError> {
        check_point(&start)?;
        if !azimuth_deg.is_finite() || !distance_m.is_finite() {
            return Err(GeodesicError::NonFinite);
        }
        if distance_m == 0.0 {
            return Ok(GeoPoint::new(start.latitude, normalize_longitude(start.longitude)));
        }
        let (azimuth_deg, distance_m) = if distance_m < 0.0 {
            (azimuth_deg + 180.0, -distance_m)
        } else {
            (azimuth_deg, distance_m)
        };

        let f = self.ellipsoid.flattening;
        let b = self.ellipsoid.semi_minor_axis();

        let (sin_alpha1, cos_alpha1) = azimuth_deg.to_radians().sin_cos();
        let (sin_u1, cos_u1) = self.ellipsoid.reduced_latitude(start.latitude.to_radians());
        let sigma1 = (sin_u1 / cos_u1).atan2(cos_alpha1);

        let sin_alpha = cos_u1 * sin_alpha1;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let (big_a, big_b) = self.ellipsoid.series(cos_sq_alpha);

        let sigma0 = distance_m / (b * big_a);
        let mut sigma = sigma0;
        for _ in 0..MAX_ITERATIONS {
            let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
            let next = sigma0 + delta_sigma(big_b, sigma.sin(), sigma.cos(), cos_2sigma_m);
            let done = (next - sigma).abs() <= CONVERGENCE;
            sigma = next;
            if done {
                break;
            }
        }

        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();

        let x = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
        let latitude = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
            .atan2((1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt());
        let lambda =
            (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let l = lambda
            - (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        Ok(GeoPoint::new(
            latitude.to_degrees(),
            normalize_longitude(start.longitude + l.to_degrees()),
        ))
    }

    fn inverse(&self, from: GeoPoint, to: GeoPoint) -> Result<InverseSolution, GeodesicError> {
        check_point(&from)?;
        check_point(&to)?;

        let f = self.ellipsoid.flattening;
        let b = self.ellipsoid.semi_minor_axis();

        let l = normalize_longitude(to.longitude - from.longitude).to_radians();
        let (sin_u1, cos_u1) = self.ellipsoid.reduced_latitude(from.latitude.to_radians());
        let (sin_u2, cos_u2) = self.ellipsoid.reduced_latitude(to.latitude.to_radians());

        let mut lambda = l;
        let mut converged = false;
        for _ in 0..MAX_ITERATIONS {
            let aux = auxiliary_sphere(lambda, sin_u1, cos_u1, sin_u2, cos_u2);
            if aux.sin_sigma == 0.0 {
                // coincident points
                return Ok(InverseSolution {
                    azimuth: 0.0,
                    distance_m: 0.0,
                });
            }
            let c = f / 16.0 * aux.cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * aux.cos_sq_alpha));
            let next = l
                + (1.0 - c)
                    * f
                    * aux.sin_alpha
                    * (aux.sigma
                        + c * aux.sin_sigma
                            * (aux.cos_2sigma_m
                                + c * aux.cos_sigma
                                    * (-1.0 + 2.0 * aux.cos_2sigma_m * aux.cos_2sigma_m)));
            let done = (next - lambda).abs() <= CONVERGENCE;
            lambda = next;
            if done {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(GeodesicError::NoConvergence);
        }

        let aux = auxiliary_sphere(lambda, sin_u1, cos_u1, sin_u2, cos_u2);
        if aux.sin_sigma == 0.0 {
            return Ok(InverseSolution {
                azimuth: 0.0,
                distance_m: 0.0,
            });
        }
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let (big_a, big_b) = self.ellipsoid.series(aux.cos_sq_alpha);
        let distance_m = b
            * big_a
            * (aux.sigma - delta_sigma(big_b, aux.sin_sigma, aux.cos_sigma, aux.cos_2sigma_m));
        let azimuth = (cos_u2 * sin_lambda)
            .atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda)
            .to_degrees();

        Ok(InverseSolution {
            azimuth: normalize_azimuth(azimuth),
            distance_m,
        })
    }
}
