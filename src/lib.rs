//! GNSS-R specular point and footprint estimation for a ground receiver.
//!
//! Given a receiver position and a satellite's elevation/azimuth, the
//! [`specular`] solver locates the ground point where the signal reflects
//! towards the receiver, and [`footprint`] turns the receiver clearance,
//! elevation and wavelength into the reflection ellipse on the ground.
//! The remaining modules are collaborators: ellipsoidal geodesy, terrain
//! lookup, SGP4 look angles, the TLE catalog, batch orchestration and export.

pub mod batch;
pub mod config;
pub mod elevation;
pub mod error;
pub mod export;
pub mod footprint;
pub mod geo;
pub mod geodesy;
pub mod observer;
pub mod pass_prediction;
pub mod radio;
pub mod satellite;
pub mod specular;
pub mod tle;

pub use error::{DomainError, DomainResult};
pub use footprint::{synthesize_footprint, FootprintPolygon, FootprintSynthesizer};
pub use geo::{GeoPoint, LookAngle};
pub use geodesy::{Geodesic, Vincenty};
pub use observer::ObserverState;
pub use specular::{solve_specular_point, SolverConfig, SpecularResult, SpecularSolver};
