use approx::{assert_abs_diff_eq, assert_relative_eq};
use proptest::prelude::*;

use std::fs;
use std::thread;

use specular::elevation::{NoTerrain, SrtmTiles};
use specular::footprint::ellipse_axes;
use specular::geodesy::{GeodesicError, InverseSolution};
use specular::{
    solve_specular_point, synthesize_footprint, DomainError, GeoPoint, Geodesic, SolverConfig,
    SpecularSolver, Vincenty,
};

const OBS_LAT: f64 = 43.5585024;
const OBS_LON: f64 = 1.4712832;
const OBS_ALT: f64 = 151.0;
const ELEVATION: f64 = 31.3671172897884;
const AZIMUTH: f64 = 142.857166594969;
const L1: f64 = 0.19029367279836487;

#[test]
fn test_reference_scenario_golden_values() {
    let geodesic = Vincenty::wgs84();
    let result = solve_specular_point(
        &geodesic,
        &NoTerrain,
        &SolverConfig::default(),
        OBS_LAT,
        OBS_LON,
        OBS_ALT,
        ELEVATION,
        AZIMUTH,
    )
    .unwrap();

    assert_abs_diff_eq!(result.point.latitude, 43.55672523659708, epsilon = 1e-10);
    assert_abs_diff_eq!(result.point.longitude, 1.47313417661212, epsilon = 1e-10);
    assert_eq!(result.terrain_elevation_m, 0.0);
    assert_eq!(result.diagnostics.iterations, 3);

    // the march length is (altitude - terrain) / tan(elevation)
    let back = geodesic
        .inverse(GeoPoint::new(OBS_LAT, OBS_LON), result.point)
        .unwrap();
    assert_relative_eq!(back.distance_m, 247.69726161081127, max_relative = 1e-9);
    assert_abs_diff_eq!(back.azimuth, AZIMUTH, epsilon = 1e-6);

    let footprint = synthesize_footprint(
        &geodesic,
        result.point.latitude,
        result.point.longitude,
        OBS_ALT - result.terrain_elevation_m,
        ELEVATION,
        AZIMUTH,
        L1,
        10,
    )
    .unwrap();
    assert_eq!(footprint.len(), 11);
    assert_relative_eq!(footprint.axes.semi_minor_m, 7.4321328249780025, max_relative = 1e-12);
    assert_relative_eq!(footprint.axes.semi_major_m, 14.27829352487941, max_relative = 1e-12);
}

#[test]
fn test_solver_is_reproducible() {
    let geodesic = Vincenty::wgs84();
    let solve = || {
        solve_specular_point(
            &geodesic,
            &NoTerrain,
            &SolverConfig::default(),
            OBS_LAT,
            OBS_LON,
            OBS_ALT,
            ELEVATION,
            AZIMUTH,
        )
        .unwrap()
    };
    assert_eq!(solve(), solve());
}

#[test]
fn test_overhead_satellite() {
    let geodesic = Vincenty::wgs84();
    let config = SolverConfig {
        iterations: 1,
        tolerance_m: None,
    };
    let result = solve_specular_point(
        &geodesic, &NoTerrain, &config, OBS_LAT, OBS_LON, 5000.0, 90.0, 0.0,
    )
    .unwrap();
    assert_abs_diff_eq!(result.point.latitude, OBS_LAT, epsilon = 1e-12);
    assert_abs_diff_eq!(result.point.longitude, OBS_LON, epsilon = 1e-12);

    let footprint = synthesize_footprint(
        &geodesic, OBS_LAT, OBS_LON, 0.0, 90.0, 0.0, L1, 10,
    )
    .unwrap();
    assert_relative_eq!(footprint.axes.semi_minor_m, L1 / 2.0, max_relative = 1e-12);
    assert_relative_eq!(footprint.axes.semi_major_m, L1 / 2.0, max_relative = 1e-12);
}

#[test]
fn test_horizon_and_below_are_rejected() {
    let geodesic = Vincenty::wgs84();
    for elevation in [0.0, -1.0, -90.0] {
        let solved = solve_specular_point(
            &geodesic,
            &NoTerrain,
            &SolverConfig::default(),
            OBS_LAT,
            OBS_LON,
            OBS_ALT,
            elevation,
            AZIMUTH,
        );
        assert_eq!(solved, Err(DomainError::ElevationNotPositive(elevation)));

        let footprint =
            synthesize_footprint(&geodesic, OBS_LAT, OBS_LON, OBS_ALT, elevation, AZIMUTH, L1, 10);
        assert_eq!(footprint, Err(DomainError::ElevationNotPositive(elevation)));
    }
}

#[test]
fn test_footprint_ring_is_closed() {
    let geodesic = Vincenty::wgs84();
    let footprint =
        synthesize_footprint(&geodesic, OBS_LAT, OBS_LON, OBS_ALT, ELEVATION, AZIMUTH, L1, 10)
            .unwrap();
    let first = footprint.vertices.first().unwrap();
    let last = footprint.vertices.last().unwrap();
    assert_abs_diff_eq!(first.latitude, last.latitude, epsilon = 1e-12);
    assert_abs_diff_eq!(first.longitude, last.longitude, epsilon = 1e-12);
}

/// Geodesic provider that rejects every problem.
struct Unsolvable;

impl Geodesic for Unsolvable {
    fn forward(
        &self,
        _start: GeoPoint,
        _azimuth_deg: f64,
        _distance_m: f64,
    ) -> Result<GeoPoint, GeodesicError> {
        Err(GeodesicError::NoConvergence)
    }

    fn inverse(&self, _from: GeoPoint, _to: GeoPoint) -> Result<InverseSolution, GeodesicError> {
        Err(GeodesicError::NoConvergence)
    }
}

#[test]
fn test_geodesic_failure_surfaces_as_domain_error() {
    let solved = solve_specular_point(
        &Unsolvable,
        &NoTerrain,
        &SolverConfig::default(),
        OBS_LAT,
        OBS_LON,
        OBS_ALT,
        ELEVATION,
        AZIMUTH,
    );
    assert_eq!(solved, Err(DomainError::Geodesic(GeodesicError::NoConvergence)));

    let footprint =
        synthesize_footprint(&Unsolvable, OBS_LAT, OBS_LON, OBS_ALT, ELEVATION, AZIMUTH, L1, 10);
    assert_eq!(footprint, Err(DomainError::Geodesic(GeodesicError::NoConvergence)));
}

#[test]
fn test_concurrent_solves_share_tile_cache() {
    let dir = tempfile::tempdir().unwrap();
    // flat 3x3 tile at 20 m covering the reference scenario
    let tile: Vec<u8> = (0..9).flat_map(|_| 20i16.to_be_bytes()).collect();
    fs::write(dir.path().join("N43E001.hgt"), tile).unwrap();

    let geodesic = Vincenty::wgs84();
    let terrain = SrtmTiles::new(dir.path());
    let solver = SpecularSolver::new(&geodesic, &terrain, SolverConfig::default());

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| solver.solve(OBS_LAT, OBS_LON, OBS_ALT, ELEVATION, AZIMUTH))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
    });

    assert_eq!(results[0].terrain_elevation_m, 20.0);
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
    let back = geodesic
        .inverse(GeoPoint::new(OBS_LAT, OBS_LON), results[0].point)
        .unwrap();
    let expected = (OBS_ALT - 20.0) / ELEVATION.to_radians().tan();
    assert_relative_eq!(back.distance_m, expected, max_relative = 1e-9);
}

proptest! {
    #[test]
    fn prop_vertex_count(n in 1usize..500) {
        let geodesic = Vincenty::wgs84();
        let footprint = synthesize_footprint(
            &geodesic, OBS_LAT, OBS_LON, OBS_ALT, ELEVATION, AZIMUTH, L1, n,
        ).unwrap();
        prop_assert_eq!(footprint.len(), n + 1);
    }

    #[test]
    fn prop_semi_minor_grows_with_height(
        h in 0.0f64..10_000.0,
        dh in 0.01f64..1_000.0,
        elevation in 1.0f64..90.0,
    ) {
        let low = ellipse_axes(h, elevation, L1).unwrap();
        let high = ellipse_axes(h + dh, elevation, L1).unwrap();
        prop_assert!(high.semi_minor_m > low.semi_minor_m);
    }

    #[test]
    fn prop_elongation_grows_as_elevation_drops(
        elevation in 1.0f64..89.0,
        de in 0.01f64..1.0,
        h in 0.0f64..10_000.0,
    ) {
        let steep = ellipse_axes(h, elevation + de, L1).unwrap();
        let shallow = ellipse_axes(h, elevation, L1).unwrap();
        prop_assert!(shallow.elongation() > steep.elongation());
    }
}
