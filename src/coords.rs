//! ECEF / geodetic coordinates and local geometry
use nalgebra::Vector3;

use crate::constants::{EARTH_FLATTENING_WGS84, EARTH_SEMI_MAJOR_AXIS_WGS84};

/// Latitude convergence threshold (rad)
const LATITUDE_CONVERGENCE: f64 = 1.0E-12;

/// Latitude iteration cap, never reached for terrestrial positions
const MAX_LATITUDE_ITERATIONS: usize = 100;

fn eccentricity_squared() -> f64 {
    EARTH_FLATTENING_WGS84 * (2.0 - EARTH_FLATTENING_WGS84)
}

/// Converts ECEF coordinates (m) to WGS84 geodetic
/// latitude (rad), longitude (rad) and ellipsoidal height (m).
pub fn ecef_to_geodetic(ecef: &Vector3<f64>) -> (f64, f64, f64) {
    let (x, y, z) = (ecef[0], ecef[1], ecef[2]);
    let a = EARTH_SEMI_MAJOR_AXIS_WGS84;
    let e2 = eccentricity_squared();

    let p = (x.powi(2) + y.powi(2)).sqrt();
    let lon = y.atan2(x);

    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let sin_lat = lat.sin();
        let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
        let next = (z + n * e2 * sin_lat).atan2(p);
        let converged = (next - lat).abs() < LATITUDE_CONVERGENCE;
        lat = next;
        if converged {
            break;
        }
    }

    let sin_lat = lat.sin();
    let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();

    let height = if lat.cos().abs() > 1.0E-10 {
        p / lat.cos() - n
    } else {
        // polar case
        z.abs() - n * (1.0 - e2)
    };

    (lat, lon, height)
}

/// Converts WGS84 geodetic latitude (rad), longitude (rad)
/// and ellipsoidal height (m) to ECEF coordinates (m)
pub fn geodetic_to_ecef(lat: f64, lon: f64, height: f64) -> Vector3<f64> {
    let a = EARTH_SEMI_MAJOR_AXIS_WGS84;
    let e2 = eccentricity_squared();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
    Vector3::new(
        (n + height) * cos_lat * cos_lon,
        (n + height) * cos_lat * sin_lon,
        (n * (1.0 - e2) + height) * sin_lat,
    )
}

/// Projects the receiver to satellite vector in the local (East, North, Up) frame
pub fn enu(receiver: &Vector3<f64>, satellite: &Vector3<f64>) -> Vector3<f64> {
    let (lat, lon, _) = ecef_to_geodetic(receiver);
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    let d = satellite - receiver;

    let e = -sin_lon * d[0] + cos_lon * d[1];
    let n = -sin_lat * cos_lon * d[0] - sin_lat * sin_lon * d[1] + cos_lat * d[2];
    let u = cos_lat * cos_lon * d[0] + cos_lat * sin_lon * d[1] + sin_lat * d[2];

    Vector3::new(e, n, u)
}

/// Elevation angle (degrees) of the satellite, seen from the receiver
pub fn elevation_deg(receiver: &Vector3<f64>, satellite: &Vector3<f64>) -> f64 {
    let enu = enu(receiver, satellite);
    let horizontal = (enu[0].powi(2) + enu[1].powi(2)).sqrt();
    enu[2].atan2(horizontal).to_degrees()
}

/// Azimuth angle (degrees, clockwise from North, 0..360) of the satellite
pub fn azimuth_deg(receiver: &Vector3<f64>, satellite: &Vector3<f64>) -> f64 {
    let enu = enu(receiver, satellite);
    let azim = enu[0].atan2(enu[1]).to_degrees();
    if azim < 0.0 {
        azim + 360.0
    } else {
        azim
    }
}
