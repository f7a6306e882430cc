//! Spherical-earth geodesy for relocating placefile coordinates.
//!
//! A point is moved by computing its distance and initial bearing from
//! the origin site (haversine), then projecting that same distance and
//! bearing outward from the destination site.

/// Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A decimal-degree coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance (meters) and initial bearing (degrees, 0..360)
/// from `origin` to `point`.
///
/// The haversine intermediate is floored at zero before the square root
/// so floating-point overshoot cannot produce a domain error. The floor
/// is deliberately one-sided (no cap at 1); near-antipodal behavior is
/// unchanged from upstream.
pub fn distance_and_bearing(origin: LatLon, point: LatLon) -> (f64, f64) {
    let phi1 = origin.lat.to_radians();
    let phi2 = point.lat.to_radians();
    let d_phi = (point.lat - origin.lat).to_radians();
    let d_lambda = (point.lon - origin.lon).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let a = a.max(0.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    let distance = EARTH_RADIUS_M * c;

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    let bearing = (y.atan2(x).to_degrees() + 360.0) % 360.0;

    (distance, bearing)
}

/// Project `distance` meters at `bearing` degrees outward from `from`.
pub fn project(from: LatLon, distance: f64, bearing: f64) -> LatLon {
    let phi = from.lat.to_radians();
    let lambda = from.lon.to_radians();
    let angular = distance / EARTH_RADIUS_M;
    let theta = bearing.to_radians();

    let phi_out =
        (phi.sin() * angular.cos() + phi.cos() * angular.sin() * theta.cos()).asin();
    let lambda_out = lambda
        + (theta.sin() * angular.sin() * phi.cos())
            .atan2(angular.cos() - phi.sin() * phi_out.sin());

    LatLon::new(phi_out.to_degrees(), lambda_out.to_degrees())
}

/// Relocate `point` so it keeps its range and azimuth relative to
/// `destination` instead of `origin`.
pub fn relocate(point: LatLon, origin: LatLon, destination: LatLon) -> LatLon {
    let (distance, bearing) = distance_and_bearing(origin, point);
    project(destination, distance, bearing)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KTLX: LatLon = LatLon {
        lat: 35.3331,
        lon: -97.2778,
    };
    const KGRR: LatLon = LatLon {
        lat: 42.8939,
        lon: -85.5449,
    };

    #[test]
    fn zero_distance_at_origin() {
        let (d, _) = distance_and_bearing(KTLX, KTLX);
        assert!(d.abs() < 1e-6);
    }

    #[test]
    fn known_bearing_quadrants() {
        // Due-ish north of the origin.
        let north = LatLon::new(KTLX.lat + 0.5, KTLX.lon);
        let (_, bearing) = distance_and_bearing(KTLX, north);
        assert!(bearing < 1.0 || bearing > 359.0);

        // East of the origin.
        let east = LatLon::new(KTLX.lat, KTLX.lon + 0.5);
        let (_, bearing) = distance_and_bearing(KTLX, east);
        assert!((bearing - 90.0).abs() < 1.0);
    }

    #[test]
    fn relocation_preserves_range() {
        let point = LatLon::new(35.5021, -97.0133);
        let moved = relocate(point, KTLX, KGRR);
        let (d_before, _) = distance_and_bearing(KTLX, point);
        let (d_after, _) = distance_and_bearing(KGRR, moved);
        assert!((d_before - d_after).abs() < 0.5);
    }

    #[test]
    fn round_trip_is_sub_meter() {
        let point = LatLon::new(35.5021, -97.0133);
        let there = relocate(point, KTLX, KGRR);
        let back = relocate(there, KGRR, KTLX);
        // 1e-7 degrees is roughly a centimeter of latitude.
        assert!((back.lat - point.lat).abs() < 1e-7);
        assert!((back.lon - point.lon).abs() < 1e-7);
    }

    #[test]
    fn haversine_term_of_one_is_well_defined() {
        // Antipodal longitudes on the equator drive the intermediate to
        // exactly 1.0; the distance must stay finite, not NaN or panic.
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 180.0);
        let (d, bearing) = distance_and_bearing(a, b);
        assert!(d.is_finite());
        assert!(bearing.is_finite());
        assert!((d - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1.0);
    }

    #[test]
    fn negative_overshoot_is_floored() {
        // Identical points can produce a tiny negative intermediate from
        // rounding; the floor keeps sqrt in-domain.
        let p = LatLon::new(41.123456789, -93.987654321);
        let (d, _) = distance_and_bearing(p, p);
        assert!(d >= 0.0);
        assert!(d.is_finite());
    }
}
