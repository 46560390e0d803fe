//! Great-circle distance on a spherical Earth.

use geofilter_zone_models::GeoCoordinate;

/// Mean Earth radius used for all distance computations, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometres.
///
/// Uses a fixed-radius sphere ([`EARTH_RADIUS_KM`]); good to a few tenths
/// of a percent, which is plenty for zone radii measured in kilometres.
#[must_use]
pub fn haversine_km(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    // Rounding can push `h` a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
