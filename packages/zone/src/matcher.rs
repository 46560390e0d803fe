//! First-match zone lookup.
//!
//! Zones are tested in registration order and the first one containing
//! the coordinate wins, even when a later zone's center is closer.

use std::sync::Arc;

use geo::{Coord, Intersects, LineString, Polygon};
use geofilter_zone_models::{GeoCoordinate, Zone, ZoneBoundary};

use crate::distance::haversine_km;
use crate::registry::ZoneRegistry;

/// Precomputed geometry for one registry entry.
enum Region {
    Circle {
        center: GeoCoordinate,
        radius_km: f64,
    },
    /// Planar ring in (lng, lat) order.
    Polygon(Polygon<f64>),
}

impl Region {
    fn from_boundary(boundary: &ZoneBoundary) -> Self {
        match boundary {
            ZoneBoundary::Circle { center, radius_km } => Self::Circle {
                center: *center,
                radius_km: *radius_km,
            },
            ZoneBoundary::Polygon { vertices } => {
                let ring: LineString<f64> = vertices.iter().map(|v| (v.lng(), v.lat())).collect();
                Self::Polygon(Polygon::new(ring, vec![]))
            }
        }
    }
}

/// Matches coordinates against an injected, read-only [`ZoneRegistry`].
///
/// Pure and deterministic: the same coordinate and registry always give
/// the same answer. Cheap to share across tasks.
pub struct ZoneMatcher {
    registry: Arc<ZoneRegistry>,
    regions: Vec<Region>,
}

impl ZoneMatcher {
    /// Creates a matcher over `registry`, precomputing polygon rings.
    #[must_use]
    pub fn new(registry: Arc<ZoneRegistry>) -> Self {
        let regions = registry
            .zones()
            .iter()
            .map(|zone| Region::from_boundary(&zone.boundary))
            .collect();
        Self { registry, regions }
    }

    /// The registry this matcher reads from.
    #[must_use]
    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Returns the first zone, in registration order, that contains
    /// `coordinate`, or `None` if no zone does.
    ///
    /// Circle membership is inclusive: a point exactly `radius_km` away
    /// matches.
    #[must_use]
    pub fn find_zone(&self, coordinate: &GeoCoordinate) -> Option<&Zone> {
        self.registry
            .zones()
            .iter()
            .zip(&self.regions)
            .find(|(zone, region)| Self::region_contains(zone, region, coordinate))
            .map(|(zone, _)| zone)
    }

    fn region_contains(zone: &Zone, region: &Region, coordinate: &GeoCoordinate) -> bool {
        match region {
            Region::Circle { center, radius_km } => {
                let distance = haversine_km(coordinate, center);
                log::debug!(
                    "Distance to {}: {distance:.3}km (threshold: {radius_km}km)",
                    zone.name
                );
                distance <= *radius_km
            }
            Region::Polygon(polygon) => {
                let point = Coord {
                    x: coordinate.lng(),
                    y: coordinate.lat(),
                };
                let inside = polygon.intersects(&point);
                log::debug!("Polygon zone {}: inside={inside}", zone.name);
                inside
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::EARTH_RADIUS_KM;
    use geofilter_zone_models::{FilterKind, FilterSpec, RgbaColor};

    fn coord(lat: f64, lng: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lng).unwrap()
    }

    fn overlay() -> FilterSpec {
        FilterSpec::overlay(RgbaColor::new(10, 20, 30, 0.5))
    }

    fn matcher(zones: Vec<Zone>) -> ZoneMatcher {
        ZoneMatcher::new(Arc::new(ZoneRegistry::new(zones).unwrap()))
    }

    /// Latitude `km` kilometres due north of `lat` along a meridian.
    fn north_of(lat: f64, km: f64) -> f64 {
        lat + (km / EARTH_RADIUS_KM).to_degrees()
    }

    #[test]
    fn center_of_zone_matches() {
        let m = ZoneMatcher::new(Arc::new(ZoneRegistry::builtin()));
        let zone = m.find_zone(&coord(40.7829, -73.9654)).unwrap();
        assert_eq!(zone.name, "Central Park, NYC");

        let zone = m.find_zone(&coord(37.8199, -122.4783)).unwrap();
        assert_eq!(zone.name, "Golden Gate Bridge, SF");
    }

    #[test]
    fn times_square_is_outside_central_park() {
        let m = ZoneMatcher::new(Arc::new(ZoneRegistry::builtin()));
        let zone = m.find_zone(&coord(40.7580, -73.9855)).unwrap();
        assert_eq!(zone.name, "Times Square, NYC");
    }

    #[test]
    fn far_away_matches_nothing() {
        let m = ZoneMatcher::new(Arc::new(ZoneRegistry::builtin()));
        assert!(m.find_zone(&coord(51.5074, -0.1278)).is_none());
    }

    #[test]
    fn radius_boundary_is_inclusive_and_sharp() {
        let center = coord(10.0, 20.0);
        let m = matcher(vec![Zone::circle("Ring", center, 1.0, overlay())]);

        let just_inside = coord(north_of(10.0, 1.0 - 1e-6), 20.0);
        assert_eq!(m.find_zone(&just_inside).map(|z| z.name.as_str()), Some("Ring"));

        let just_outside = coord(north_of(10.0, 1.0 + 1e-6), 20.0);
        assert!(m.find_zone(&just_outside).is_none());
    }

    #[test]
    fn first_registered_zone_wins_on_overlap() {
        let point = coord(0.0, 0.0);
        let m = matcher(vec![
            Zone::circle("Wide", coord(0.0, 0.01), 5.0, overlay()),
            Zone::circle("Exact", point, 1.0, overlay()),
        ]);
        assert_eq!(m.find_zone(&point).unwrap().name, "Wide");

        let m = matcher(vec![
            Zone::circle("Exact", point, 1.0, overlay()),
            Zone::circle("Wide", coord(0.0, 0.01), 5.0, overlay()),
        ]);
        assert_eq!(m.find_zone(&point).unwrap().name, "Exact");
    }

    #[test]
    fn polygon_zone_contains_interior_point() {
        let square = vec![
            coord(0.0, 0.0),
            coord(0.0, 1.0),
            coord(1.0, 1.0),
            coord(1.0, 0.0),
        ];
        let filter = FilterSpec {
            kind: FilterKind::Sepia,
            color: None,
            intensity: None,
        };
        let m = matcher(vec![Zone::polygon("Square", square, filter)]);

        assert_eq!(m.find_zone(&coord(0.5, 0.5)).unwrap().name, "Square");
        assert!(m.find_zone(&coord(1.5, 0.5)).is_none());
        assert!(m.find_zone(&coord(0.5, -0.1)).is_none());
    }

    #[test]
    fn empty_registry_matches_nothing() {
        let m = matcher(vec![]);
        assert!(m.find_zone(&coord(0.0, 0.0)).is_none());
    }

    #[test]
    fn matching_is_deterministic() {
        let m = ZoneMatcher::new(Arc::new(ZoneRegistry::builtin()));
        let p = coord(40.7600, -73.9850);
        let first = m.find_zone(&p).map(|z| z.name.clone());
        for _ in 0..10 {
            assert_eq!(m.find_zone(&p).map(|z| z.name.clone()), first);
        }
    }
}
