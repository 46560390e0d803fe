//! Compile-time registry of geographic zones.
//!
//! Each built-in zone is a TOML file under `zones/` embedded via
//! `include_str!`. Registration order is significant: the matcher returns
//! the first zone that contains a coordinate, so overlapping zones resolve
//! to whichever is listed first here. Adding a zone means adding a TOML
//! file and an entry below, then redeploying.

use std::collections::BTreeSet;
use std::path::Path;

use geofilter_zone_models::Zone;
use serde::Deserialize;

use crate::ZoneError;

/// Number of built-in zones. Enforced by a test.
#[cfg(test)]
const EXPECTED_ZONE_COUNT: usize = 3;

/// Embedded TOML zone definitions, in registration order.
const ZONE_TOMLS: &[(&str, &str)] = &[
    ("central_park", include_str!("../zones/central_park.toml")),
    (
        "golden_gate_bridge",
        include_str!("../zones/golden_gate_bridge.toml"),
    ),
    ("times_square", include_str!("../zones/times_square.toml")),
];

/// Shape of a standalone zone file: a `[[zones]]` array of tables.
#[derive(Deserialize)]
struct ZoneFile {
    zones: Vec<Zone>,
}

/// An ordered, read-only catalog of zones.
///
/// Built once at startup and shared (typically behind an `Arc`) by every
/// consumer. Zones cannot be added or removed after construction.
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    /// Builds a registry from an ordered list of zones.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Model`] if any zone fails validation and
    /// [`ZoneError::DuplicateName`] if two zones share a name.
    pub fn new(zones: Vec<Zone>) -> Result<Self, ZoneError> {
        let mut seen = BTreeSet::new();
        for zone in &zones {
            zone.validate()?;
            if !seen.insert(zone.name.as_str()) {
                return Err(ZoneError::DuplicateName {
                    name: zone.name.clone(),
                });
            }
        }

        Ok(Self { zones })
    }

    /// Returns the built-in zone catalog.
    ///
    /// # Panics
    ///
    /// Panics if any embedded TOML file fails to parse or validate. These
    /// are compile-time constants, so a failure is a development error
    /// caught by the tests below.
    #[must_use]
    pub fn builtin() -> Self {
        let zones = ZONE_TOMLS
            .iter()
            .map(|(name, toml_str)| {
                toml::de::from_str::<Zone>(toml_str)
                    .unwrap_or_else(|e| panic!("Failed to parse zone '{name}': {e}"))
            })
            .collect();

        Self::new(zones).unwrap_or_else(|e| panic!("Invalid built-in zone table: {e}"))
    }

    /// Parses a zone file containing a `[[zones]]` array.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Parse`] for malformed TOML and any error from
    /// [`Self::new`].
    pub fn from_toml_str(source_name: &str, toml_str: &str) -> Result<Self, ZoneError> {
        let file: ZoneFile = toml::de::from_str(toml_str).map_err(|e| ZoneError::Parse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        Self::new(file.zones)
    }

    /// Reads and parses a zone file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Self::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self, ZoneError> {
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&path.display().to_string(), &contents)?;
        log::info!(
            "Loaded {} zones from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// All zones in registration order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Looks up a zone by its exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// Number of registered zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the registry has no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofilter_zone_models::{FilterKind, GeoCoordinate, ZoneBoundary};

    #[test]
    fn loads_all_builtin_zones() {
        let registry = ZoneRegistry::builtin();
        assert_eq!(
            registry.len(),
            EXPECTED_ZONE_COUNT,
            "Expected {EXPECTED_ZONE_COUNT} zones, found {}. \
             Update EXPECTED_ZONE_COUNT after adding/removing zones.",
            registry.len()
        );
    }

    #[test]
    fn builtin_zones_keep_registration_order() {
        let registry = ZoneRegistry::builtin();
        let names: Vec<&str> = registry
            .zones()
            .iter()
            .map(|z| z.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "Central Park, NYC",
                "Golden Gate Bridge, SF",
                "Times Square, NYC"
            ]
        );
    }

    #[test]
    fn builtin_zones_are_small_overlay_circles() {
        for zone in ZoneRegistry::builtin().zones() {
            let ZoneBoundary::Circle { radius_km, .. } = zone.boundary else {
                panic!("Zone {} is not a circle", zone.name);
            };
            assert!(
                (0.5..=2.0).contains(&radius_km),
                "Zone {} has radius {radius_km}",
                zone.name
            );
            assert_eq!(zone.filter.kind, FilterKind::Overlay);
            let color = zone.filter.color.expect("overlay zones carry a color");
            assert!((color.a - 0.3).abs() < 1e-6);
        }
    }

    #[test]
    fn get_finds_by_name() {
        let registry = ZoneRegistry::builtin();
        let zone = registry.get("Times Square, NYC").unwrap();
        assert_eq!(
            zone.boundary,
            ZoneBoundary::Circle {
                center: GeoCoordinate::new(40.7580, -73.9855).unwrap(),
                radius_km: 0.5,
            }
        );
        assert!(registry.get("Atlantis").is_none());
    }

    #[test]
    fn parses_zone_file() {
        let registry = ZoneRegistry::from_toml_str(
            "inline",
            r#"
            [[zones]]
            name = "Square"
            filter = { kind = "sepia", intensity = 0.8 }

            [zones.boundary]
            type = "polygon"
            vertices = [
                { lat = 0.0, lng = 0.0 },
                { lat = 0.0, lng = 1.0 },
                { lat = 1.0, lng = 1.0 },
                { lat = 1.0, lng = 0.0 },
            ]

            [[zones]]
            name = "Dot"
            filter = { kind = "brightness" }
            boundary = { type = "circle", center = { lat = 5.0, lng = 5.0 }, radius_km = 0.1 }
            "#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.zones()[0].filter.kind, FilterKind::Sepia);
        assert_eq!(registry.zones()[1].name, "Dot");
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = ZoneRegistry::from_toml_str(
            "inline",
            r#"
            [[zones]]
            name = "Twin"
            filter = { kind = "sepia" }
            boundary = { type = "circle", center = { lat = 0.0, lng = 0.0 }, radius_km = 1.0 }

            [[zones]]
            name = "Twin"
            filter = { kind = "sepia" }
            boundary = { type = "circle", center = { lat = 1.0, lng = 1.0 }, radius_km = 1.0 }
            "#,
        );
        assert!(matches!(result, Err(ZoneError::DuplicateName { name }) if name == "Twin"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = ZoneRegistry::from_toml_str("broken", "[[zones]]\nname = ");
        assert!(matches!(result, Err(ZoneError::Parse { .. })));
    }

    #[test]
    fn rejects_polygon_with_two_vertices() {
        let result = ZoneRegistry::from_toml_str(
            "inline",
            r#"
            [[zones]]
            name = "Line"
            filter = { kind = "vintage" }

            [zones.boundary]
            type = "polygon"
            vertices = [{ lat = 0.0, lng = 0.0 }, { lat = 1.0, lng = 1.0 }]
            "#,
        );
        assert!(matches!(result, Err(ZoneError::Model(_))));
    }
}
