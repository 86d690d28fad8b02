//! Content registry and RON loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::generator::GeneratorType;
use crate::ids::{FloorId, GeneratorTypeId, UnitTypeId};
use crate::status::{StatusEffectDef, StatusRegistry};
use crate::terrain::Floor;
use crate::unit::UnitType;

/// A content document as written in RON.
///
/// # Example RON
///
/// ```ron
/// ContentData(
///     floors: [
///         Floor(
///             id: "shallow-water",
///             is_liquid: true,
///             speed_multiplier: 0.8,
///             status: Some("wet"),
///             walk_effect: "ripple",
///         ),
///     ],
///     statuses: [
///         StatusEffectDef(id: "wet", duration: 90.0, kind: Modifiers(speed_multiplier: 0.9)),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    /// Floor definitions.
    #[serde(default)]
    pub floors: Vec<Floor>,
    /// Status effect definitions.
    #[serde(default)]
    pub statuses: Vec<StatusEffectDef>,
    /// Unit type definitions.
    #[serde(default)]
    pub unit_types: Vec<UnitType>,
    /// Generator type definitions.
    #[serde(default)]
    pub generators: Vec<GeneratorType>,
}

/// All content known to a simulation, indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRegistry {
    floors: BTreeMap<FloorId, Floor>,
    statuses: StatusRegistry,
    unit_types: BTreeMap<UnitTypeId, UnitType>,
    generators: BTreeMap<GeneratorTypeId, GeneratorType>,
}

impl ContentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a RON content document into a fresh registry.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.merge_ron_str(source_name, text)?;
        Ok(registry)
    }

    /// Parse a RON content document and merge it, replacing entries with the
    /// same ids.
    pub fn merge_ron_str(&mut self, source_name: &str, text: &str) -> Result<()> {
        let data: ContentData = ron::from_str(text).map_err(|e| SimError::DataParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        self.merge(source_name, data)
    }

    /// Validate and merge a content document.
    ///
    /// The registry is untouched if validation fails.
    pub fn merge(&mut self, source_name: &str, data: ContentData) -> Result<()> {
        let mut merged = self.clone();
        for def in data.statuses {
            merged.statuses.register(def);
        }
        for floor in data.floors {
            merged.floors.insert(floor.id.clone(), floor);
        }
        for unit in data.unit_types {
            merged.unit_types.insert(unit.id.clone(), unit);
        }
        for generator in data.generators {
            merged.generators.insert(generator.id.clone(), generator);
        }
        merged.validate(source_name)?;
        *self = merged;
        Ok(())
    }

    fn validate(&self, source_name: &str) -> Result<()> {
        let invalid = |message: String| SimError::DataParse {
            source_name: source_name.to_string(),
            message,
        };

        for floor in self.floors.values() {
            if let Some(status) = &floor.status {
                if self.statuses.get(status).is_none() {
                    return Err(invalid(format!(
                        "floor '{}' applies unknown status '{status}'",
                        floor.id
                    )));
                }
            }
            if floor.drown_time < 0.0 || floor.damage_per_tick < 0.0 {
                return Err(invalid(format!("floor '{}' has negative rates", floor.id)));
            }
        }
        for unit in self.unit_types.values() {
            if unit.mass <= 0.0 {
                return Err(invalid(format!("unit type '{}' must have positive mass", unit.id)));
            }
        }
        for generator in self.generators.values() {
            if generator.consumes.use_time <= 0.0 {
                return Err(invalid(format!(
                    "generator '{}' must have a positive use_time",
                    generator.id
                )));
            }
        }
        Ok(())
    }

    /// Look up a floor.
    pub fn floor(&self, id: &FloorId) -> Result<&Floor> {
        self.floors.get(id).ok_or_else(|| SimError::UnknownContent {
            kind: "floor",
            id: id.to_string(),
        })
    }

    /// Look up a unit type.
    pub fn unit_type(&self, id: &UnitTypeId) -> Result<&UnitType> {
        self.unit_types.get(id).ok_or_else(|| SimError::UnknownContent {
            kind: "unit type",
            id: id.to_string(),
        })
    }

    /// Look up a generator type.
    pub fn generator(&self, id: &GeneratorTypeId) -> Result<&GeneratorType> {
        self.generators.get(id).ok_or_else(|| SimError::UnknownContent {
            kind: "generator",
            id: id.to_string(),
        })
    }

    /// Status effect definitions.
    #[must_use]
    pub const fn statuses(&self) -> &StatusRegistry {
        &self.statuses
    }

    /// Iterate over floors in id order.
    pub fn floors(&self) -> impl Iterator<Item = &Floor> {
        self.floors.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::StatusId;

    const DOC: &str = r#"
        ContentData(
            floors: [
                Floor(
                    id: "shallow-water",
                    is_liquid: true,
                    speed_multiplier: 0.8,
                    status: Some("wet"),
                    walk_effect: "ripple",
                    liquid_color: Color(r: 0.35, g: 0.42, b: 0.72, a: 1.0),
                ),
            ],
            statuses: [
                StatusEffectDef(id: "wet", duration: 90.0, kind: Modifiers(speed_multiplier: 0.9)),
            ],
            unit_types: [
                UnitType(id: "dagger", health: 130.0),
            ],
        )
    "#;

    #[test]
    fn test_parse_document() {
        let registry = ContentRegistry::from_ron_str("test.ron", DOC).unwrap();
        let floor = registry.floor(&FloorId::from_static("shallow-water")).unwrap();
        assert!(floor.is_liquid);
        assert_eq!(floor.drag_multiplier, 1.0);
        assert_eq!(floor.drown_time, 0.0);
        assert_eq!(floor.walk_effect.as_str(), "ripple");
        assert!(registry
            .statuses()
            .get(&StatusId::from_static("wet"))
            .is_some());
        let dagger = registry.unit_type(&UnitTypeId::from_static("dagger")).unwrap();
        assert_eq!(dagger.health, 130.0);
        assert!(!dagger.flying);
    }

    #[test]
    fn test_unknown_status_reference_rejected() {
        let doc = r#"ContentData(floors: [Floor(id: "tar", status: Some("tarred"))])"#;
        let err = ContentRegistry::from_ron_str("bad.ron", doc).unwrap_err();
        assert!(matches!(err, SimError::DataParse { .. }));
    }

    #[test]
    fn test_failed_merge_leaves_registry_untouched() {
        let mut registry = ContentRegistry::from_ron_str("test.ron", DOC).unwrap();
        let before = registry.clone();
        let doc = r#"ContentData(unit_types: [UnitType(id: "ghost", mass: 0.0)])"#;
        assert!(registry.merge_ron_str("bad.ron", doc).is_err());
        assert_eq!(registry, before);
    }

    #[test]
    fn test_syntax_error_reports_source() {
        let err = ContentRegistry::from_ron_str("broken.ron", "ContentData(").unwrap_err();
        match err {
            SimError::DataParse { source_name, .. } => assert_eq!(source_name, "broken.ron"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_lookup() {
        let registry = ContentRegistry::new();
        let err = registry
            .generator(&GeneratorTypeId::from_static("missing"))
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownContent { kind: "generator", .. }));
    }
}
