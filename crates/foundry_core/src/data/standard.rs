//! Built-in content.

use crate::economy::ConsumeItems;
use crate::effects::{fx, Color};
use crate::generator::GeneratorType;
use crate::ids::{FloorId, ItemId};
use crate::status::{StatusEffectDef, StatusKind};
use crate::terrain::Floor;
use crate::unit::UnitType;

use super::registry::{ContentData, ContentRegistry};

/// Status ids of the built-in content.
pub mod status_ids {
    use crate::ids::StatusId;

    /// Slightly slowed by water.
    pub const WET: StatusId = StatusId::from_static("wet");
    /// Heavily slowed by tar.
    pub const TARRED: StatusId = StatusId::from_static("tarred");
    /// Burning in slag.
    pub const MELTING: StatusId = StatusId::from_static("melting");
    /// On fire.
    pub const BURNING: StatusId = StatusId::from_static("burning");
    /// Frozen stiff.
    pub const FREEZING: StatusId = StatusId::from_static("freezing");
    /// Boosted.
    pub const OVERDRIVE: StatusId = StatusId::from_static("overdrive");
}

/// Item consumed by the impact reactor.
pub const BLAST_COMPOUND: ItemId = ItemId::from_static("blast-compound");

fn color(hex: &str) -> Color {
    Color::from_hex(hex).unwrap_or_default()
}

fn liquid(id: &'static str, tint: &str) -> Floor {
    Floor {
        id: FloorId::from_static(id),
        is_liquid: true,
        walk_effect: fx::RIPPLE,
        drown_effect: fx::BUBBLE,
        liquid_color: color(tint),
        ..Floor::plain(id)
    }
}

fn standard_data() -> ContentData {
    let statuses = vec![
        StatusEffectDef {
            id: status_ids::WET,
            duration: 90.0,
            kind: StatusKind::Modifiers {
                speed_multiplier: 0.9,
            },
        },
        StatusEffectDef {
            id: status_ids::TARRED,
            duration: 120.0,
            kind: StatusKind::Modifiers {
                speed_multiplier: 0.6,
            },
        },
        StatusEffectDef {
            id: status_ids::MELTING,
            duration: 150.0,
            kind: StatusKind::Composite(vec![
                StatusKind::Damage { per_tick: 0.3 },
                StatusKind::Modifiers {
                    speed_multiplier: 0.8,
                },
            ]),
        },
        StatusEffectDef {
            id: status_ids::BURNING,
            duration: 120.0,
            kind: StatusKind::Damage { per_tick: 0.1 },
        },
        StatusEffectDef {
            id: status_ids::FREEZING,
            duration: 120.0,
            kind: StatusKind::Composite(vec![
                StatusKind::Drag { per_tick: 0.05 },
                StatusKind::Modifiers {
                    speed_multiplier: 0.6,
                },
            ]),
        },
        StatusEffectDef {
            id: status_ids::OVERDRIVE,
            duration: 300.0,
            kind: StatusKind::Composite(vec![
                StatusKind::Heal { per_tick: 0.1 },
                StatusKind::Modifiers {
                    speed_multiplier: 1.15,
                },
            ]),
        },
    ];

    let floors = vec![
        Floor::plain("stone"),
        Floor::plain("grass"),
        Floor {
            drag_multiplier: 0.3,
            status: Some(status_ids::FREEZING),
            status_intensity: 0.5,
            ..Floor::plain("ice")
        },
        Floor {
            speed_multiplier: 0.8,
            status: Some(status_ids::WET),
            ..liquid("shallow-water", "596ab8")
        },
        Floor {
            speed_multiplier: 0.2,
            drown_time: 140.0,
            status: Some(status_ids::WET),
            status_intensity: 1.5,
            ..liquid("deep-water", "4d5ca4")
        },
        Floor {
            speed_multiplier: 0.6,
            drag_multiplier: 1.35,
            status: Some(status_ids::TARRED),
            ..liquid("tar", "313131")
        },
        Floor {
            speed_multiplier: 0.3,
            damage_per_tick: 0.5,
            drown_time: 150.0,
            status: Some(status_ids::MELTING),
            ..liquid("slag", "ffa166")
        },
    ];

    let unit_types = vec![
        UnitType {
            mass: 1.2,
            max_velocity: 1.1,
            health: 130.0,
            ..UnitType::ground("dagger")
        },
        UnitType {
            mass: 3.5,
            size: 14.0,
            max_velocity: 0.8,
            health: 460.0,
            ..UnitType::ground("titan")
        },
        UnitType {
            mass: 0.6,
            drag: 0.01,
            max_velocity: 4.0,
            health: 70.0,
            ..UnitType::air("flare")
        },
    ];

    let generators = vec![GeneratorType::new(
        "impact-reactor",
        ConsumeItems {
            item: BLAST_COMPOUND,
            amount: 1,
            use_time: 60.0,
        },
    )];

    ContentData {
        floors,
        statuses,
        unit_types,
        generators,
    }
}

impl ContentRegistry {
    /// The built-in content set.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        // Built-in content is validated by the tests below.
        let _ = registry.merge("standard", standard_data());
        registry
    }
}
