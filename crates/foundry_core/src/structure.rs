//! Fixed structures placed on the tile grid.

use serde::{Deserialize, Serialize};

use crate::entity::{Body, Team};
use crate::error::{Result, SimError};
use crate::ids::EntityId;
use crate::math::Vec2;
use crate::persistence::{Persist, SaveReader, SaveWriter};
use crate::terrain::TileOccupancy;

/// Base state of a structure: body, anchor tile and footprint size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Shared entity state. `position` is the footprint's world center.
    pub body: Body,
    /// Anchor tile.
    pub tile: (i32, i32),
    /// Footprint edge length in tiles.
    pub size: u8,
}

impl Structure {
    /// Create a structure at full health.
    #[must_use]
    pub fn new(
        id: EntityId,
        team: Team,
        tile: (i32, i32),
        size: u8,
        center: Vec2,
        max_health: f32,
    ) -> Self {
        Self {
            body: Body::new(id, team, center, max_health),
            tile,
            size,
        }
    }

    /// Base destruction: the structure is dead and its tiles are free.
    pub fn on_destroyed(&mut self, occupancy: &mut dyn TileOccupancy) {
        self.body.kill();
        let released = occupancy.release_owner(self.body.id);
        tracing::debug!(structure = self.body.id, released, "Structure destroyed");
    }
}

impl Persist for Structure {
    fn write_state(&self, writer: &mut SaveWriter) -> Result<()> {
        writer.write_f32(self.body.health)?;
        writer.write(&self.body.team.0)
    }

    fn read_state(&mut self, reader: &mut SaveReader<'_>) -> Result<()> {
        let health = reader.read_f32()?;
        let team = Team(reader.read()?);
        if !health.is_finite() {
            return Err(SimError::Persistence(format!(
                "Structure {} has non-finite health {health}",
                self.body.id
            )));
        }
        self.body.restore_health(health);
        self.body.team = team;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Floor, TileGrid};

    #[test]
    fn test_destroy_releases_tiles() {
        let mut grid = TileGrid::new(8, 8, 8.0, Floor::plain("stone"));
        assert!(grid.occupy(3, 3, 2, 9));
        let mut structure = Structure::new(9, Team::SHARDED, (3, 3), 2, Vec2::ZERO, 50.0);
        structure.on_destroyed(&mut grid);
        assert!(structure.body.is_dead());
        assert_eq!(grid.occupant(3, 3), None);
    }

    #[test]
    fn test_persist_roundtrip() {
        let mut structure = Structure::new(1, Team::CRUX, (0, 0), 1, Vec2::ZERO, 80.0);
        structure.body.damage(12.5);
        let mut writer = SaveWriter::new();
        structure.write_state(&mut writer).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 5);

        let mut restored = Structure::new(1, Team::SHARDED, (0, 0), 1, Vec2::ZERO, 80.0);
        restored
            .read_state(&mut SaveReader::new(&bytes))
            .unwrap();
        assert_eq!(restored.body.health, 67.5);
        assert_eq!(restored.body.team, Team::CRUX);
    }

    #[test]
    fn test_loaded_nonpositive_health_is_dead() {
        let mut structure = Structure::new(2, Team::SHARDED, (0, 0), 1, Vec2::ZERO, 80.0);
        structure.body.health = -10.0;
        let mut writer = SaveWriter::new();
        structure.write_state(&mut writer).unwrap();
        let bytes = writer.into_bytes();

        let mut restored = Structure::new(2, Team::SHARDED, (0, 0), 1, Vec2::ZERO, 80.0);
        restored
            .read_state(&mut SaveReader::new(&bytes))
            .unwrap();
        assert_eq!(restored.body.health, -10.0);
        assert!(restored.body.is_dead());
    }

    #[test]
    fn test_non_finite_health_rejected() {
        let mut writer = SaveWriter::new();
        writer.write_f32(f32::NAN).unwrap();
        writer.write(&Team::CRUX.0).unwrap();
        let bytes = writer.into_bytes();

        let mut restored = Structure::new(3, Team::SHARDED, (0, 0), 1, Vec2::ZERO, 80.0);
        let err = restored
            .read_state(&mut SaveReader::new(&bytes))
            .unwrap_err();
        assert!(matches!(err, SimError::Persistence(_)));
        assert_eq!(restored.body.health, 80.0);
        assert_eq!(restored.body.team, Team::SHARDED);
    }
}
