//! Terrain lookups and the tile grid world store.
//!
//! The unit simulation only sees terrain through [`TerrainQuery`] and world
//! collision through [`Collider`]. [`TileGrid`] is the store used by the
//! simulation driver and by tests; any other world representation can plug in
//! by implementing the two traits.

use serde::{Deserialize, Serialize};

use crate::effects::{fx, Color};
use crate::ids::{EffectId, EntityId, FloorId, StatusId};
use crate::math::Vec2;

/// World units per tile edge.
pub const DEFAULT_TILE_SIZE: f32 = 8.0;

/// Read-only description of a floor type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    /// Unique id.
    pub id: FloorId,
    /// Whether the floor is a liquid units wade through.
    #[serde(default)]
    pub is_liquid: bool,
    /// Multiplier on grounded movement.
    #[serde(default = "one")]
    pub speed_multiplier: f32,
    /// Multiplier on velocity drag.
    #[serde(default = "one")]
    pub drag_multiplier: f32,
    /// Health lost per tick while standing here.
    #[serde(default)]
    pub damage_per_tick: f32,
    /// Ticks of submersion until death. Zero disables drowning.
    #[serde(default)]
    pub drown_time: f32,
    /// Status effect applied on contact.
    #[serde(default)]
    pub status: Option<StatusId>,
    /// Intensity of the contact status effect.
    #[serde(default = "one")]
    pub status_intensity: f32,
    /// Effect played under units walking through the liquid.
    #[serde(default = "no_effect")]
    pub walk_effect: EffectId,
    /// Effect played over drowning units.
    #[serde(default = "no_effect")]
    pub drown_effect: EffectId,
    /// Tint for walk and drown effects.
    #[serde(default)]
    pub liquid_color: Color,
}

fn one() -> f32 {
    1.0
}

fn no_effect() -> EffectId {
    fx::NONE
}

impl Floor {
    /// A plain solid floor with no side effects.
    #[must_use]
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: FloorId::new(id),
            is_liquid: false,
            speed_multiplier: 1.0,
            drag_multiplier: 1.0,
            damage_per_tick: 0.0,
            drown_time: 0.0,
            status: None,
            status_intensity: 1.0,
            walk_effect: fx::NONE,
            drown_effect: fx::NONE,
            liquid_color: Color::WHITE,
        }
    }
}

impl Default for Floor {
    fn default() -> Self {
        Self::plain("stone")
    }
}

/// Terrain lookup by world position.
pub trait TerrainQuery {
    /// Floor at `position`. Never fails: positions outside the world or
    /// without a valid floor resolve to a default floor.
    fn floor_at(&self, position: Vec2) -> &Floor;
}

/// World collision for grounded movement.
pub trait Collider {
    /// Resolve a move of `delta` from `position` for a body of `size`,
    /// returning the new position.
    fn resolve_move(&self, position: Vec2, delta: Vec2, size: f32) -> Vec2;
}

/// Narrow write access to structure occupancy.
pub trait TileOccupancy {
    /// Free every tile owned by `owner`, returning how many were freed.
    fn release_owner(&mut self, owner: EntityId) -> usize;
}

/// Collider that never blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollision;

impl Collider for NoCollision {
    fn resolve_move(&self, position: Vec2, delta: Vec2, _size: f32) -> Vec2 {
        position + delta
    }
}

/// Rectangular tile world: floors, walls and structure occupancy.
///
/// Tile `(x, y)` is centered on world position `(x, y) * tile_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: f32,
    /// Floor palette. Index 0 is the default floor.
    floors: Vec<Floor>,
    tiles: Vec<u16>,
    walls: Vec<bool>,
    occupancy: Vec<Option<EntityId>>,
}

impl TileGrid {
    /// Create a grid filled with `default_floor`.
    #[must_use]
    pub fn new(width: u32, height: u32, tile_size: f32, default_floor: Floor) -> Self {
        let cells = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tile_size,
            floors: vec![default_floor],
            tiles: vec![0; cells],
            walls: vec![false; cells],
            occupancy: vec![None; cells],
        }
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// World units per tile edge.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// The floor used for out-of-bounds lookups.
    #[must_use]
    pub fn default_floor(&self) -> &Floor {
        &self.floors[0]
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Tile coordinate containing a world position (may be out of bounds).
    #[must_use]
    pub fn world_to_tile(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.tile_size).round() as i32,
            (position.y / self.tile_size).round() as i32,
        )
    }

    /// World position of a tile center.
    #[must_use]
    pub fn tile_center(&self, x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32, y as f32) * self.tile_size
    }

    /// Register a floor in the palette, returning its index. Re-registering an
    /// id returns the existing index.
    pub fn add_floor(&mut self, floor: Floor) -> u16 {
        if let Some(existing) = self.floors.iter().position(|f| f.id == floor.id) {
            return existing as u16;
        }
        self.floors.push(floor);
        (self.floors.len() - 1) as u16
    }

    /// Palette index of a floor id.
    #[must_use]
    pub fn floor_index(&self, id: &FloorId) -> Option<u16> {
        self.floors.iter().position(|f| &f.id == id).map(|i| i as u16)
    }

    /// Set the floor of one tile. Returns `false` if out of bounds or the
    /// palette index is unknown.
    pub fn set_floor(&mut self, x: i32, y: i32, floor: u16) -> bool {
        if floor as usize >= self.floors.len() {
            return false;
        }
        match self.index(x, y) {
            Some(i) => {
                self.tiles[i] = floor;
                true
            }
            None => false,
        }
    }

    /// Set the floor of every in-bounds tile in the inclusive rectangle.
    pub fn fill_floor(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, floor: u16) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set_floor(x, y, floor);
            }
        }
    }

    /// Floor of a tile, default floor if out of bounds.
    #[must_use]
    pub fn floor(&self, x: i32, y: i32) -> &Floor {
        self.index(x, y)
            .and_then(|i| self.floors.get(self.tiles[i] as usize))
            .unwrap_or_else(|| self.default_floor())
    }

    /// Place or remove a wall.
    pub fn set_wall(&mut self, x: i32, y: i32, wall: bool) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.walls[i] = wall;
                true
            }
            None => false,
        }
    }

    /// Whether a tile blocks grounded movement. Out-of-bounds tiles block.
    #[must_use]
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some(i) => self.walls[i] || self.occupancy[i].is_some(),
            None => true,
        }
    }

    /// Tiles covered by a square structure of `size` anchored at `(x, y)`.
    ///
    /// Odd sizes are centered on the anchor; even sizes extend one tile
    /// further toward positive coordinates.
    pub fn footprint(x: i32, y: i32, size: u8) -> impl Iterator<Item = (i32, i32)> {
        let size = i32::from(size.max(1));
        let offset = -(size - 1) / 2;
        (0..size).flat_map(move |dy| (0..size).map(move |dx| (x + offset + dx, y + offset + dy)))
    }

    /// World center of a structure of `size` anchored at `(x, y)`.
    #[must_use]
    pub fn structure_center(&self, x: i32, y: i32, size: u8) -> Vec2 {
        let offset = if size % 2 == 0 { self.tile_size / 2.0 } else { 0.0 };
        self.tile_center(x, y) + Vec2::splat(offset)
    }

    /// Whether a structure footprint fits: in bounds, no walls, unoccupied.
    #[must_use]
    pub fn can_occupy(&self, x: i32, y: i32, size: u8) -> bool {
        Self::footprint(x, y, size).all(|(tx, ty)| !self.is_solid(tx, ty))
    }

    /// Mark a footprint as owned by `owner`. Does nothing and returns `false`
    /// if any tile is unavailable.
    pub fn occupy(&mut self, x: i32, y: i32, size: u8, owner: EntityId) -> bool {
        if !self.can_occupy(x, y, size) {
            return false;
        }
        for (tx, ty) in Self::footprint(x, y, size) {
            if let Some(i) = self.index(tx, ty) {
                self.occupancy[i] = Some(owner);
            }
        }
        true
    }

    /// Release every tile owned by `owner`. Returns the number released.
    pub fn release(&mut self, owner: EntityId) -> usize {
        let mut released = 0;
        for cell in &mut self.occupancy {
            if *cell == Some(owner) {
                *cell = None;
                released += 1;
            }
        }
        released
    }

    /// Structure occupying a tile.
    #[must_use]
    pub fn occupant(&self, x: i32, y: i32) -> Option<EntityId> {
        self.index(x, y).and_then(|i| self.occupancy[i])
    }
}

impl TerrainQuery for TileGrid {
    fn floor_at(&self, position: Vec2) -> &Floor {
        let (x, y) = self.world_to_tile(position);
        self.floor(x, y)
    }
}

impl TileOccupancy for TileGrid {
    fn release_owner(&mut self, owner: EntityId) -> usize {
        self.release(owner)
    }
}

impl Collider for TileGrid {
    fn resolve_move(&self, position: Vec2, delta: Vec2, _size: f32) -> Vec2 {
        let mut resolved = position;

        let try_x = Vec2::new(resolved.x + delta.x, resolved.y);
        let (tx, ty) = self.world_to_tile(try_x);
        if !self.is_solid(tx, ty) {
            resolved = try_x;
        }

        let try_y = Vec2::new(resolved.x, resolved.y + delta.y);
        let (tx, ty) = self.world_to_tile(try_y);
        if !self.is_solid(tx, ty) {
            resolved = try_y;
        }

        resolved
    }
}
