//! Tile map with walkability.
//!
//! The map is a row-major grid of tiles, each either open or blocked.
//! World positions map to tiles by floor division with the tile size.
//! Everything outside the grid is unwalkable.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};
use crate::stats::Footprint;

/// Walkability grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileMap {
    width: u32,
    height: u32,
    tile_size: u32,
    blocked: Vec<bool>,
}

impl TileMap {
    /// Create a map with every tile open.
    ///
    /// A zero `tile_size` is treated as 1.
    #[must_use]
    pub fn open(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_size: tile_size.max(1),
            blocked: vec![false; width as usize * height as usize],
        }
    }

    /// Create a map with roughly `obstacle_percent` of tiles blocked.
    ///
    /// The layout depends only on the seed.
    #[must_use]
    pub fn scattered(width: u32, height: u32, tile_size: u32, seed: u64, obstacle_percent: u32) -> Self {
        let mut map = Self::open(width, height, tile_size);
        let mut rng = MapRng::new(seed);
        for cell in &mut map.blocked {
            *cell = rng.next_percent() < obstacle_percent;
        }
        map
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile edge length in world units.
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Number of blocked tiles.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Check if a tile is inside the map and open.
    #[must_use]
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| !self.blocked[i])
    }

    /// Block or open a tile. Returns `false` if the tile is out of bounds.
    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.blocked[i] = blocked;
                true
            }
            None => false,
        }
    }

    /// Tile containing a world position.
    #[must_use]
    pub fn tile_at(&self, pos: Vec2Fixed) -> (i32, i32) {
        let size = Fixed::from_num(self.tile_size);
        (
            (pos.x / size).floor().to_num::<i32>(),
            (pos.y / size).floor().to_num::<i32>(),
        )
    }

    /// Check if a world position lies on the map, blocked or not.
    #[must_use]
    pub fn contains(&self, pos: Vec2Fixed) -> bool {
        let (x, y) = self.tile_at(pos);
        self.index(x, y).is_some()
    }

    /// Check if the tile under a world position is walkable.
    #[must_use]
    pub fn is_walkable_at(&self, pos: Vec2Fixed) -> bool {
        let (x, y) = self.tile_at(pos);
        self.is_walkable(x, y)
    }

    /// Check that every tile of a footprint placed at `origin` is walkable.
    #[must_use]
    pub fn footprint_walkable(&self, origin: Vec2Fixed, footprint: Footprint) -> bool {
        let (x0, y0) = self.tile_at(origin);
        let w = i32::try_from(footprint.width).unwrap_or(i32::MAX);
        let h = i32::try_from(footprint.height).unwrap_or(i32::MAX);
        (0..h).all(|dy| (0..w).all(|dx| self.is_walkable(x0 + dx, y0 + dy)))
    }

    /// Open every tile within `radius` tiles (Chebyshev) of a world position.
    pub fn clear_around(&mut self, pos: Vec2Fixed, radius: i32) {
        let (cx, cy) = self.tile_at(pos);
        for y in cy - radius..=cy + radius {
            for x in cx - radius..=cx + radius {
                self.set_blocked(x, y, false);
            }
        }
    }
}

/// Deterministic linear congruential generator for terrain scatter.
struct MapRng {
    state: u64,
}

impl MapRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    /// Uniform-ish value in `0..100`, taken from the high bits.
    fn next_percent(&mut self) -> u32 {
        u32::try_from((self.next() >> 33) % 100).unwrap_or(0)
    }
}
