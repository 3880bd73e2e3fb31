//! Coordinate types and spatial helpers.
//!
//! Defines the tile coordinate system for isometric scenes:
//! - Tile coordinates are `(col, row)` pairs of `i32`; the grid is unbounded
//!   in all four directions from an arbitrary origin.
//! - [`TileRect`]: axis-aligned tile rectangle used for region queries.
//! - [`tile_hash`]: deterministic per-coordinate hash for visual variation.

/// An axis-aligned rectangle in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRect {
  pub x: i32,
  pub y: i32,
  pub width: i32,
  pub height: i32,
}

impl TileRect {
  /// Creates a new tile rectangle.
  pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// Returns true if the rectangle covers no tiles.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.width <= 0 || self.height <= 0
  }

  /// Returns true if the given tile coordinate is within this rectangle.
  #[inline]
  pub fn contains(&self, col: i32, row: i32) -> bool {
    col >= self.x && col < self.x + self.width && row >= self.y && row < self.y + self.height
  }

  /// Returns the intersection of two rectangles, or None if they don't
  /// overlap.
  pub fn intersection(&self, other: &TileRect) -> Option<TileRect> {
    let x1 = self.x.max(other.x);
    let y1 = self.y.max(other.y);
    let x2 = (self.x + self.width).min(other.x + other.width);
    let y2 = (self.y + self.height).min(other.y + other.height);

    if x1 < x2 && y1 < y2 {
      Some(TileRect::new(x1, y1, x2 - x1, y2 - y1))
    } else {
      None
    }
  }
}

/// Returns a deterministic hash for a tile coordinate.
///
/// Used to pseudo-randomly pick among candidate fringe tilesets so that the
/// same coordinate always yields the same choice. This is a single scramble
/// step of a 48-bit LCG seeded with `col ^ row`, not a general-purpose hash.
pub fn tile_hash(col: i32, row: i32) -> u32 {
  const MULTIPLIER: u64 = 0x5DEE_CE66D;
  const ADDEND: u64 = 0xB;
  const MASK: u64 = (1 << 48) - 1;

  let seed = (((col ^ row) as i64 as u64) ^ MULTIPLIER) & MASK;
  let hash = seed.wrapping_mul(MULTIPLIER).wrapping_add(ADDEND) & MASK;
  (hash >> 16) as u32
}
