//! Tile identity.
//!
//! A fully-qualified tile id packs a tileset id and a tile index into one
//! `i32`: `(tileset_id << 16) | tile_index`. The id `0` is the no-tile
//! sentinel: terrain cells holding `0` render from the scene's default
//! tileset.

use std::sync::Arc;

use crate::surface::RgbaSurface;

/// Extracts the tileset id from a fully-qualified tile id.
#[inline]
pub fn tileset_of(fq_tile_id: i32) -> i32 {
  fq_tile_id >> 16
}

/// Extracts the tile index from a fully-qualified tile id.
#[inline]
pub fn index_of(fq_tile_id: i32) -> u16 {
  (fq_tile_id & 0xFFFF) as u16
}

/// Packs a tileset id and tile index into a fully-qualified tile id.
#[inline]
pub fn compose(tileset: i32, index: u16) -> i32 {
  (tileset << 16) | index as i32
}

/// Immutable tile lookup key with structural equality, usable as a cache key.
///
/// Carries optional recoloring parameters, opaque to this crate beyond
/// identity: two keys differing only in colorization name different images.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileKey {
  pub tileset: i32,
  pub index: u16,
  pub colorizations: Box<[u32]>,
}

impl TileKey {
  pub fn new(tileset: i32, index: u16) -> Self {
    Self {
      tileset,
      index,
      colorizations: Box::default(),
    }
  }

  pub fn with_colorizations(tileset: i32, index: u16, colorizations: Box<[u32]>) -> Self {
    Self {
      tileset,
      index,
      colorizations,
    }
  }

  /// Builds a key from a fully-qualified tile id.
  pub fn from_fq(fq_tile_id: i32) -> Self {
    Self::new(tileset_of(fq_tile_id), index_of(fq_tile_id))
  }
}

/// A resolved terrain tile: its image plus traversability.
#[derive(Clone, Debug)]
pub struct BaseTile {
  pub image: Arc<RgbaSurface>,
  pub passable: bool,
}
