//! Host-supplied tile lookup.
//!
//! The crate never decodes tile art itself; the host implements
//! [`TileSource`] to deliver tile images and terrain metadata. Lookup
//! failures surface as [`TileError`] so callers can decide whether to skip a
//! stamp or report the problem.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::surface::RgbaSurface;
use crate::tile::{BaseTile, TileKey};

/// Tile lookup failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TileError {
  /// No tileset is registered under this id.
  NoSuchTileSet(i32),
  /// The tileset exists but holds no tile at this index.
  NoSuchTile { tileset: i32, index: u16 },
}

impl fmt::Display for TileError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TileError::NoSuchTileSet(id) => write!(f, "no such tileset: {id}"),
      TileError::NoSuchTile { tileset, index } => {
        write!(f, "no tile {index} in tileset {tileset}")
      }
    }
  }
}

impl Error for TileError {}

/// Source of tile images and terrain metadata, implemented by the host.
pub trait TileSource {
  /// Resolves a fully-qualified terrain tile id to its image and
  /// passability.
  fn base_tile(&self, fq_tile_id: i32) -> Result<BaseTile, TileError>;

  /// Returns the image for a tile, ready to draw.
  fn tile_image(&self, key: &TileKey) -> Result<Arc<RgbaSurface>, TileError>;

  /// Returns the undecorated image for a tile, used as mask input when
  /// cutting a base texture to a fringe shape.
  fn raw_tile_image(&self, key: &TileKey) -> Result<Arc<RgbaSurface>, TileError>;
}
