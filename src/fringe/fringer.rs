//! Fringe tile synthesis.
//!
//! For a given tile the fringer walks the eight neighbors, accumulates a
//! direction bitmask per foreign terrain type that fringes onto it, maps the
//! bitmask to fringe tile indexes (decomposing illegal patterns into
//! contiguous runs), and composites the pieces into one [`FringeTile`].
//! Composites are cached by their component-key sequence under weak
//! references, so identical transitions anywhere in the scene share one
//! image.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use bevy::log::warn;
use bitflags::bitflags;

use crate::coords::tile_hash;
use crate::fringe::FringeConfig;
use crate::scene::SparseSceneStore;
use crate::surface::{RgbaSurface, compose_masked};
use crate::tile::{TileKey, tileset_of};
use crate::tileset::TileSource;

bitflags! {
  /// Neighbor directions contributing fringe coverage to a tile.
  #[derive(Clone, Copy, Debug, PartialEq, Eq)]
  pub struct FringeBits: u8 {
    const NORTH = 1 << 0;
    const NORTHEAST = 1 << 1;
    const EAST = 1 << 2;
    const SOUTHEAST = 1 << 3;
    const SOUTH = 1 << 4;
    const SOUTHWEST = 1 << 5;
    const WEST = 1 << 6;
    const NORTHWEST = 1 << 7;
  }
}

const NUM_FRINGE_BITS: u32 = 8;

const N: u8 = FringeBits::NORTH.bits();
const NE: u8 = FringeBits::NORTHEAST.bits();
const E: u8 = FringeBits::EAST.bits();
const SE: u8 = FringeBits::SOUTHEAST.bits();
const S: u8 = FringeBits::SOUTH.bits();
const SW: u8 = FringeBits::SOUTHWEST.bits();
const W: u8 = FringeBits::WEST.bits();
const NW: u8 = FringeBits::NORTHWEST.bits();

/// Which fringe bits a neighbor at offset `(dx, dy)` switches on, indexed
/// `[dy + 1][dx + 1]`. A neighbor on a cardinal edge influences that edge
/// and both adjoining corners; a diagonal neighbor influences its corner
/// only.
const FLAG_MATRIX: [[u8; 3]; 3] = [
  [NE, NE | E | SE, SE],
  [NW | N | NE, 0, SE | S | SW],
  [NW, NW | W | SW, SW],
];

/// The 17 bit patterns for which a single fringe tile exists, in tileset
/// index order: the four corners and cardinal edges, the four "L" wraps, the
/// four three-quarter surrounds, and full surround.
const FRINGE_TILES: [u8; 17] = [
  SE,
  SW | S | SE,
  SW,
  NE | E | SE,
  NW | W | SW,
  NE,
  NW | N | NE,
  NW,
  SW | W | NW | N | NE,
  NW | N | NE | E | SE,
  NW | W | SW | S | SE,
  SW | S | SE | E | NE,
  NE | N | NW | W | SW | S | SE,
  SE | E | NE | N | NW | W | SW,
  SW | S | SE | E | NE | N | NW,
  NW | W | SW | S | SE | E | NE,
  N | NE | E | SE | S | SW | W | NW,
];

/// Reverse map from bit pattern to fringe tile index; -1 = no single tile.
const BITS_TO_INDEX: [i8; 256] = build_bits_to_index();

const fn build_bits_to_index() -> [i8; 256] {
  let mut table = [-1i8; 256];
  let mut i = 0;
  while i < FRINGE_TILES.len() {
    table[FRINGE_TILES[i] as usize] = i as i8;
    i += 1;
  }
  table
}

/// A synthesized terrain transition tile.
#[derive(Clone, Debug)]
pub struct FringeTile {
  /// Packed keys of the component tiles, in draw order:
  /// `(baseset << 32) | (fringeset << 16) | index`.
  pub key: Box<[u64]>,
  /// False when an impassable neighbor fringes onto this tile.
  pub passable: bool,
  pub image: Arc<RgbaSurface>,
}

impl PartialEq for FringeTile {
  fn eq(&self, other: &Self) -> bool {
    self.passable == other.passable && self.key == other.key
  }
}

impl Eq for FringeTile {}

/// One foreign terrain type fringing onto the tile under consideration.
struct FringerRec {
  baseset: i32,
  priority: i32,
  bits: u8,
}

/// Computes and caches fringe tiles for one scene's terrain.
pub struct Fringer {
  config: FringeConfig,
  fringes: HashMap<(Box<[u64]>, bool), Weak<FringeTile>>,
  masks: HashMap<u64, Arc<RgbaSurface>>,
}

impl Fringer {
  pub fn new(config: FringeConfig) -> Self {
    Self {
      config,
      fringes: HashMap::new(),
      masks: HashMap::new(),
    }
  }

  #[inline]
  pub fn config(&self) -> &FringeConfig {
    &self.config
  }

  /// Computes the fringe tile for the given coordinate, or None when no
  /// neighbor fringes onto it.
  pub fn fringe_tile(
    &mut self,
    scene: &SparseSceneStore,
    col: i32,
    row: i32,
    tiles: &dyn TileSource,
  ) -> Option<Arc<FringeTile>> {
    let underset = scene.terrain(col, row).map_or(-1, tileset_of);

    let mut fringers: Vec<FringerRec> = Vec::new();
    let mut passable = true;

    for y in (row - 1)..(row + 2) {
      for x in (col - 1)..(col + 2) {
        if x == col && y == row {
          continue;
        }

        let btid = scene.terrain(x, y).unwrap_or(0);
        let baseset = if btid > 0 {
          tileset_of(btid)
        } else {
          scene.default_tile_set()
        };

        let Some(priority) = self.config.fringes_on(baseset, underset) else {
          continue;
        };

        let bits = FLAG_MATRIX[(y - row + 1) as usize][(x - col + 1) as usize];
        match fringers.iter_mut().find(|f| f.baseset == baseset) {
          Some(rec) => rec.bits |= bits,
          None => fringers.push(FringerRec {
            baseset,
            priority,
            bits,
          }),
        }

        // an impassable neighbor fringing onto us poisons passability, but
        // default-set neighbors never count against us
        if passable && btid > 0 {
          match tiles.base_tile(btid) {
            Ok(bt) => passable = bt.passable,
            Err(err) => {
              warn!("unable to check fringer passability [tile_id={btid}, error={err}]");
            }
          }
        }
      }
    }

    if fringers.is_empty() {
      return None;
    }

    // higher priority fringers draw first; ties keep discovery order
    fringers.sort_by(|a, b| b.priority.cmp(&a.priority));

    Some(self.compose(&fringers, tile_hash(col, row), passable, tiles))
  }

  fn compose(
    &mut self,
    fringers: &[FringerRec],
    hash: u32,
    passable: bool,
    tiles: &dyn TileSource,
  ) -> Arc<FringeTile> {
    // the identity of the composite is the key sequence of its components
    let mut keys: Vec<u64> = Vec::new();
    for fringer in fringers {
      let Some(tsr) = self.config.fringe_for(fringer.baseset, hash) else {
        continue;
      };
      let fringeset = tsr.tileset;
      for index in fringe_indexes(fringer.bits) {
        keys.push(pack_key(fringer.baseset, fringeset, index));
      }
    }
    let key = keys.into_boxed_slice();

    let cache_key = (key.clone(), passable);
    if let Some(cached) = self.fringes.get(&cache_key).and_then(Weak::upgrade) {
      return cached;
    }

    let mut img: Option<RgbaSurface> = None;
    for fringer in fringers {
      let Some(tsr) = self.config.fringe_for(fringer.baseset, hash) else {
        continue;
      };
      let tsr = tsr.clone();
      for index in fringe_indexes(fringer.bits) {
        let stamp = if tsr.mask {
          self.masked_image(fringer.baseset, tsr.tileset, index, tiles)
        } else {
          tiles
            .tile_image(&TileKey::new(tsr.tileset, index as u16))
            .map_err(|err| {
              warn!(
                "missing fringe tile [tileset={}, index={index}, error={err}]",
                tsr.tileset
              );
            })
            .ok()
        };
        if let Some(stamp) = stamp {
          let target = img.get_or_insert_with(|| RgbaSurface::clear(stamp.width(), stamp.height()));
          target.stamp(&stamp);
        }
      }
    }

    let image = match img {
      Some(img) => Arc::new(img),
      None => {
        warn!("fringe composite produced no image [key={key:?}]");
        Arc::new(RgbaSurface::clear(0, 0))
      }
    };

    let tile = Arc::new(FringeTile {
      key,
      passable,
      image,
    });
    // reclaimed composites leave dead weak entries behind; sweep them out
    // before growing the map
    self.fringes.retain(|_, weak| weak.strong_count() > 0);
    self.fringes.insert(cache_key, Arc::downgrade(&tile));
    tile
  }

  /// Returns (building and caching on first use) the image for a mask-style
  /// fringe piece: the fringe tile's alpha shape filled with the base
  /// tileset's texture.
  fn masked_image(
    &mut self,
    baseset: i32,
    fringeset: i32,
    index: u8,
    tiles: &dyn TileSource,
  ) -> Option<Arc<RgbaSurface>> {
    let mask_key = pack_key(baseset, fringeset, index);
    if let Some(mask) = self.masks.get(&mask_key) {
      return Some(mask.clone());
    }

    let built = tiles
      .raw_tile_image(&TileKey::new(fringeset, index as u16))
      .and_then(|fsrc| {
        tiles
          .raw_tile_image(&TileKey::new(baseset, 0))
          .map(|bsrc| compose_masked(&fsrc, &bsrc))
      });
    match built {
      Ok(mask) => {
        let mask = Arc::new(mask);
        self.masks.insert(mask_key, mask.clone());
        Some(mask)
      }
      Err(err) => {
        warn!(
          "unable to build fringe mask [baseset={baseset}, fringeset={fringeset}, \
           index={index}, error={err}]"
        );
        None
      }
    }
  }
}

#[inline]
fn pack_key(baseset: i32, fringeset: i32, index: u8) -> u64 {
  ((baseset as u64) << 32) | ((fringeset as u64) << 16) | index as u64
}

/// Maps a fringe bitmask to the tile indexes that cover it. A legal pattern
/// maps to one index; anything else is split into contiguous runs of set
/// bits (scanning circularly from the first clear bit) and each legal run
/// contributes an index. Runs with no matching tile are dropped.
fn fringe_indexes(bits: u8) -> Vec<u8> {
  let index = BITS_TO_INDEX[bits as usize];
  if index != -1 {
    return vec![index as u8];
  }

  // find a clear bit to anchor the circular scan
  let start = (0..NUM_FRINGE_BITS).find(|&b| bits & (1 << b) == 0);
  let Some(start) = start else {
    // unreachable in practice: all-set maps directly
    return Vec::new();
  };

  let mut indexes = Vec::new();
  let mut run: u8 = 0;
  let flush = |run: &mut u8, indexes: &mut Vec<u8>| {
    if *run != 0 {
      let idx = BITS_TO_INDEX[*run as usize];
      if idx != -1 {
        indexes.push(idx as u8);
      }
      *run = 0;
    }
  };

  let mut i = (start + 1) % NUM_FRINGE_BITS;
  while i != start {
    if bits & (1 << i) != 0 {
      run |= 1 << i;
    } else {
      flush(&mut run, &mut indexes);
    }
    i = (i + 1) % NUM_FRINGE_BITS;
  }
  flush(&mut run, &mut indexes);

  indexes
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fringe::{FringeRecord, FringeSetRecord};
  use crate::surface::Rgba;
  use crate::tile::{BaseTile, compose};
  use crate::tileset::TileError;
  use std::cell::Cell;

  #[test]
  fn reverse_map_matches_table() {
    for (i, &bits) in FRINGE_TILES.iter().enumerate() {
      assert_eq!(BITS_TO_INDEX[bits as usize], i as i8);
    }
    assert_eq!(BITS_TO_INDEX[(N | S) as usize], -1);
  }

  #[test]
  fn legal_pattern_maps_directly() {
    assert_eq!(fringe_indexes(SE), vec![0]);
    assert_eq!(fringe_indexes(N | NE | E | SE | S | SW | W | NW), vec![16]);
  }

  #[test]
  fn illegal_pattern_splits_into_runs() {
    // NE|E|SE and SW are separated by clear S and N bits
    let got = fringe_indexes(NE | E | SE | SW);
    assert_eq!(got, vec![3, 2]);
  }

  #[test]
  fn unresolvable_runs_drop_silently() {
    // lone N and lone S are not fringe tiles
    assert!(fringe_indexes(N | S).is_empty());
  }

  #[test]
  fn runs_wrap_circularly() {
    // SE stands alone; SW|W|NW|N|NE is one run wrapping past the high bit
    let got = fringe_indexes(SE | SW | W | NW | N | NE);
    assert_eq!(got, vec![0, 8]);
  }

  /// Tile source where every tileset exists except id 99, tiles are 4x4 and
  /// colored by tileset id, and even tile ids are impassable.
  struct TestTiles {
    raw_lookups: Cell<u32>,
  }

  impl TestTiles {
    fn new() -> Self {
      Self {
        raw_lookups: Cell::new(0),
      }
    }

    fn image_for(&self, tileset: i32) -> Arc<RgbaSurface> {
      let shade = (tileset & 0xFF) as u8;
      Arc::new(RgbaSurface::filled(4, 4, Rgba::new(shade, shade, shade, 255)))
    }
  }

  impl TileSource for TestTiles {
    fn base_tile(&self, fq_tile_id: i32) -> Result<BaseTile, TileError> {
      let tileset = tileset_of(fq_tile_id);
      if tileset == 99 {
        return Err(TileError::NoSuchTileSet(tileset));
      }
      Ok(BaseTile {
        image: self.image_for(tileset),
        passable: fq_tile_id % 2 != 0,
      })
    }

    fn tile_image(&self, key: &TileKey) -> Result<Arc<RgbaSurface>, TileError> {
      if key.tileset == 99 {
        return Err(TileError::NoSuchTileSet(key.tileset));
      }
      Ok(self.image_for(key.tileset))
    }

    fn raw_tile_image(&self, key: &TileKey) -> Result<Arc<RgbaSurface>, TileError> {
      self.raw_lookups.set(self.raw_lookups.get() + 1);
      self.tile_image(key)
    }
  }

  fn water_config(mask: bool) -> FringeConfig {
    let mut c = FringeConfig::default();
    c.add_record(FringeRecord {
      base: 12,
      priority: 10,
      tilesets: vec![FringeSetRecord { tileset: 30, mask }],
    });
    c
  }

  /// Grass center at `(col, row)` with a water neighbor to the north.
  fn shoreline_scene(col: i32, row: i32) -> SparseSceneStore {
    let mut scene = SparseSceneStore::new(16, 16);
    scene.set_terrain(compose(5, 1), col, row);
    scene.set_terrain(compose(12, 1), col, row - 1);
    scene
  }

  #[test]
  fn no_fringing_neighbors_yields_none() {
    let mut fringer = Fringer::new(water_config(false));
    let tiles = TestTiles::new();
    let mut scene = SparseSceneStore::new(16, 16);
    scene.set_terrain(compose(5, 1), 8, 8);
    assert!(fringer.fringe_tile(&scene, 8, 8, &tiles).is_none());
  }

  #[test]
  fn identical_neighborhoods_share_one_composite() {
    let mut fringer = Fringer::new(water_config(false));
    let tiles = TestTiles::new();

    let a = fringer
      .fringe_tile(&shoreline_scene(3, 3), 3, 3, &tiles)
      .unwrap();
    // same pattern, different place
    let b = fringer
      .fringe_tile(&shoreline_scene(40, 20), 40, 20, &tiles)
      .unwrap();

    assert_eq!(a.key, b.key);
    assert!(Arc::ptr_eq(&a, &b));
    // one edge neighbor covers three contiguous bits: a single legal piece
    assert_eq!(a.key.len(), 1);
  }

  #[test]
  fn composite_reclaimed_once_unreferenced() {
    let mut fringer = Fringer::new(water_config(false));
    let tiles = TestTiles::new();
    let scene = shoreline_scene(3, 3);

    let first = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();
    let key = first.key.clone();
    drop(first);

    // the weak entry is dead; a fresh composite is built with the same key
    let second = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();
    assert_eq!(second.key, key);
  }

  #[test]
  fn dead_cache_entries_swept_on_insert() {
    let tiles = TestTiles::new();
    let mut fringer = Fringer::new(water_config(false));

    let first = fringer
      .fringe_tile(&shoreline_scene(3, 3), 3, 3, &tiles)
      .unwrap();
    drop(first);

    // a different neighborhood (water east, not north) inserts under a new
    // key; the dead entry from the dropped composite must not linger
    let mut scene = SparseSceneStore::new(16, 16);
    scene.set_terrain(compose(5, 1), 3, 3);
    scene.set_terrain(compose(12, 1), 4, 3);
    let second = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();

    assert_eq!(fringer.fringes.len(), 1);
    assert!(fringer.fringes.values().all(|w| w.strong_count() > 0));
    drop(second);
  }

  #[test]
  fn impassable_fringing_neighbor_poisons_passability() {
    let tiles = TestTiles::new();

    // odd tile id: passable water neighbor
    let mut fringer = Fringer::new(water_config(false));
    let passable = fringer
      .fringe_tile(&shoreline_scene(3, 3), 3, 3, &tiles)
      .unwrap();
    assert!(passable.passable);

    // even tile id: impassable water neighbor
    let mut scene = SparseSceneStore::new(16, 16);
    scene.set_terrain(compose(5, 1), 3, 3);
    scene.set_terrain(compose(12, 2), 3, 2);
    let mut fringer = Fringer::new(water_config(false));
    let poisoned = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();
    assert!(!poisoned.passable);
  }

  #[test]
  fn default_set_neighbors_fringe_without_passability_checks() {
    // unset neighbor cells fall back to the default tileset, which fringes
    let tiles = TestTiles::new();
    let mut fringer = Fringer::new(water_config(false));
    let mut scene = SparseSceneStore::new(16, 16);
    scene.set_default_tile_set(12);
    scene.set_terrain(compose(5, 1), 3, 3);
    let fringe = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();
    // all eight neighbors fringe: full surround
    assert_eq!(fringe.key.len(), 1);
    assert!(fringe.passable);
  }

  #[test]
  fn masks_are_cached_across_synthesis() {
    let tiles = TestTiles::new();
    let mut fringer = Fringer::new(water_config(true));
    let scene = shoreline_scene(3, 3);

    let first = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();
    let after_first = tiles.raw_lookups.get();
    assert!(after_first > 0);
    drop(first);

    // resynthesis (weak entry dead) reuses the cached mask
    let _second = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();
    assert_eq!(tiles.raw_lookups.get(), after_first);
  }

  #[test]
  fn higher_priority_fringers_draw_first() {
    let tiles = TestTiles::new();
    let mut config = water_config(false);
    config.add_record(FringeRecord {
      base: 7,
      priority: 20,
      tilesets: vec![FringeSetRecord {
        tileset: 70,
        mask: false,
      }],
    });
    let mut fringer = Fringer::new(config);

    // water north, high-priority rock south
    let mut scene = SparseSceneStore::new(16, 16);
    scene.set_terrain(compose(5, 1), 3, 3);
    scene.set_terrain(compose(12, 1), 3, 2);
    scene.set_terrain(compose(7, 1), 3, 4);

    let fringe = fringer.fringe_tile(&scene, 3, 3, &tiles).unwrap();
    assert_eq!(fringe.key.len(), 2);
    // rock's key (baseset 7) leads the draw order
    assert_eq!(fringe.key[0] >> 32, 7);
    assert_eq!(fringe.key[1] >> 32, 12);
  }
}
