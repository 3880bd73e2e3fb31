//! The sparse, section-partitioned scene store.

use std::collections::HashMap;

use bevy::prelude::Component;

use crate::coords::TileRect;
use crate::object::ObjectInfo;
use crate::scene::Section;

/// Maximum footprint dimension of an object tile, in tiles. Region queries
/// pad their section enumeration by this much so no owning section is
/// skipped at the region edge.
const MAX_OBJECT_FOOTPRINT: i32 = 4;

/// Sparse isometric scene: terrain and objects partitioned into fixed-size
/// sections, created on demand and absent where the scene holds no data.
///
/// Single-writer: mutation is expected from one owner at a time (in an ECS
/// this falls out of `&mut` component access).
#[derive(Component, Clone, Debug)]
pub struct SparseSceneStore {
  swidth: i32,
  sheight: i32,
  default_tile_set: i32,
  sections: HashMap<i32, Section>,
}

impl SparseSceneStore {
  /// Creates an empty store with the given section dimensions.
  pub fn new(section_width: i32, section_height: i32) -> Self {
    Self {
      swidth: section_width,
      sheight: section_height,
      default_tile_set: 0,
      sections: HashMap::new(),
    }
  }

  #[inline]
  pub fn section_width(&self) -> i32 {
    self.swidth
  }

  #[inline]
  pub fn section_height(&self) -> i32 {
    self.sheight
  }

  /// Tileset used to render terrain cells holding no explicit tile.
  #[inline]
  pub fn default_tile_set(&self) -> i32 {
    self.default_tile_set
  }

  pub fn set_default_tile_set(&mut self, tileset: i32) {
    self.default_tile_set = tileset;
  }

  /// Packs a tile coordinate's section indices into the section key.
  fn key(&self, col: i32, row: i32) -> i32 {
    let sx = col.div_euclid(self.swidth);
    let sy = row.div_euclid(self.sheight);
    (sx << 16) | (sy & 0xFFFF)
  }

  fn section(&self, col: i32, row: i32) -> Option<&Section> {
    self.sections.get(&self.key(col, row))
  }

  fn section_mut(&mut self, col: i32, row: i32) -> &mut Section {
    let key = self.key(col, row);
    let (swidth, sheight) = (self.swidth, self.sheight);
    self.sections.entry(key).or_insert_with(|| {
      Section::new(
        col.div_euclid(swidth) * swidth,
        row.div_euclid(sheight) * sheight,
        swidth,
        sheight,
      )
    })
  }

  /// Returns the terrain tile id at a coordinate, or None where no section
  /// exists. An unset cell inside an existing section reads as `Some(0)`.
  pub fn terrain(&self, col: i32, row: i32) -> Option<i32> {
    self.section(col, row).map(|s| s.terrain(col, row))
  }

  /// Sets the terrain tile at a coordinate, creating its section on demand.
  pub fn set_terrain(&mut self, fq_tile_id: i32, col: i32, row: i32) {
    self.section_mut(col, row).set_terrain(fq_tile_id, col, row);
  }

  /// Adds an object to the section owning its anchor. Returns false (and
  /// leaves the scene unchanged) if an identical object is already present.
  pub fn add_object(&mut self, info: ObjectInfo) -> bool {
    let (x, y) = (info.x, info.y);
    self.section_mut(x, y).add_object(info)
  }

  /// Removes an object. Returns false if no matching object exists.
  pub fn remove_object(&mut self, info: &ObjectInfo) -> bool {
    let key = self.key(info.x, info.y);
    match self.sections.get_mut(&key) {
      Some(sec) => sec.remove_object(info),
      None => false,
    }
  }

  /// Replaces an object's record: removes `from` and adds `to`, which may
  /// live in a different section. Not atomic; a failed add after a
  /// successful remove leaves the object absent.
  pub fn update_object(&mut self, from: &ObjectInfo, to: ObjectInfo) -> bool {
    self.remove_object(from) && self.add_object(to)
  }

  /// Returns every object whose anchor lies within `region`. Callers wanting
  /// objects whose images overhang into the region pad `region` themselves.
  pub fn objects_in(&self, region: &TileRect) -> Vec<ObjectInfo> {
    let mut out = Vec::new();
    if region.is_empty() {
      return out;
    }
    // pad the section walk only; anchors are matched against the exact region
    let padded = TileRect::new(
      region.x - MAX_OBJECT_FOOTPRINT,
      region.y - MAX_OBJECT_FOOTPRINT,
      region.width + 2 * MAX_OBJECT_FOOTPRINT,
      region.height + 2 * MAX_OBJECT_FOOTPRINT,
    );
    let min_x = padded.x.div_euclid(self.swidth) * self.swidth;
    let min_y = padded.y.div_euclid(self.sheight) * self.sheight;
    let max_x = padded.x + padded.width;
    let max_y = padded.y + padded.height;
    let mut sy = min_y;
    while sy < max_y {
      let mut sx = min_x;
      while sx < max_x {
        if let Some(sec) = self.section(sx, sy) {
          sec.collect_objects(region, &mut out);
        }
        sx += self.swidth;
      }
      sy += self.sheight;
    }
    out
  }

  /// Visits every object in the scene. With `interesting_only`, plain
  /// decorative objects are skipped.
  pub fn visit_objects(&self, interesting_only: bool, mut f: impl FnMut(&ObjectInfo)) {
    for sec in self.sections.values() {
      sec.visit_objects(interesting_only, &mut f);
    }
  }

  /// Iterates the populated sections, in no particular order.
  pub fn sections(&self) -> impl Iterator<Item = &Section> {
    self.sections.values()
  }

  /// Installs an externally resolved section, replacing any section already
  /// covering the same area. The section's origin and dimensions must match
  /// this store's partitioning.
  pub fn install_section(&mut self, section: Section) {
    let key = self.key(section.x(), section.y());
    self.sections.insert(key, section);
  }

  /// Returns true if a section covering the given coordinate exists.
  pub fn has_section(&self, col: i32, row: i32) -> bool {
    self.sections.contains_key(&self.key(col, row))
  }

  /// Drops sections that hold no data, keeping serialized form compact.
  pub fn prune_blank_sections(&mut self) {
    self.sections.retain(|_, sec| !sec.is_blank());
  }
}
