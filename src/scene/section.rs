//! A fixed-size rectangular chunk of scene data.

use bevy::log::warn;

use crate::coords::TileRect;
use crate::object::ObjectInfo;

/// One section of a sparse scene: a `width × height` block of terrain ids
/// anchored at `(x, y)`, plus the objects anchored inside it.
///
/// Uninteresting objects are stored in three parallel vectors; interesting
/// objects keep their full [`ObjectInfo`] record.
#[derive(Clone, Debug)]
pub struct Section {
  x: i32,
  y: i32,
  width: i32,
  height: i32,
  /// Row-major terrain tile ids; 0 means "no explicit tile".
  terrain: Box<[i32]>,
  object_tiles: Vec<i32>,
  object_xs: Vec<i32>,
  object_ys: Vec<i32>,
  objects: Vec<ObjectInfo>,
}

impl Section {
  /// Creates an empty section anchored at `(x, y)`.
  pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
    Self {
      x,
      y,
      width,
      height,
      terrain: vec![0; (width * height) as usize].into_boxed_slice(),
      object_tiles: Vec::new(),
      object_xs: Vec::new(),
      object_ys: Vec::new(),
      objects: Vec::new(),
    }
  }

  #[inline]
  pub fn x(&self) -> i32 {
    self.x
  }

  #[inline]
  pub fn y(&self) -> i32 {
    self.y
  }

  #[inline]
  pub fn width(&self) -> i32 {
    self.width
  }

  #[inline]
  pub fn height(&self) -> i32 {
    self.height
  }

  /// Returns the terrain tile id at the given absolute coordinate, or 0 for
  /// an unset cell. Out-of-bounds requests log a warning and return 0.
  pub fn terrain(&self, col: i32, row: i32) -> i32 {
    match self.cell(col, row) {
      Some(idx) => self.terrain[idx],
      None => {
        warn!(
          "terrain request outside section [sx={}, sy={}, col={col}, row={row}]",
          self.x, self.y
        );
        0
      }
    }
  }

  /// Sets the terrain tile id at the given absolute coordinate.
  /// Out-of-bounds requests log a warning and change nothing.
  pub fn set_terrain(&mut self, fq_tile_id: i32, col: i32, row: i32) {
    match self.cell(col, row) {
      Some(idx) => self.terrain[idx] = fq_tile_id,
      None => warn!(
        "terrain update outside section [sx={}, sy={}, col={col}, row={row}]",
        self.x, self.y
      ),
    }
  }

  fn cell(&self, col: i32, row: i32) -> Option<usize> {
    if col < self.x || col >= self.x + self.width || row < self.y || row >= self.y + self.height {
      None
    } else {
      Some(((row - self.y) * self.width + (col - self.x)) as usize)
    }
  }

  /// Adds an object to this section. Refuses duplicates (same tile id and
  /// anchor, in either substructure) with a warning and returns false.
  pub fn add_object(&mut self, info: ObjectInfo) -> bool {
    if self.index_of_plain(info.tile_id, info.x, info.y).is_some()
      || self.objects.contains(&info)
    {
      warn!(
        "refusing duplicate object [tile_id={}, x={}, y={}]",
        info.tile_id, info.x, info.y
      );
      return false;
    }
    if info.is_interesting() {
      self.objects.push(info);
    } else {
      self.object_tiles.push(info.tile_id);
      self.object_xs.push(info.x);
      self.object_ys.push(info.y);
    }
    true
  }

  /// Removes the object matching `info`'s identity from whichever
  /// substructure holds it. Returns false if it was not present.
  pub fn remove_object(&mut self, info: &ObjectInfo) -> bool {
    if let Some(idx) = self.index_of_plain(info.tile_id, info.x, info.y) {
      self.object_tiles.remove(idx);
      self.object_xs.remove(idx);
      self.object_ys.remove(idx);
      return true;
    }
    if let Some(idx) = self.objects.iter().position(|o| o == info) {
      self.objects.remove(idx);
      return true;
    }
    false
  }

  fn index_of_plain(&self, tile_id: i32, x: i32, y: i32) -> Option<usize> {
    (0..self.object_tiles.len()).find(|&i| {
      self.object_tiles[i] == tile_id && self.object_xs[i] == x && self.object_ys[i] == y
    })
  }

  /// Appends every object anchored inside `region` to `out`.
  pub fn collect_objects(&self, region: &TileRect, out: &mut Vec<ObjectInfo>) {
    for i in 0..self.object_tiles.len() {
      if region.contains(self.object_xs[i], self.object_ys[i]) {
        out.push(ObjectInfo::new(
          self.object_tiles[i],
          self.object_xs[i],
          self.object_ys[i],
        ));
      }
    }
    for obj in &self.objects {
      if region.contains(obj.x, obj.y) {
        out.push(obj.clone());
      }
    }
  }

  /// Visits every object in this section. With `interesting_only`, plain
  /// decorative objects are skipped.
  pub fn visit_objects(&self, interesting_only: bool, f: &mut dyn FnMut(&ObjectInfo)) {
    if !interesting_only {
      for i in 0..self.object_tiles.len() {
        f(&ObjectInfo::new(
          self.object_tiles[i],
          self.object_xs[i],
          self.object_ys[i],
        ));
      }
    }
    for obj in &self.objects {
      f(obj);
    }
  }

  /// Returns true if this section holds no terrain and no objects.
  pub fn is_blank(&self) -> bool {
    self.object_tiles.is_empty()
      && self.objects.is_empty()
      && self.terrain.iter().all(|&id| id == 0)
  }
}
