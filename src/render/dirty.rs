//! The dirty item list: back-to-front ordering for a frame's renderables.
//!
//! The sort runs in two phases. Three auxiliary orderings (origin-x,
//! origin-y, rear depth) are built first; then items are taken in rear-depth
//! order and positionally inserted into the output, scanning the placed list
//! from its end and inserting each item immediately in front of the
//! rearmost item it must render in front of.
//!
//! The pairwise comparator is not a total order over arbitrary item pairs
//! (painter's-algorithm depth under isometric projection cannot be), which
//! is why items are never handed to a general-purpose sort. The positional
//! insertion only ever asks the questions the comparator answers
//! consistently.

use bevy::log::debug;

/// A dirty sprite: a freely positioned renderable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteRef {
  /// Stable identifier, unique among the frame's sprites; also the final
  /// arbiter when two sprites are otherwise indistinguishable.
  pub id: u64,
  /// Explicit layering among sprites sharing a tile.
  pub render_order: i32,
  /// Screen-space y position, for fine ordering within a tile.
  pub pixel_y: i32,
  /// Footprint width in tiles; 1 for a normal sprite.
  pub base_width: i32,
  /// Footprint height in tiles; 1 for a normal sprite.
  pub base_height: i32,
}

impl SpriteRef {
  #[inline]
  fn is_multi_tile(&self) -> bool {
    self.base_width > 1 || self.base_height > 1
  }
}

/// A dirty scene object occupying a tile footprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRef {
  pub tile_id: i32,
  /// Anchor tile (the footprint's bottom-right corner).
  pub x: i32,
  pub y: i32,
  /// Human-assigned render priority; breaks ties among overlapping objects.
  pub priority: i32,
  pub base_width: i32,
  pub base_height: i32,
}

/// The renderable carried by a dirty item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Renderable {
  Sprite(SpriteRef),
  Object(ObjectRef),
}

/// One entry in the dirty list: a renderable plus its tile footprint.
///
/// `(ox, oy)` is the origin (anchor) tile; `(lx, ly)` and `(rx, ry)` are the
/// leftmost and rightmost corners of the footprint. A single-tile item has
/// all three equal.
#[derive(Clone, Debug, Default)]
pub struct DirtyItem {
  payload: Option<Renderable>,
  pub ox: i32,
  pub oy: i32,
  pub lx: i32,
  pub ly: i32,
  pub rx: i32,
  pub ry: i32,
}

impl DirtyItem {
  fn init(&mut self, payload: Renderable, x: i32, y: i32) {
    self.ox = x;
    self.oy = y;
    self.lx = x;
    self.rx = x;
    self.ly = y;
    self.ry = y;
    let (w, h) = match &payload {
      Renderable::Object(obj) => (obj.base_width, obj.base_height),
      Renderable::Sprite(sprite) => (sprite.base_width, sprite.base_height),
    };
    self.lx -= w - 1;
    self.ry -= h - 1;
    self.payload = Some(payload);
  }

  /// The renderable, present for every item in the list.
  #[inline]
  pub fn renderable(&self) -> Option<&Renderable> {
    self.payload.as_ref()
  }

  /// Depth of the rearmost tile of the footprint.
  #[inline]
  pub fn rear_depth(&self) -> i32 {
    self.ry + self.lx
  }

  /// Explicit render priority; zero for anything but a scene object.
  #[inline]
  pub fn render_priority(&self) -> i32 {
    match &self.payload {
      Some(Renderable::Object(obj)) => obj.priority,
      _ => 0,
    }
  }

  #[inline]
  fn is_sprite(&self) -> bool {
    matches!(self.payload, Some(Renderable::Sprite(_)))
  }

  #[inline]
  fn is_multi_tile_sprite(&self) -> bool {
    matches!(&self.payload, Some(Renderable::Sprite(s)) if s.is_multi_tile())
  }

  /// Whether both items carry the same renderable (same sprite, or an
  /// object with the same tile and anchor).
  fn same_renderable(&self, other: &DirtyItem) -> bool {
    match (&self.payload, &other.payload) {
      (Some(Renderable::Sprite(a)), Some(Renderable::Sprite(b))) => a.id == b.id,
      (Some(Renderable::Object(a)), Some(Renderable::Object(b))) => {
        a.tile_id == b.tile_id && a.x == b.x && a.y == b.y
      }
      _ => false,
    }
  }

  /// Releases the payload so a pooled item holds no stale references.
  fn clear(&mut self) {
    self.payload = None;
  }
}

#[inline]
fn footprints_overlap(a: &DirtyItem, b: &DirtyItem) -> bool {
  a.lx <= b.rx && a.rx >= b.lx && a.ry <= b.ly && a.ly >= b.ry
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Axis {
  X,
  Y,
}

/// Ascending origin coordinate on the given axis; overlapping coordinates
/// fall back to explicit render priority.
fn origin_cmp(a: &DirtyItem, b: &DirtyItem, axis: Axis) -> i32 {
  match axis {
    Axis::X => {
      if a.ox != b.ox {
        return a.ox - b.ox;
      }
    }
    Axis::Y => {
      if a.oy != b.oy {
        return a.oy - b.oy;
      }
    }
  }
  a.render_priority() - b.render_priority()
}

/// Ascending rear depth; equal depths between two scene objects break on
/// explicit priority.
fn rear_depth_cmp(a: &DirtyItem, b: &DirtyItem) -> i32 {
  let diff = a.rear_depth() - b.rear_depth();
  if diff != 0 {
    return diff;
  }
  if matches!(a.payload, Some(Renderable::Object(_)))
    && matches!(b.payload, Some(Renderable::Object(_)))
  {
    let pri = a.render_priority() - b.render_priority();
    if pri != 0 {
      return pri;
    }
  }
  diff
}

/// Collects the frame's dirty renderables and sorts them into paint order.
///
/// Items are pooled: [`paint_and_clear`](Self::paint_and_clear) and
/// [`clear`](Self::clear) return them to a free list for the next frame.
#[derive(Default)]
pub struct DirtyItemList {
  /// Item storage; indices are stable for the lifetime of a frame.
  items: Vec<DirtyItem>,
  /// Paint order: insertion order until [`sort`](Self::sort) rebuilds it.
  order: Vec<usize>,
  /// Scratch views sorted by origin-x, origin-y and rear depth.
  xorder: Vec<usize>,
  yorder: Vec<usize>,
  dorder: Vec<usize>,
  free: Vec<DirtyItem>,
}

impl DirtyItemList {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a dirty sprite at the given tile position.
  pub fn append_sprite(&mut self, sprite: SpriteRef, tx: i32, ty: i32) {
    self.append(Renderable::Sprite(sprite), tx, ty);
  }

  /// Appends a dirty scene object.
  pub fn append_object(&mut self, object: ObjectRef) {
    let (x, y) = (object.x, object.y);
    self.append(Renderable::Object(object), x, y);
  }

  fn append(&mut self, payload: Renderable, x: i32, y: i32) {
    let mut item = self.free.pop().unwrap_or_default();
    item.init(payload, x, y);
    self.order.push(self.items.len());
    self.items.push(item);
  }

  /// The number of items in the list.
  #[inline]
  pub fn len(&self) -> usize {
    self.items.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Items available for reuse.
  #[inline]
  pub fn pool_size(&self) -> usize {
    self.free.len()
  }

  /// The item at the given position in the current order.
  pub fn get(&self, pos: usize) -> Option<&DirtyItem> {
    self.order.get(pos).map(|&idx| &self.items[idx])
  }

  /// Sorts the items into proper back-to-front paint order.
  pub fn sort(&mut self) {
    let size = self.items.len();
    debug!("sorting dirty item list [size={size}]");
    if size <= 1 {
      return;
    }

    self.xorder.clear();
    self.xorder.extend(0..size);
    self
      .xorder
      .sort_by(|&a, &b| origin_cmp(&self.items[a], &self.items[b], Axis::X).cmp(&0));

    self.yorder.clear();
    self.yorder.extend(0..size);
    self
      .yorder
      .sort_by(|&a, &b| origin_cmp(&self.items[a], &self.items[b], Axis::Y).cmp(&0));

    self.dorder.clear();
    self.dorder.extend(0..size);
    self
      .dorder
      .sort_by(|&a, &b| rear_depth_cmp(&self.items[a], &self.items[b]).cmp(&0));

    // walk the rear-depth ordering, inserting each item immediately after
    // the rearmost already-placed item it renders in front of
    self.order.clear();
    'pos: for ii in 0..size {
      let idx = self.dorder[ii];
      for rr in (0..self.order.len()).rev() {
        let placed = self.order[rr];
        if self.render_compare(idx, placed) > 0 {
          self.order.insert(rr + 1, idx);
          continue 'pos;
        }
      }
      // renders in front of nothing placed so far
      self.order.insert(0, idx);
    }
  }

  /// Visits every item in paint order, then clears the list, returning the
  /// items to the free pool.
  pub fn paint_and_clear(&mut self, mut paint: impl FnMut(&DirtyItem)) {
    for &idx in &self.order {
      paint(&self.items[idx]);
    }
    self.release_all();
  }

  /// Clears the list without painting.
  pub fn clear(&mut self) {
    self.release_all();
  }

  fn release_all(&mut self) {
    for mut item in self.items.drain(..) {
      item.clear();
      self.free.push(item);
    }
    self.order.clear();
    self.xorder.clear();
    self.yorder.clear();
    self.dorder.clear();
  }

  /// The pairwise render comparator: positive when `a` renders in front of
  /// `b`, negative when behind.
  fn render_compare(&self, a: usize, b: usize) -> i32 {
    let (da, db) = (&self.items[a], &self.items[b]);

    // overlapping scene objects order purely by assigned priority
    if let (Some(Renderable::Object(oa)), Some(Renderable::Object(ob))) =
      (&da.payload, &db.payload)
    {
      if footprints_overlap(da, db) {
        return oa.priority - ob.priority;
      }
    }

    let result = self.compare_partitioned(Axis::Y, a, b);
    if result != 0 {
      return result;
    }
    let result = self.compare_partitioned(Axis::X, a, b);
    if result != 0 {
      return result;
    }

    compare_non_partitioned(da, db)
  }

  /// Looks for a scene object strictly between `a` and `b` on the given
  /// axis whose footprint spans the space separating them, fully occluding
  /// one from the other. Returns the forced ordering, or 0 when no
  /// partitioner exists.
  fn compare_partitioned(&self, axis: Axis, a: usize, b: usize) -> i32 {
    let (mut a, mut b) = (a, b);
    let mut swapped = false;
    let sitems = match axis {
      Axis::X => {
        if self.items[a].ox == self.items[b].ox {
          // no space between them to partition
          return 0;
        }
        if self.items[a].ox > self.items[b].ox {
          std::mem::swap(&mut a, &mut b);
          swapped = true;
        }
        &self.xorder
      }
      Axis::Y => {
        if self.items[a].oy == self.items[b].oy {
          return 0;
        }
        if self.items[a].oy > self.items[b].oy {
          std::mem::swap(&mut a, &mut b);
          swapped = true;
        }
        &self.yorder
      }
    };

    let (da, db) = (&self.items[a], &self.items[b]);
    let apos = sitems
      .binary_search_by(|&p| origin_cmp(&self.items[p], da, axis).cmp(&0))
      .unwrap_or_else(|ins| ins);
    let bpos = sitems
      .binary_search_by(|&p| origin_cmp(&self.items[p], db, axis).cmp(&0))
      .unwrap_or_else(|ins| ins);

    for &pidx in sitems.iter().take(bpos).skip(apos + 1) {
      let dp = &self.items[pidx];
      if dp.is_sprite() {
        // sprites never partition
        continue;
      }
      if dp.same_renderable(da) || dp.same_renderable(db) {
        continue;
      }

      let partitions = match axis {
        Axis::X => {
          dp.ly >= da.ry && dp.ry <= db.ly && dp.lx >= da.rx && dp.rx <= db.lx
        }
        Axis::Y => {
          dp.lx <= db.ox && dp.rx >= da.lx && dp.ry >= da.oy && dp.oy <= db.ry
        }
      };
      if partitions {
        return if swapped { 1 } else { -1 };
      }
    }

    0
  }
}

/// Orders two items with no partitioning object between them.
fn compare_non_partitioned(da: &DirtyItem, db: &DirtyItem) -> i32 {
  if da.ox == db.ox && da.oy == db.oy {
    if da.same_renderable(db) {
      return 0;
    }

    match (&da.payload, &db.payload) {
      (Some(Renderable::Sprite(a)), Some(Renderable::Sprite(b))) => {
        // sprites sharing a tile: explicit order, then screen height, then
        // a stable arbitrary ordering
        let rocomp = a.render_order - b.render_order;
        if rocomp != 0 {
          return rocomp;
        }
        let ydiff = a.pixel_y - b.pixel_y;
        if ydiff != 0 {
          return ydiff;
        }
        return if a.id > b.id { 1 } else { -1 };
      }
      // a sprite always paints over a non-sprite on its tile
      (Some(Renderable::Sprite(_)), _) => return 1,
      (_, Some(Renderable::Sprite(_))) => return -1,
      _ => {}
    }
  }

  // an overlapping multi-tile sprite orders by explicit render order when
  // that distinguishes the pair
  if (da.is_multi_tile_sprite() || db.is_multi_tile_sprite()) && footprints_overlap(da, db) {
    let a_order = match &da.payload {
      Some(Renderable::Sprite(s)) => s.render_order,
      _ => 0,
    };
    let b_order = match &db.payload {
      Some(Renderable::Sprite(s)) => s.render_order,
      _ => 0,
    };
    let rocomp = a_order - b_order;
    if rocomp != 0 {
      return rocomp;
    }
  }

  // fixed diagonal rule for non-overlappers: entirely behind-and-left
  // renders first
  if db.lx <= da.ox && db.ry <= da.oy {
    1
  } else if db.rx >= da.lx && db.ly >= da.ry {
    -1
  } else {
    da.oy - db.oy
  }
}
