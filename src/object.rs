//! Scene objects.
//!
//! An object is a multi-tile decoration anchored at a single tile
//! coordinate. Most objects are "uninteresting" (pure decoration) and the
//! scene stores them compactly; objects carrying an action or a render
//! priority override are "interesting" and keep their full record.

use std::hash::{Hash, Hasher};

/// A scene object: an object tile placed at an anchor coordinate.
///
/// Identity (and duplicate detection) is the `(tile_id, x, y)` triple; the
/// action and priority do not participate in equality.
#[derive(Clone, Debug, Default)]
pub struct ObjectInfo {
  /// Fully-qualified object tile id.
  pub tile_id: i32,
  /// Anchor column (the object's bottom-right tile in screen terms).
  pub x: i32,
  /// Anchor row.
  pub y: i32,
  /// Action command fired when the object is activated; empty = none.
  pub action: String,
  /// Render priority override; 0 = natural ordering.
  pub priority: i8,
}

impl ObjectInfo {
  /// Creates a plain (uninteresting) object.
  pub fn new(tile_id: i32, x: i32, y: i32) -> Self {
    Self {
      tile_id,
      x,
      y,
      ..Self::default()
    }
  }

  /// Returns true if this object carries more than its placement and must
  /// be stored as a full record.
  #[inline]
  pub fn is_interesting(&self) -> bool {
    !self.action.is_empty() || self.priority != 0
  }
}

impl PartialEq for ObjectInfo {
  fn eq(&self, other: &Self) -> bool {
    self.tile_id == other.tile_id && self.x == other.x && self.y == other.y
  }
}

impl Eq for ObjectInfo {}

impl Hash for ObjectInfo {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.tile_id.hash(state);
    self.x.hash(state);
    self.y.hash(state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interesting_detection() {
    assert!(!ObjectInfo::new(5, 0, 0).is_interesting());

    let mut obj = ObjectInfo::new(5, 0, 0);
    obj.action = "door:open".into();
    assert!(obj.is_interesting());

    let mut obj = ObjectInfo::new(5, 0, 0);
    obj.priority = -1;
    assert!(obj.is_interesting());
  }

  #[test]
  fn equality_ignores_decorations() {
    let plain = ObjectInfo::new(5, 2, 3);
    let mut decorated = ObjectInfo::new(5, 2, 3);
    decorated.action = "sign:read".into();
    decorated.priority = 4;
    assert_eq!(plain, decorated);
    assert_ne!(plain, ObjectInfo::new(5, 2, 4));
  }
}
