//! Paint-order resolution.
//!
//! Isometric scenes cannot be painted in simple scanline order: tall objects
//! and multi-tile footprints force a depth sort. [`DirtyItemList`] collects
//! the frame's renderables and produces a safe back-to-front sequence.

mod dirty;

pub use dirty::{DirtyItem, DirtyItemList, ObjectRef, Renderable, SpriteRef};
