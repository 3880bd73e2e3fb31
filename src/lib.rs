//! Sparse isometric scene storage, terrain auto-fringing, and render
//! ordering for Bevy.
//!
//! Three cooperating pieces:
//!
//! - [`SparseSceneStore`]: terrain and multi-tile objects partitioned into
//!   fixed-size sections, created on demand and queryable by tile or region.
//! - [`Fringer`]: synthesizes blended transition tiles where terrain types
//!   meet, driven by a declarative [`FringeConfig`] and cached by composite
//!   identity.
//! - [`DirtyItemList`]: sorts the frame's sprites and objects into a safe
//!   back-to-front paint order under isometric projection.
//!
//! Tile art stays outside this crate: the host implements [`TileSource`] to
//! deliver tile images and terrain metadata. On native targets a
//! [`SectionResolver`](resolver::SectionResolver) streams sections in from a
//! host-supplied loader on a background thread, and [`IsoScenePlugin`] wires
//! the handoff into the Bevy schedule.

pub mod coords;
pub mod fringe;
pub mod object;
pub mod plugin;
pub mod render;
#[cfg(not(target_family = "wasm"))]
pub mod resolver;
pub mod scene;
pub mod surface;
pub mod tile;
pub mod tileset;

pub use coords::{TileRect, tile_hash};
pub use fringe::{FringeConfig, FringeRecord, FringeSetRecord, FringeTile, Fringer};
pub use object::ObjectInfo;
#[cfg(not(target_family = "wasm"))]
pub use plugin::SectionResolverHandle;
pub use plugin::IsoScenePlugin;
pub use render::{DirtyItem, DirtyItemList, ObjectRef, Renderable, SpriteRef};
pub use scene::{Section, SparseSceneStore};
pub use surface::{Rgba, RgbaSurface, Surface};
pub use tile::{BaseTile, TileKey};
pub use tileset::{TileError, TileSource};
