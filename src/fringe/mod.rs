//! Terrain edge blending.
//!
//! Where two terrain types meet, the higher-priority type "fringes" onto its
//! neighbor: the [`Fringer`] inspects a tile's eight neighbors, consults the
//! injected [`FringeConfig`], and synthesizes (and caches) a composite
//! transition tile.

mod config;
mod fringer;

pub use config::{FringeConfig, FringeRecord, FringeSetRecord};
pub use fringer::{FringeBits, FringeTile, Fringer};
