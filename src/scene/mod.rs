//! Sparse scene storage.
//!
//! Terrain and objects live in fixed-size [`Section`]s; the
//! [`SparseSceneStore`] owns whichever sections actually hold data and
//! answers coordinate and region queries across them.

mod section;
mod store;

pub use section::Section;
pub use store::SparseSceneStore;
