//! Bevy integration.

use bevy::prelude::*;

use crate::fringe::FringeConfig;
#[cfg(not(target_family = "wasm"))]
use crate::resolver::SectionResolver;
#[cfg(not(target_family = "wasm"))]
use crate::scene::SparseSceneStore;

/// Pairs a scene store entity with its background section resolver.
#[cfg(not(target_family = "wasm"))]
#[derive(Component)]
pub struct SectionResolverHandle(pub SectionResolver);

/// Installs the isometric scene resources and systems:
/// - the [`FringeConfig`] resource (empty until the host loads one),
/// - an `Update` system installing background-resolved sections into their
///   [`SparseSceneStore`].
pub struct IsoScenePlugin;

impl Plugin for IsoScenePlugin {
  fn build(&self, app: &mut App) {
    app.init_resource::<FringeConfig>();
    #[cfg(not(target_family = "wasm"))]
    app.add_systems(Update, install_resolved_sections);
  }
}

/// Drains every resolver's finished work into its store. Sections that
/// resolved to nothing are simply dropped; the store keeps reporting "no
/// data" there.
#[cfg(not(target_family = "wasm"))]
fn install_resolved_sections(mut query: Query<(&mut SparseSceneStore, &SectionResolverHandle)>) {
  for (mut store, handle) in &mut query {
    while let Some(resolved) = handle.0.try_recv() {
      if let Some(section) = resolved.section {
        store.install_section(section);
      }
    }
  }
}
