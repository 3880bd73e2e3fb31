//! End-to-end coverage: scene storage, fringe synthesis and render ordering
//! working together, plus the Bevy plugin's resolved-section handoff.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bevy::prelude::*;
use bevy_iso_scene::resolver::{SectionLoader, SectionResolver};
use bevy_iso_scene::{
  DirtyItemList, FringeConfig, FringeRecord, FringeSetRecord, Fringer, IsoScenePlugin, ObjectInfo,
  ObjectRef, Renderable, RgbaSurface, Section, SectionResolverHandle, SparseSceneStore, SpriteRef,
  TileError, TileKey, TileRect, TileSource,
};

const GRASS: i32 = 5;
const WATER: i32 = 12;
const WATER_FRINGE: i32 = 30;

fn tile(tileset: i32, index: u16) -> i32 {
  (tileset << 16) | index as i32
}

struct StubTiles;

impl TileSource for StubTiles {
  fn base_tile(
    &self,
    fq_tile_id: i32,
  ) -> Result<bevy_iso_scene::BaseTile, TileError> {
    Ok(bevy_iso_scene::BaseTile {
      image: self.tile_image(&TileKey::from_fq(fq_tile_id))?,
      passable: true,
    })
  }

  fn tile_image(&self, key: &TileKey) -> Result<Arc<RgbaSurface>, TileError> {
    let shade = (key.tileset & 0xFF) as u8;
    Ok(Arc::new(RgbaSurface::filled(
      8,
      8,
      bevy_iso_scene::Rgba::new(shade, shade, shade, 255),
    )))
  }

  fn raw_tile_image(&self, key: &TileKey) -> Result<Arc<RgbaSurface>, TileError> {
    self.tile_image(key)
  }
}

fn shoreline_config() -> FringeConfig {
  let mut config = FringeConfig::default();
  config.add_record(FringeRecord {
    base: WATER,
    priority: 10,
    tilesets: vec![FringeSetRecord {
      tileset: WATER_FRINGE,
      mask: false,
    }],
  });
  config
}

/// A grass field with a square lake at `(lake_x, lake_y)`.
fn lake_scene(lake_x: i32, lake_y: i32) -> SparseSceneStore {
  let mut store = SparseSceneStore::new(16, 16);
  for y in (lake_y - 4)..(lake_y + 7) {
    for x in (lake_x - 4)..(lake_x + 7) {
      store.set_terrain(tile(GRASS, 1), x, y);
    }
  }
  for y in lake_y..(lake_y + 3) {
    for x in lake_x..(lake_x + 3) {
      store.set_terrain(tile(WATER, 1), x, y);
    }
  }
  store
}

#[test]
fn shoreline_fringes_and_open_field_does_not() {
  let store = lake_scene(4, 4);
  let mut fringer = Fringer::new(shoreline_config());
  let tiles = StubTiles;

  // grass touching the lake fringes
  let shore = fringer.fringe_tile(&store, 3, 4, &tiles);
  assert!(shore.is_some());

  // open grass away from water does not
  assert!(fringer.fringe_tile(&store, 0, 0, &tiles).is_none());

  // water itself does not fringe onto water
  assert!(fringer.fringe_tile(&store, 5, 5, &tiles).is_none());
}

#[test]
fn identical_shorelines_share_composites() {
  // two lakes whose shorelines are congruent; matching shore tiles share
  // one cached composite
  let mut fringer = Fringer::new(shoreline_config());
  let tiles = StubTiles;

  let a = fringer
    .fringe_tile(&lake_scene(4, 4), 3, 4, &tiles)
    .expect("shore tile should fringe");
  let b = fringer
    .fringe_tile(&lake_scene(36, 36), 35, 36, &tiles)
    .expect("shore tile should fringe");

  assert_eq!(a.key, b.key);
  assert!(Arc::ptr_eq(&a, &b));
  assert!(a.image.width() > 0);
}

#[test]
fn region_query_feeds_render_order() {
  let mut store = SparseSceneStore::new(16, 16);
  // a couple of props along a diagonal, plus one with a priority override
  store.add_object(ObjectInfo::new(tile(40, 0), 2, 2));
  store.add_object(ObjectInfo::new(tile(40, 1), 6, 6));
  let mut fancy = ObjectInfo::new(tile(40, 2), 4, 4);
  fancy.priority = 3;
  store.add_object(fancy);

  let mut list = DirtyItemList::new();
  for info in store.objects_in(&TileRect::new(0, 0, 10, 10)) {
    list.append_object(ObjectRef {
      tile_id: info.tile_id,
      x: info.x,
      y: info.y,
      priority: info.priority as i32,
      base_width: 1,
      base_height: 1,
    });
  }
  // and the player sprite on the middle prop's tile
  list.append_sprite(
    SpriteRef {
      id: 1,
      render_order: 0,
      pixel_y: 0,
      base_width: 1,
      base_height: 1,
    },
    4,
    4,
  );

  assert_eq!(list.len(), 4);
  list.sort();

  let mut order = Vec::new();
  list.paint_and_clear(|item| {
    order.push(match item.renderable() {
      Some(Renderable::Object(o)) => o.tile_id,
      Some(Renderable::Sprite(s)) => -(s.id as i32),
      None => unreachable!(),
    });
  });

  // diagonal back-to-front, sprite over the object sharing its tile
  assert_eq!(
    order,
    vec![tile(40, 0), tile(40, 2), -1, tile(40, 1)]
  );
  assert_eq!(list.pool_size(), 4);
}

struct CheckerLoader;

impl SectionLoader for CheckerLoader {
  fn load(&mut self, sx: i32, sy: i32) -> Option<Section> {
    if (sx + sy) % 2 != 0 {
      return None;
    }
    let mut section = Section::new(sx * 16, sy * 16, 16, 16);
    section.set_terrain(tile(GRASS, 1), sx * 16, sy * 16);
    section.add_object(ObjectInfo::new(tile(40, 0), sx * 16 + 1, sy * 16 + 1));
    Some(section)
  }
}

#[test]
fn plugin_installs_resolved_sections() {
  let mut app = App::new();
  app.add_plugins(IsoScenePlugin);

  let resolver = SectionResolver::new(CheckerLoader);
  resolver.resolve(0, 0, false);
  resolver.resolve(1, 0, true);

  let entity = app
    .world_mut()
    .spawn((SparseSceneStore::new(16, 16), SectionResolverHandle(resolver)))
    .id();

  let mut installed = false;
  for _ in 0..200 {
    app.update();
    let store = app.world().get::<SparseSceneStore>(entity).unwrap();
    if store.has_section(0, 0) {
      installed = true;
      break;
    }
    thread::sleep(Duration::from_millis(5));
  }
  assert!(installed, "resolved section never reached the store");

  let store = app.world().get::<SparseSceneStore>(entity).unwrap();
  assert_eq!(store.terrain(0, 0), Some(tile(GRASS, 1)));
  // the loader had no data for (1, 0); the store still reports nothing
  assert_eq!(store.terrain(16, 0), None);

  // the plugin seeded an empty fringe configuration
  assert!(app.world().contains_resource::<FringeConfig>());
}
