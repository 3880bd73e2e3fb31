//! Declarative fringe configuration.
//!
//! Loaded from TOML, e.g.:
//!
//! ```toml
//! [[fringe]]
//! base = 12          # water
//! priority = 10
//! tilesets = [{ tileset = 30 }, { tileset = 31, mask = true }]
//! ```

use std::collections::HashMap;

use bevy::log::warn;
use bevy::prelude::Resource;
use serde::Deserialize;

/// One candidate fringe tileset for a base terrain type. When `mask` is set,
/// the tileset's images are alpha masks cut against the base type's texture
/// rather than ready-to-draw tiles.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FringeSetRecord {
  pub tileset: i32,
  #[serde(default)]
  pub mask: bool,
}

/// Fringe behavior for one base terrain tileset.
#[derive(Clone, Debug, Deserialize)]
pub struct FringeRecord {
  /// The base tileset this record describes.
  pub base: i32,
  /// Fringe priority; higher-priority terrain fringes onto lower.
  pub priority: i32,
  /// Candidate fringe tilesets; one is picked per coordinate hash.
  #[serde(default)]
  pub tilesets: Vec<FringeSetRecord>,
}

#[derive(Deserialize)]
struct FringeConfigFile {
  #[serde(default)]
  fringe: Vec<FringeRecord>,
}

/// The scene's fringe rules, keyed by base tileset. The default (empty)
/// configuration fringes nothing.
#[derive(Resource, Clone, Debug, Default)]
pub struct FringeConfig {
  records: HashMap<i32, FringeRecord>,
}

impl FringeConfig {
  /// Parses a TOML fringe configuration. Records with a zero base tileset
  /// or a non-positive priority are skipped with a warning.
  pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
    let file: FringeConfigFile = toml::from_str(text)?;
    let mut config = Self::default();
    for record in file.fringe {
      config.add_record(record);
    }
    Ok(config)
  }

  /// Registers a fringe record, replacing any prior record for its base
  /// tileset. Invalid records are skipped with a warning.
  pub fn add_record(&mut self, record: FringeRecord) {
    if record.base == 0 || record.priority <= 0 {
      warn!(
        "skipping invalid fringe record [base={}, priority={}]",
        record.base, record.priority
      );
      return;
    }
    self.records.insert(record.base, record);
  }

  /// Decides whether `candidate` fringes onto `base`, returning the
  /// candidate's fringe priority if so.
  ///
  /// A candidate fringes when it has a record with at least one tileset and
  /// the base either has no record or a strictly lower priority. Unknown
  /// tilesets simply never fringe.
  pub fn fringes_on(&self, candidate: i32, base: i32) -> Option<i32> {
    let crec = self.records.get(&candidate)?;
    if crec.tilesets.is_empty() {
      return None;
    }
    match self.records.get(&base) {
      Some(brec) if brec.priority >= crec.priority => None,
      _ => Some(crec.priority),
    }
  }

  /// Picks the fringe tileset for `base` given a coordinate hash, so the
  /// same tile always selects the same candidate.
  pub fn fringe_for(&self, base: i32, hash: u32) -> Option<&FringeSetRecord> {
    let rec = self.records.get(&base)?;
    if rec.tilesets.is_empty() {
      return None;
    }
    Some(&rec.tilesets[hash as usize % rec.tilesets.len()])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> FringeConfig {
    let mut c = FringeConfig::default();
    c.add_record(FringeRecord {
      base: 12,
      priority: 10,
      tilesets: vec![
        FringeSetRecord {
          tileset: 30,
          mask: false,
        },
        FringeSetRecord {
          tileset: 31,
          mask: true,
        },
      ],
    });
    c.add_record(FringeRecord {
      base: 13,
      priority: 5,
      tilesets: vec![FringeSetRecord {
        tileset: 40,
        mask: false,
      }],
    });
    c
  }

  #[test]
  fn priority_governs_fringing() {
    let c = config();
    // higher onto lower
    assert_eq!(c.fringes_on(12, 13), Some(10));
    // lower onto higher: no
    assert_eq!(c.fringes_on(13, 12), None);
    // onto an unconfigured base: yes
    assert_eq!(c.fringes_on(12, 99), Some(10));
    // unconfigured candidate never fringes
    assert_eq!(c.fringes_on(99, 13), None);
    // equal priority: no
    let mut c2 = config();
    c2.add_record(FringeRecord {
      base: 14,
      priority: 10,
      tilesets: vec![FringeSetRecord {
        tileset: 50,
        mask: false,
      }],
    });
    assert_eq!(c2.fringes_on(12, 14), None);
  }

  #[test]
  fn hash_selects_stably() {
    let c = config();
    let a = c.fringe_for(12, 0).map(|r| r.tileset);
    let b = c.fringe_for(12, 1).map(|r| r.tileset);
    assert_eq!(a, Some(30));
    assert_eq!(b, Some(31));
    assert_eq!(c.fringe_for(12, 2).map(|r| r.tileset), Some(30));
    assert_eq!(c.fringe_for(99, 0), None);
  }

  #[test]
  fn toml_parsing_skips_invalid() {
    let text = r#"
      [[fringe]]
      base = 12
      priority = 10
      tilesets = [{ tileset = 30 }, { tileset = 31, mask = true }]

      [[fringe]]
      base = 0
      priority = 3
      tilesets = [{ tileset = 9 }]

      [[fringe]]
      base = 7
      priority = 0
    "#;
    let c = FringeConfig::from_toml(text).unwrap();
    assert_eq!(c.fringes_on(12, 99), Some(10));
    assert_eq!(c.fringes_on(7, 99), None);
    assert!(c.fringe_for(12, 1).is_some_and(|r| r.mask));
  }

  #[test]
  fn toml_syntax_error_surfaces() {
    assert!(FringeConfig::from_toml("[[fringe").is_err());
  }
}
