//! Generic 2D pixel buffers and the composition primitives used to build
//! fringe tiles.
//!
//! - [`Surface`]: row-major rectangular buffer of any `T`.
//! - [`RgbaSurface`]: the concrete pixel surface (`palette::Srgba<u8>`).
//! - [`RgbaSurface::stamp`]: alpha-over composition, integer math only.
//! - [`compose_masked`]: combines a mask tile's alpha shape with a base
//!   tile's pixels.

use std::ops::{Index, IndexMut};

/// RGBA pixel, 8 bits per channel.
pub type Rgba = palette::Srgba<u8>;

/// Fully transparent black.
pub const CLEAR: Rgba = Rgba::new(0, 0, 0, 0);

/// A rectangular, row-major buffer of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface<T> {
  width: u32,
  height: u32,
  data: Box<[T]>,
}

impl<T: Clone> Surface<T> {
  /// Creates a surface with every cell set to `value`.
  pub fn filled(width: u32, height: u32, value: T) -> Self {
    Self {
      width,
      height,
      data: vec![value; (width as usize) * (height as usize)].into_boxed_slice(),
    }
  }

  /// Resets every cell to `value`.
  pub fn fill(&mut self, value: T) {
    self.data.fill(value);
  }
}

impl<T> Surface<T> {
  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  #[inline]
  pub fn height(&self) -> u32 {
    self.height
  }

  /// Returns the value at `(x, y)`, or None when out of bounds.
  #[inline]
  pub fn get(&self, x: u32, y: u32) -> Option<&T> {
    if x < self.width && y < self.height {
      Some(&self.data[(y * self.width + x) as usize])
    } else {
      None
    }
  }

  /// Sets the value at `(x, y)`; out-of-bounds writes are ignored.
  #[inline]
  pub fn set(&mut self, x: u32, y: u32, value: T) {
    if x < self.width && y < self.height {
      self.data[(y * self.width + x) as usize] = value;
    }
  }

  /// Raw row-major cell slice.
  #[inline]
  pub fn data(&self) -> &[T] {
    &self.data
  }
}

impl<T> Index<(u32, u32)> for Surface<T> {
  type Output = T;

  #[inline]
  fn index(&self, (x, y): (u32, u32)) -> &T {
    &self.data[(y * self.width + x) as usize]
  }
}

impl<T> IndexMut<(u32, u32)> for Surface<T> {
  #[inline]
  fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut T {
    &mut self.data[(y * self.width + x) as usize]
  }
}

/// Pixel surface used for composited tile images.
pub type RgbaSurface = Surface<Rgba>;

impl RgbaSurface {
  /// Creates a fully transparent surface.
  pub fn clear(width: u32, height: u32) -> Self {
    Self::filled(width, height, CLEAR)
  }

  /// Composites `src` over this surface (standard alpha-over, integer math).
  ///
  /// The surfaces are aligned at the origin; `src` cells outside this
  /// surface's bounds are ignored.
  pub fn stamp(&mut self, src: &RgbaSurface) {
    let w = self.width.min(src.width);
    let h = self.height.min(src.height);
    for y in 0..h {
      for x in 0..w {
        let s = src[(x, y)];
        if s.alpha == 0 {
          continue;
        }
        if s.alpha == 255 {
          self[(x, y)] = s;
          continue;
        }
        let d = self[(x, y)];
        let sa = s.alpha as u32;
        let da = d.alpha as u32;
        let inv = 255 - sa;
        let out_a = sa + da * inv / 255;
        if out_a == 0 {
          self[(x, y)] = CLEAR;
          continue;
        }
        let blend = |sc: u8, dc: u8| -> u8 {
          ((sc as u32 * sa + dc as u32 * da * inv / 255) / out_a) as u8
        };
        self[(x, y)] = Rgba::new(
          blend(s.red, d.red),
          blend(s.green, d.green),
          blend(s.blue, d.blue),
          out_a as u8,
        );
      }
    }
  }
}

/// Builds a new surface taking color from `base` and coverage from `mask`.
///
/// Each output pixel carries `base`'s color channels and `mask`'s alpha; the
/// result is the base texture cut to the mask's shape. The output has the
/// mask's dimensions, and base pixels are sampled with wraparound so a small
/// base texture tiles across a larger mask.
pub fn compose_masked(mask: &RgbaSurface, base: &RgbaSurface) -> RgbaSurface {
  let mut out = RgbaSurface::clear(mask.width(), mask.height());
  if base.width() == 0 || base.height() == 0 {
    return out;
  }
  for y in 0..mask.height() {
    for x in 0..mask.width() {
      let m = mask[(x, y)];
      if m.alpha == 0 {
        continue;
      }
      let b = base[(x % base.width(), y % base.height())];
      out[(x, y)] = Rgba::new(b.red, b.green, b.blue, m.alpha);
    }
  }
  out
}
