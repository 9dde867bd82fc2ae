//! Adam7 pass geometry: the seven fixed sub-image samplings over an 8x8
//! tile that `spec.md` §4.4 specifies, plus the single-pass degenerate case
//! for non-interlaced images.

/// One Adam7 pass: which pixels of the 8x8 tile it owns (`base_x/y` is the
/// tile offset, `exp_x/y` is the log2 of the tile's stride in that axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pass {
  pub base_x: u32,
  pub base_y: u32,
  pub exp_x: u32,
  pub exp_y: u32,
}

/// The seven interlace passes, in stream order.
pub const ADAM7_PASSES: [Pass; 7] = [
  Pass { base_x: 0, base_y: 0, exp_x: 3, exp_y: 3 },
  Pass { base_x: 4, base_y: 0, exp_x: 3, exp_y: 3 },
  Pass { base_x: 0, base_y: 4, exp_x: 2, exp_y: 3 },
  Pass { base_x: 2, base_y: 0, exp_x: 2, exp_y: 2 },
  Pass { base_x: 0, base_y: 2, exp_x: 1, exp_y: 2 },
  Pass { base_x: 1, base_y: 0, exp_x: 1, exp_y: 1 },
  Pass { base_x: 0, base_y: 1, exp_x: 0, exp_y: 1 },
];

/// The trivial single pass a non-interlaced image is driven through: every
/// pixel, stride 1 in both axes.
pub const NO_INTERLACE_PASS: Pass = Pass { base_x: 0, base_y: 0, exp_x: 0, exp_y: 0 };

impl Pass {
  /// Sub-image width: how many columns of the full `width`-wide image this
  /// pass samples.
  #[inline]
  pub const fn sub_width(&self, width: u32) -> u32 {
    let stride = 1u32 << self.exp_x;
    if width <= self.base_x {
      0
    } else {
      (width + stride - self.base_x - 1) >> self.exp_x
    }
  }

  /// Sub-image height: how many rows of the full `height`-tall image this
  /// pass samples.
  #[inline]
  pub const fn sub_height(&self, height: u32) -> u32 {
    let stride = 1u32 << self.exp_y;
    if height <= self.base_y {
      0
    } else {
      (height + stride - self.base_y - 1) >> self.exp_y
    }
  }

  /// Maps a `(reduced_x, reduced_y)` coordinate within this pass's
  /// sub-image back to its position in the full image.
  #[inline]
  pub const fn full_pos(&self, reduced_x: u32, reduced_y: u32) -> (u32, u32) {
    (self.base_x + (reduced_x << self.exp_x), self.base_y + (reduced_y << self.exp_y))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  extern crate alloc;
  use alloc::collections::BTreeSet;

  #[test]
  fn no_interlace_pass_covers_everything_one_to_one() {
    let (w, h) = (5u32, 3u32);
    assert_eq!(NO_INTERLACE_PASS.sub_width(w), w);
    assert_eq!(NO_INTERLACE_PASS.sub_height(h), h);
    assert_eq!(NO_INTERLACE_PASS.full_pos(2, 1), (2, 1));
  }

  #[test]
  fn eight_by_eight_tile_sub_dims_match_the_spec_diagram() {
    // A full 8x8 tile: pass 0 owns 1 pixel, pass 6 owns a full 8-wide row.
    assert_eq!(ADAM7_PASSES[0].sub_width(8), 1);
    assert_eq!(ADAM7_PASSES[0].sub_height(8), 1);
    assert_eq!(ADAM7_PASSES[6].sub_width(8), 8);
    assert_eq!(ADAM7_PASSES[6].sub_height(8), 4);
  }

  #[test]
  fn small_images_skip_passes_with_zero_extent() {
    // width 1: only passes whose base_x is 0 contribute any columns.
    assert_eq!(ADAM7_PASSES[1].sub_width(1), 0); // base_x = 4
    assert_eq!(ADAM7_PASSES[0].sub_width(1), 1); // base_x = 0
  }

  #[test]
  fn every_pass_union_covers_the_full_grid_exactly_once() {
    for &(w, h) in &[(1u32, 1u32), (5, 3), (8, 8), (17, 9), (1, 20)] {
      let mut seen = BTreeSet::new();
      for pass in ADAM7_PASSES {
        for ry in 0..pass.sub_height(h) {
          for rx in 0..pass.sub_width(w) {
            let pos = pass.full_pos(rx, ry);
            assert!(pos.0 < w && pos.1 < h, "pass produced out-of-bounds {pos:?} for {w}x{h}");
            assert!(seen.insert(pos), "duplicate position {pos:?} for {w}x{h}");
          }
        }
      }
      assert_eq!(seen.len(), (w * h) as usize, "incomplete coverage for {w}x{h}");
    }
  }
}
