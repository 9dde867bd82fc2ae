//! Concrete pixel targets and the `PixelTarget` trait that turns resolved
//! storage into a caller-chosen output array.
//!
//! Every target is a plain `#[repr(C)]` struct so a caller can
//! `bytemuck::cast_slice` the result straight into a texture upload; the
//! indexed/direct-color split and bit-depth quantization live once, in the
//! private [`unpack_pixels`] driver each impl calls into.

use crate::bitpack;
use crate::format::{Format, Transparency};
use alloc::vec::Vec;
use bytemuck::{Pod, Zeroable};

/// A concrete output pixel type `Image::unpack` can produce.
pub trait PixelTarget: Sized {
  type Aggregate;

  /// Walks `storage` (at `format`'s pixel format, `width * height` pixels)
  /// and produces one `Aggregate` per pixel, deindexing through the
  /// palette and applying chroma-key transparency as needed.
  fn unpack(storage: &[u8], format: &Format, width: u32, height: u32) -> Vec<Self::Aggregate>;
}

fn quantize(sample: u16, src_depth: u32, dst_depth: u32) -> u16 {
  match dst_depth.cmp(&src_depth) {
    core::cmp::Ordering::Equal => sample,
    core::cmp::Ordering::Greater => {
      let quantum = ((1u32 << dst_depth) - 1) / ((1u32 << src_depth) - 1);
      (sample as u32 * quantum) as u16
    }
    core::cmp::Ordering::Less => sample >> (src_depth - dst_depth),
  }
}

/// The effective RGBA palette: `PLTE`'s RGB entries plus `tRNS`'s
/// per-entry alpha, missing alphas defaulting to fully opaque.
fn build_palette_rgba(format: &Format) -> Vec<[u8; 4]> {
  let palette = format.palette.as_deref().unwrap_or(&[]);
  let alphas: &[u8] = match &format.transparency {
    Some(Transparency::Alphas(a)) => a,
    _ => &[],
  };
  palette.iter().enumerate().map(|(i, &[r, g, b])| [r, g, b, alphas.get(i).copied().unwrap_or(255)]).collect()
}

/// Whether `raw`'s sample tuple matches the image's chroma key.
fn chroma_matches(format: &Format, raw: &[u16], src_channels: usize) -> bool {
  match &format.transparency {
    Some(Transparency::GrayKey(k)) if src_channels >= 1 => *k == raw[0],
    Some(Transparency::RgbKey(r, g, b)) if src_channels >= 3 => *r == raw[0] && *g == raw[1] && *b == raw[2],
    _ => false,
  }
}

/// Shared indexed/direct-color unpacking driver. `out_channels`/`out_depth`
/// describe the target's per-pixel shape; `build` assembles the final
/// `[gray]`, `[gray, alpha]`, `[r, g, b]`, or `[r, g, b, a]` channel tuple
/// (unused trailing slots are zero) into the concrete aggregate.
fn unpack_pixels<R>(
  storage: &[u8],
  format: &Format,
  width: u32,
  height: u32,
  out_channels: usize,
  out_depth: u32,
  build: impl Fn([u16; 4]) -> R,
) -> Vec<R> {
  let pf = format.pixel_format;
  let depth = pf.depth();
  let src_channels = pf.channels() as usize;
  let total = width as usize * height as usize;
  let mut out = Vec::with_capacity(total);

  if pf.is_indexed() {
    let palette = build_palette_rgba(format);
    let scale: u16 = if out_depth == 16 { 257 } else { 1 };
    for pixel_idx in 0..total {
      let index = bitpack::sample_at(storage, depth, pixel_idx) as usize;
      let rgba = palette.get(index).copied().unwrap_or([0, 0, 0, 255]);
      out.push(build([
        rgba[0] as u16 * scale,
        rgba[1] as u16 * scale,
        rgba[2] as u16 * scale,
        rgba[3] as u16 * scale,
      ]));
    }
    return out;
  }

  for pixel_idx in 0..total {
    let mut raw = [0u16; 4];
    for (ch, slot) in raw.iter_mut().take(src_channels).enumerate() {
      *slot = bitpack::sample_at(storage, depth, pixel_idx * src_channels + ch);
    }
    let mut channels = [0u16; 4];
    for ch in 0..out_channels.min(src_channels) {
      channels[ch] = quantize(raw[ch], depth, out_depth);
    }
    if !pf.has_color() && out_channels >= 3 {
      channels[1] = channels[0];
      channels[2] = channels[0];
    }
    if out_channels == 2 || out_channels == 4 {
      let alpha_slot = out_channels - 1;
      channels[alpha_slot] = if pf.has_alpha() {
        quantize(raw[src_channels - 1], depth, out_depth)
      } else if chroma_matches(format, &raw, src_channels) {
        0
      } else if out_depth == 16 {
        u16::MAX
      } else {
        0xff
      };
    }
    out.push(build(channels));
  }
  out
}

macro_rules! pixel_target {
  ($name:ident { $($field:ident: $ty:ty => $idx:expr),+ $(,)? }, channels = $channels:expr, depth = $depth:expr) => {
    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
    pub struct $name {
      $(pub $field: $ty,)+
    }

    impl PixelTarget for $name {
      type Aggregate = Self;

      fn unpack(storage: &[u8], format: &Format, width: u32, height: u32) -> Vec<Self> {
        unpack_pixels(storage, format, width, height, $channels, $depth, |c| Self {
          $($field: c[$idx] as $ty,)+
        })
      }
    }
  };
}

pixel_target!(Grayscale8 { v: u8 => 0 }, channels = 1, depth = 8);
pixel_target!(Grayscale16 { v: u16 => 0 }, channels = 1, depth = 16);
pixel_target!(GrayscaleAlpha8 { v: u8 => 0, a: u8 => 1 }, channels = 2, depth = 8);
pixel_target!(GrayscaleAlpha16 { v: u16 => 0, a: u16 => 1 }, channels = 2, depth = 16);
pixel_target!(Rgb8 { r: u8 => 0, g: u8 => 1, b: u8 => 2 }, channels = 3, depth = 8);
pixel_target!(Rgb16 { r: u16 => 0, g: u16 => 1, b: u16 => 2 }, channels = 3, depth = 16);
pixel_target!(Rgba8 { r: u8 => 0, g: u8 => 1, b: u8 => 2, a: u8 => 3 }, channels = 4, depth = 8);
pixel_target!(Rgba16 { r: u16 => 0, g: u16 => 1, b: u16 => 2, a: u16 => 3 }, channels = 4, depth = 16);

#[cfg(test)]
mod tests {
  use super::*;
  use crate::chunk::PixelFormat;

  fn fmt(pixel_format: PixelFormat) -> Format {
    Format { pixel_format, palette: None, transparency: None, background: None }
  }

  #[test]
  fn unpacks_rgba8_storage_directly() {
    let format = fmt(PixelFormat::Rgba8);
    let storage = [10u8, 20, 30, 40];
    let pixels = Rgba8::unpack(&storage, &format, 1, 1);
    assert_eq!(pixels, alloc::vec![Rgba8 { r: 10, g: 20, b: 30, a: 40 }]);
  }

  #[test]
  fn widens_one_bit_gray_to_eight_bit() {
    let format = fmt(PixelFormat::Y1);
    let storage = [0b1000_0000u8];
    let pixels = Grayscale8::unpack(&storage, &format, 2, 1);
    assert_eq!(pixels[0].v, 0xff);
    assert_eq!(pixels[1].v, 0x00);
  }

  #[test]
  fn deindexes_through_the_palette_with_trns_alpha() {
    let mut format = fmt(PixelFormat::Idx8);
    format.palette = Some(alloc::vec![[255, 0, 0], [0, 255, 0]]);
    format.transparency = Some(Transparency::Alphas(alloc::vec![0]));
    let storage = [0u8, 1];
    let pixels = Rgba8::unpack(&storage, &format, 2, 1);
    assert_eq!(pixels[0], Rgba8 { r: 255, g: 0, b: 0, a: 0 });
    assert_eq!(pixels[1], Rgba8 { r: 0, g: 255, b: 0, a: 255 });
  }

  #[test]
  fn chroma_key_zeroes_alpha_on_exact_match() {
    let mut format = fmt(PixelFormat::Rgb8);
    format.transparency = Some(Transparency::RgbKey(10, 20, 30));
    let storage = [10u8, 20, 30, 1, 2, 3];
    let pixels = Rgba8::unpack(&storage, &format, 2, 1);
    assert_eq!(pixels[0], Rgba8 { r: 10, g: 20, b: 30, a: 0 });
    assert_eq!(pixels[1], Rgba8 { r: 1, g: 2, b: 3, a: 255 });
  }

  #[test]
  fn gray_source_replicates_into_rgb_target() {
    let format = fmt(PixelFormat::Y8);
    let storage = [128u8];
    let pixels = Rgb8::unpack(&storage, &format, 1, 1);
    assert_eq!(pixels[0], Rgb8 { r: 128, g: 128, b: 128 });
  }
}
