//! Per-row filter reversal and the Adam7-driven scanline walk that turns a
//! fully inflated `IDAT` byte stream into the final tightly packed pixel
//! storage.
//!
//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.

use crate::adam7::{Pass, ADAM7_PASSES, NO_INTERLACE_PASS};
use crate::bitpack;
use crate::chunk::{InterlaceMethod, PixelFormat};
use crate::error::{DecodingError, InflationError, PngError};
use alloc::vec;
use alloc::vec::Vec;

/// Reconstruct Filter Type 1.
#[inline]
const fn reconstruct_sub(fx: u8, ra: u8) -> u8 {
  fx.wrapping_add(ra)
}

/// Reconstruct Filter Type 2.
#[inline]
const fn reconstruct_up(fx: u8, rb: u8) -> u8 {
  fx.wrapping_add(rb)
}

/// Reconstruct Filter Type 3.
#[inline]
const fn reconstruct_average(fx: u8, ra: u8, rb: u8) -> u8 {
  fx.wrapping_add(((ra as u16 + rb as u16) / 2) as u8)
}

/// Reconstruct Filter Type 4.
#[inline]
const fn reconstruct_paeth(fx: u8, ra: u8, rb: u8, rc: u8) -> u8 {
  fx.wrapping_add(paeth_predictor(ra, rb, rc))
}

/// The Paeth filter function: a linear predictor of the three neighboring
/// bytes (left `a`, above `b`, upper-left `c`), performed in signed 16-bit
/// arithmetic as the PNG spec requires ("without overflow").
const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  let a = a as i32;
  let b = b as i32;
  let c = c as i32;
  let p = a + b - c;
  let pa = (p - a).abs();
  let pb = (p - b).abs();
  let pc = (p - c).abs();
  if pa <= pb && pa <= pc {
    a as u8
  } else if pb <= pc {
    b as u8
  } else {
    c as u8
  }
}

/// The five filter types a scanline can declare in its leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
  None,
  Sub,
  Up,
  Average,
  Paeth,
}

impl FilterType {
  #[inline]
  pub fn from_byte(b: u8) -> Result<Self, PngError> {
    Ok(match b {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(crate::error::ParsingError::IllegalFilterMethod.into()),
    })
  }
}

/// Reverses `row`'s filter in place, given the previous reconstructed row
/// (all zeros for a pass's first row) and `delay`, the pixel's byte stride
/// used as the "left neighbor" offset (`spec.md` §4.4).
///
/// Must be called left to right: `Sub`/`Average`/`Paeth` read already-
/// reconstructed bytes earlier in the same row.
pub fn unfilter_row(filter: FilterType, row: &mut [u8], prev: &[u8], delay: usize) {
  debug_assert_eq!(row.len(), prev.len());
  match filter {
    FilterType::None => {}
    FilterType::Sub => {
      for i in 0..row.len() {
        let a = if i >= delay { row[i - delay] } else { 0 };
        row[i] = reconstruct_sub(row[i], a);
      }
    }
    FilterType::Up => {
      for i in 0..row.len() {
        row[i] = reconstruct_up(row[i], prev[i]);
      }
    }
    FilterType::Average => {
      for i in 0..row.len() {
        let a = if i >= delay { row[i - delay] } else { 0 };
        row[i] = reconstruct_average(row[i], a, prev[i]);
      }
    }
    FilterType::Paeth => {
      for i in 0..row.len() {
        let a = if i >= delay { row[i - delay] } else { 0 };
        let c = if i >= delay { prev[i - delay] } else { 0 };
        row[i] = reconstruct_paeth(row[i], a, prev[i], c);
      }
    }
  }
}

/// Walks every Adam7 pass (or the single non-interlaced pass) over an
/// already fully inflated `IDAT` byte stream, reversing each scanline's
/// filter and scattering its samples into the final tightly packed
/// `width * height` storage buffer.
///
/// Returns an error if `decompressed` runs out before every pass's
/// scanlines are satisfied, or if bytes remain after the last one
/// (`spec.md` §4.4's `extraneousImageData`).
pub fn reconstruct_image(
  decompressed: &[u8],
  width: u32,
  height: u32,
  pixel_format: PixelFormat,
  interlace: InterlaceMethod,
) -> Result<Vec<u8>, PngError> {
  let channels = pixel_format.channels() as usize;
  let depth = pixel_format.depth();
  let delay = pixel_format.filter_delay();
  let total_samples = (width as usize) * (height as usize) * channels;
  let mut storage = vec![0u8; bitpack::packed_len(depth, total_samples)];

  let passes: &[Pass] = match interlace {
    InterlaceMethod::None => core::slice::from_ref(&NO_INTERLACE_PASS),
    InterlaceMethod::Adam7 => &ADAM7_PASSES,
  };

  let mut cursor = decompressed;
  for pass in passes {
    let sub_w = pass.sub_width(width);
    let sub_h = pass.sub_height(height);
    if sub_w == 0 || sub_h == 0 {
      continue;
    }
    let row_samples = sub_w as usize * channels;
    let row_bytes = bitpack::packed_len(depth, row_samples);
    let mut prev_row = vec![0u8; row_bytes];

    for ry in 0..sub_h {
      let Some((&filter_byte, rest)) = cursor.split_first() else {
        return Err(InflationError::UnexpectedEndOfInput.into());
      };
      if rest.len() < row_bytes {
        return Err(InflationError::UnexpectedEndOfInput.into());
      }
      let (row_slice, rest) = rest.split_at(row_bytes);
      let mut row = Vec::from(row_slice);
      let filter = FilterType::from_byte(filter_byte)?;
      unfilter_row(filter, &mut row, &prev_row, delay);

      for rx in 0..sub_w {
        let (full_x, full_y) = pass.full_pos(rx, ry);
        let storage_pixel = full_y as usize * width as usize + full_x as usize;
        for ch in 0..channels {
          let sample = bitpack::sample_at(&row, depth, rx as usize * channels + ch);
          bitpack::set_sample_at(&mut storage, depth, storage_pixel * channels + ch, sample);
        }
      }

      prev_row = row;
      cursor = rest;
    }
  }

  if !cursor.is_empty() {
    return Err(DecodingError::ExtraneousImageData.into());
  }
  Ok(storage)
}
