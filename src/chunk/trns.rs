//! `tRNS`, transparency information: either a chroma key for direct color
//! formats, or per-palette-entry alpha for indexed ones.

use super::ihdr::PixelFormat;
use crate::error::{ParsingError, PngError};

/// A `tRNS` chunk's payload, shaped according to the image's pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trns<'b> {
  /// A single grayscale sample value to treat as transparent.
  GrayKey(u16),
  /// An `(r, g, b)` sample tuple to treat as transparent.
  RgbKey(u16, u16, u16),
  /// Per-palette-entry alpha, in palette order. Entries beyond this slice
  /// (but within the palette) default to fully opaque.
  Alphas(&'b [u8]),
}

impl<'b> Trns<'b> {
  pub fn parse(data: &'b [u8], pixel_format: PixelFormat) -> Result<Self, PngError> {
    use PixelFormat::*;
    match pixel_format {
      Y1 | Y2 | Y4 | Y8 | Y16 => {
        let Some((bytes, _)) = crate::util::try_split_array::<2>(data) else {
          return Err(ParsingError::WrongChunkLength(*b"tRNS").into());
        };
        Ok(Trns::GrayKey(u16::from_be_bytes(bytes)))
      }
      Rgb8 | Rgb16 | Bgr8 => {
        let Some((bytes, _)) = crate::util::try_split_array::<6>(data) else {
          return Err(ParsingError::WrongChunkLength(*b"tRNS").into());
        };
        let r = u16::from_be_bytes([bytes[0], bytes[1]]);
        let g = u16::from_be_bytes([bytes[2], bytes[3]]);
        let b = u16::from_be_bytes([bytes[4], bytes[5]]);
        Ok(Trns::RgbKey(r, g, b))
      }
      Idx1 | Idx2 | Idx4 | Idx8 => Ok(Trns::Alphas(data)),
      // alpha-carrying formats never have a meaningful tRNS
      Ya8 | Ya16 | Rgba8 | Rgba16 | Bgra8 => {
        Err(ParsingError::FieldOutOfRange(*b"tRNS").into())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gray_key_round_trips() {
    let trns = Trns::parse(&[0, 42], PixelFormat::Y8).unwrap();
    assert_eq!(trns, Trns::GrayKey(42));
  }

  #[test]
  fn rgb_key_round_trips() {
    let trns = Trns::parse(&[0, 1, 0, 2, 0, 3], PixelFormat::Rgb8).unwrap();
    assert_eq!(trns, Trns::RgbKey(1, 2, 3));
  }

  #[test]
  fn indexed_alphas_pass_through() {
    let trns = Trns::parse(&[10, 20, 30], PixelFormat::Idx8).unwrap();
    assert_eq!(trns, Trns::Alphas(&[10, 20, 30]));
  }

  #[test]
  fn rejects_alpha_formats() {
    assert!(Trns::parse(&[], PixelFormat::Rgba8).is_err());
  }
}
