//! `bKGD`, the suggested default background color.

use super::ihdr::PixelFormat;
use crate::error::{ParsingError, PngError};

/// A `bKGD` chunk's payload, shaped according to the image's pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bkgd {
  Gray(u16),
  Rgb(u16, u16, u16),
  PaletteIndex(u8),
}

impl Bkgd {
  pub fn parse(data: &[u8], pixel_format: PixelFormat) -> Result<Self, PngError> {
    use PixelFormat::*;
    match pixel_format {
      Y1 | Y2 | Y4 | Y8 | Y16 | Ya8 | Ya16 => {
        let Some((bytes, _)) = crate::util::try_split_array::<2>(data) else {
          return Err(ParsingError::WrongChunkLength(*b"bKGD").into());
        };
        Ok(Bkgd::Gray(u16::from_be_bytes(bytes)))
      }
      Rgb8 | Rgb16 | Rgba8 | Rgba16 | Bgr8 | Bgra8 => {
        let Some((bytes, _)) = crate::util::try_split_array::<6>(data) else {
          return Err(ParsingError::WrongChunkLength(*b"bKGD").into());
        };
        let r = u16::from_be_bytes([bytes[0], bytes[1]]);
        let g = u16::from_be_bytes([bytes[2], bytes[3]]);
        let b = u16::from_be_bytes([bytes[4], bytes[5]]);
        Ok(Bkgd::Rgb(r, g, b))
      }
      Idx1 | Idx2 | Idx4 | Idx8 => match data.first() {
        Some(&idx) => Ok(Bkgd::PaletteIndex(idx)),
        None => Err(ParsingError::WrongChunkLength(*b"bKGD").into()),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gray_bkgd_parses() {
    assert_eq!(Bkgd::parse(&[0, 7], PixelFormat::Y8).unwrap(), Bkgd::Gray(7));
  }

  #[test]
  fn indexed_bkgd_parses_single_byte() {
    assert_eq!(Bkgd::parse(&[3], PixelFormat::Idx8).unwrap(), Bkgd::PaletteIndex(3));
  }
}
