//! `IHDR`, the mandatory first chunk, and the pixel-format enumeration it
//! selects.

use crate::error::{ParsingError, PngError};

/// Bit-depth x channel-layout combination a PNG's samples are stored in.
///
/// `Bgr8`/`Bgra8` only ever appear for the Apple iOS `CgBI` variant: the
/// wire color type is still 2/6 (rgb/rgba), but the stored channel order is
/// swapped and the zlib wrapper is stripped from the `IDAT` stream (see
/// [`crate::chunk::OrderValidator::is_ios`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
  Y1,
  Y2,
  Y4,
  Y8,
  Y16,
  Ya8,
  Ya16,
  Rgb8,
  Rgb16,
  Rgba8,
  Rgba16,
  Idx1,
  Idx2,
  Idx4,
  Idx8,
  Bgr8,
  Bgra8,
}

impl PixelFormat {
  /// Bits per sample, 1 through 16.
  #[inline]
  pub const fn depth(self) -> u32 {
    use PixelFormat::*;
    match self {
      Y1 | Idx1 => 1,
      Y2 | Idx2 => 2,
      Y4 | Idx4 => 4,
      Y8 | Ya8 | Rgb8 | Rgba8 | Idx8 | Bgr8 | Bgra8 => 8,
      Y16 | Ya16 | Rgb16 | Rgba16 => 16,
    }
  }

  /// Samples per pixel (e.g. 4 for `Rgba8`, 1 for an indexed or grayscale
  /// format, since indexed storage holds one index per pixel regardless of
  /// palette channel count).
  #[inline]
  pub const fn channels(self) -> u32 {
    use PixelFormat::*;
    match self {
      Y1 | Y2 | Y4 | Y8 | Y16 | Idx1 | Idx2 | Idx4 | Idx8 => 1,
      Ya8 | Ya16 => 2,
      Rgb8 | Rgb16 | Bgr8 => 3,
      Rgba8 | Rgba16 | Bgra8 => 4,
    }
  }

  #[inline]
  pub const fn has_color(self) -> bool {
    use PixelFormat::*;
    matches!(self, Rgb8 | Rgb16 | Rgba8 | Rgba16 | Idx1 | Idx2 | Idx4 | Idx8 | Bgr8 | Bgra8)
  }

  #[inline]
  pub const fn has_alpha(self) -> bool {
    use PixelFormat::*;
    matches!(self, Ya8 | Ya16 | Rgba8 | Rgba16 | Bgra8)
  }

  #[inline]
  pub const fn is_indexed(self) -> bool {
    use PixelFormat::*;
    matches!(self, Idx1 | Idx2 | Idx4 | Idx8)
  }

  /// Bits per pixel: `depth * channels`.
  #[inline]
  pub const fn volume(self) -> u32 {
    self.depth() * self.channels()
  }

  /// Bytes needed to store one scanline of `width` pixels at this format,
  /// not counting the leading filter-type byte.
  #[inline]
  pub const fn bytes_per_scanline(self, width: u32) -> usize {
    let bits = self.volume() as u64 * width as u64;
    ((bits + 7) / 8) as usize
  }

  /// "Delay": bytes per pixel used as the filter-reversal neighbor offset,
  /// a minimum of 1 for sub-byte-depth formats (`spec.md` §4.4's `delay`).
  #[inline]
  pub const fn filter_delay(self) -> usize {
    let v = self.volume();
    (((v + 7) / 8) as usize).max(1)
  }

  fn from_color_type_and_depth(color_type: u8, depth: u8) -> Result<Self, ParsingError> {
    use PixelFormat::*;
    Ok(match (color_type, depth) {
      (0, 1) => Y1,
      (0, 2) => Y2,
      (0, 4) => Y4,
      (0, 8) => Y8,
      (0, 16) => Y16,
      (2, 8) => Rgb8,
      (2, 16) => Rgb16,
      (3, 1) => Idx1,
      (3, 2) => Idx2,
      (3, 4) => Idx4,
      (3, 8) => Idx8,
      (4, 8) => Ya8,
      (4, 16) => Ya16,
      (6, 8) => Rgba8,
      (6, 16) => Rgba16,
      _ => return Err(ParsingError::IllegalColorTypeBitDepthCombination),
    })
  }
}

/// How the image's rows are ordered in the `IDAT` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterlaceMethod {
  None,
  Adam7,
}

/// The parsed `IHDR` chunk: image dimensions, pixel format, and interlacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ihdr {
  pub width: u32,
  pub height: u32,
  pub pixel_format: PixelFormat,
  pub interlace: InterlaceMethod,
}

impl Ihdr {
  /// Parses the 13-byte `IHDR` payload.
  ///
  /// `is_ios` selects the `CgBI` restricted pixel-format set (rgb8/rgba8
  /// only, reinterpreted as the BGR/BGRA storage order).
  pub fn parse(data: &[u8], is_ios: bool) -> Result<Self, PngError> {
    let Some((bytes, _)) = crate::util::try_split_array::<13>(data) else {
      return Err(ParsingError::WrongChunkLength(*b"IHDR").into());
    };
    let width = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
    let depth = bytes[8];
    let color_type = bytes[9];
    let compression_method = bytes[10];
    let filter_method = bytes[11];
    let interlace_method = bytes[12];

    if width == 0 || height == 0 {
      return Err(ParsingError::WidthOrHeightZero.into());
    }
    if compression_method != 0 {
      return Err(ParsingError::IllegalCompressionMethod.into());
    }
    if filter_method != 0 {
      return Err(ParsingError::IllegalFilterMethod.into());
    }
    let interlace = match interlace_method {
      0 => InterlaceMethod::None,
      1 => InterlaceMethod::Adam7,
      _ => return Err(ParsingError::IllegalInterlaceMethod.into()),
    };

    let mut pixel_format = PixelFormat::from_color_type_and_depth(color_type, depth)?;
    if is_ios {
      pixel_format = match pixel_format {
        PixelFormat::Rgb8 => PixelFormat::Bgr8,
        PixelFormat::Rgba8 => PixelFormat::Bgra8,
        _ => return Err(ParsingError::IllegalColorTypeBitDepthCombination.into()),
      };
    }

    Ok(Self { width, height, pixel_format, interlace })
  }
}
