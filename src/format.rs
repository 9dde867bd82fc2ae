//! The resolved, self-consistent description of how an image's samples map
//! to pixels: the pixel format plus whichever of `PLTE`/`tRNS`/`bKGD` the
//! stream actually carried, validated against each other.

use crate::chunk::{Bkgd, PixelFormat, Plte, Trns};
use crate::error::{DecodingError, ParsingError, PngError};
use alloc::vec::Vec;

/// Owned transparency information, detached from the `tRNS` chunk's
/// borrowed payload so it can outlive the decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transparency {
  GrayKey(u16),
  RgbKey(u16, u16, u16),
  /// Per-palette-entry alpha. Indices beyond this vector default to opaque.
  Alphas(Vec<u8>),
}

impl From<Trns<'_>> for Transparency {
  fn from(t: Trns<'_>) -> Self {
    match t {
      Trns::GrayKey(v) => Self::GrayKey(v),
      Trns::RgbKey(r, g, b) => Self::RgbKey(r, g, b),
      Trns::Alphas(a) => Self::Alphas(a.to_vec()),
    }
  }
}

/// The fully resolved color model of a decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
  pub pixel_format: PixelFormat,
  pub palette: Option<Vec<[u8; 3]>>,
  pub transparency: Option<Transparency>,
  pub background: Option<Bkgd>,
}

impl Format {
  /// Builds a [`Format`], enforcing that a palette is present exactly when
  /// `pixel_format` is indexed, and rejecting a `bKGD` palette index that
  /// falls outside the palette's actual entry count.
  pub fn resolve(
    pixel_format: PixelFormat,
    palette: Option<Plte<'_>>,
    trns: Option<Trns<'_>>,
    background: Option<Bkgd>,
  ) -> Result<Self, PngError> {
    let palette = match (pixel_format.is_indexed(), palette) {
      (true, Some(plte)) => Some(plte.entries().to_vec()),
      (true, None) => return Err(DecodingError::Required(*b"IDAT", *b"PLTE").into()),
      (false, None) => None,
      (false, Some(plte)) => {
        // PLTE is legal (but unused) alongside color types 2/6, forbidden
        // for grayscale ones.
        if !pixel_format.has_color() {
          return Err(ParsingError::FieldOutOfRange(*b"PLTE").into());
        }
        let _ = plte;
        None
      }
    };

    if let (Some(Bkgd::PaletteIndex(idx)), Some(pal)) = (&background, &palette) {
      if *idx as usize >= pal.len() {
        return Err(ParsingError::FieldOutOfRange(*b"bKGD").into());
      }
    }

    let transparency = trns.map(Transparency::from);
    if let Some(Transparency::Alphas(a)) = &transparency {
      if a.len() > palette.as_ref().map_or(0, Vec::len) {
        return Err(ParsingError::FieldOutOfRange(*b"tRNS").into());
      }
    }

    Ok(Self { pixel_format, palette, transparency, background })
  }
}
