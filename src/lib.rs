//! A `no_std` PNG decoder: chunk lexing, CgBI detection, DEFLATE inflation,
//! scanline unfiltering, Adam7 deinterlacing, and palette/chroma resolution,
//! exposed as one synchronous [`decode`] call.
//!
//! ```text
//! bytes -> chunk lexing -> inflate(IDAT*) -> unfilter + deinterlace -> Image
//! ```
//!
//! [`Image::unpack`] then turns the resolved, bit-packed storage into a
//! concrete pixel type ([`Rgba8`], [`Grayscale16`], ...) via [`PixelTarget`].
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod util;
mod error;
mod limits;
mod checksum;
mod bitpack;
mod adam7;
mod chunk;
mod inflate;
mod format;
mod targets;
mod reconstruct;
mod image;

pub use error::{DecodingError, InflationError, LexingError, ParsingError, PngError, TextError};
pub use limits::DecodeLimits;

pub use chunk::{
  Bkgd, Chrm, ChunkIdentifier, Hist, Iccp, Ihdr, InterlaceMethod, Phys, PixelFormat, Plte,
  PngTime, RenderingIntent, SignificantBits, Splt, TextChunk, Trns, PNG_SIGNATURE,
};
pub use format::{Format, Transparency};
pub use image::{decode, IccProfile, Image, Metadata, SuggestedPalette, TextEntry};
pub use inflate::{inflate_all, Format as CompressedFormat, Inflator, PushOutcome};
pub use reconstruct::FilterType;
pub use targets::{
  Grayscale16, Grayscale8, GrayscaleAlpha16, GrayscaleAlpha8, PixelTarget, Rgb16, Rgb8, Rgba16,
  Rgba8,
};

/// Convenience alias used throughout the crate's public API.
pub type PngResult<T> = Result<T, PngError>;
