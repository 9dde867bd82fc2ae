//! The decoded image, its ancillary metadata, and the top-level `decode`
//! coordinator that drives chunk lexing, inflation, and scanline
//! reconstruction end to end.

use crate::chunk::InterlaceMethod;
use crate::chunk::{
  Bkgd, Chrm, ChunkIdentifier, Hist, Iccp, Ihdr, OrderValidator, Phys, PngTime, RawChunkIter,
  RenderingIntent, SignificantBits, Splt, TextChunk, Trns,
};
use crate::chunk::{parse_gama, parse_srgb, Plte, PNG_SIGNATURE};
use crate::error::{DecodingError, LexingError, ParsingError, PngError};
use crate::format::Format;
use crate::inflate::{Format as InflateFormat, Inflator};
use crate::limits::DecodeLimits;
use crate::reconstruct;
use crate::targets::PixelTarget;
use alloc::vec::Vec;

/// One embedded ICC color profile (`iCCP`), already inflated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccProfile {
  pub name: Vec<u8>,
  pub profile: Vec<u8>,
}

/// One suggested palette entry (`sPLT`), kept as the raw per-entry bytes
/// (their width depends on `sample_depth`, 6 or 10 bytes per entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedPalette {
  pub name: Vec<u8>,
  pub sample_depth: u8,
  pub entries: Vec<u8>,
}

/// One textual chunk (`tEXt`/`zTXt`/`iTXt`), with compression already
/// resolved. `language_tag`/`translated_keyword` are empty for `tEXt` and
/// `zTXt`, which don't carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
  pub keyword: Vec<u8>,
  pub language_tag: Vec<u8>,
  pub translated_keyword: Vec<u8>,
  pub text: Vec<u8>,
}

/// Every ancillary chunk this crate understands, accumulated while lexing
/// up to the first `IDAT`. Everything here is optional; a conforming PNG
/// may omit all of it.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
  pub chrm: Option<Chrm>,
  pub gamma: Option<u32>,
  pub srgb: Option<RenderingIntent>,
  pub significant_bits: Option<SignificantBits>,
  pub icc_profile: Option<IccProfile>,
  pub physical_dimensions: Option<Phys>,
  pub modification_time: Option<PngTime>,
  pub histogram: Option<Vec<u16>>,
  pub suggested_palettes: Vec<SuggestedPalette>,
  pub text: Vec<TextEntry>,
  /// `(type, payload)` for every well-formed but unrecognized chunk.
  pub unrecognized: Vec<(ChunkIdentifier, Vec<u8>)>,
}

/// A fully decoded PNG: dimensions, resolved color format, accumulated
/// ancillary metadata, and tightly bit-packed pixel storage.
#[derive(Debug, Clone)]
pub struct Image {
  pub width: u32,
  pub height: u32,
  pub interlace: InterlaceMethod,
  pub format: Format,
  pub metadata: Metadata,
  pub storage: Vec<u8>,
}

impl Image {
  /// Unpacks `storage` into a caller-chosen concrete pixel type, deindexing
  /// through the palette and applying chroma-key transparency as needed.
  pub fn unpack<T: PixelTarget>(&self) -> Vec<T::Aggregate> {
    T::unpack(&self.storage, &self.format, self.width, self.height)
  }
}

fn record_text(
  metadata: &mut Metadata,
  ancillary_bytes_used: &mut usize,
  limits: &DecodeLimits,
  chunk: TextChunk<'_>,
) -> Result<(), PngError> {
  let (keyword, language_tag, translated_keyword) = match chunk {
    TextChunk::Text { keyword, .. } | TextChunk::CompressedText { keyword, .. } => {
      (keyword, &b""[..], &b""[..])
    }
    TextChunk::International { keyword, language_tag, translated_keyword, .. } => {
      (keyword, language_tag, translated_keyword)
    }
  };
  let text = chunk.decode_text()?;
  *ancillary_bytes_used += keyword.len() + language_tag.len() + translated_keyword.len() + text.len();
  if *ancillary_bytes_used > limits.max_ancillary_bytes {
    return Err(LexingError::ChunkTooLarge.into());
  }
  metadata.text.push(TextEntry {
    keyword: keyword.to_vec(),
    language_tag: language_tag.to_vec(),
    translated_keyword: translated_keyword.to_vec(),
    text,
  });
  Ok(())
}

/// Decodes a complete PNG byte stream into an [`Image`].
///
/// Unlike [`crate::inflate::Inflator`], this entry point is synchronous: it
/// expects the whole datastream up front rather than arriving byte by byte.
/// Internally it still drives the inflator through `push`/`pull_all` exactly
/// as a streaming caller would, one `IDAT` payload at a time.
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<Image, PngError> {
  let Some((sig, rest)) = crate::util::try_split_array::<8>(bytes) else {
    return Err(LexingError::TruncatedSignature.into());
  };
  if sig != PNG_SIGNATURE {
    return Err(LexingError::BadSignatureBytes.into());
  }

  let mut validator = OrderValidator::new();
  let iter = RawChunkIter::new(rest, *limits);

  let mut is_ios = false;
  let mut ihdr: Option<Ihdr> = None;
  let mut palette: Option<Plte<'_>> = None;
  let mut trns: Option<Trns<'_>> = None;
  let mut bkgd: Option<Bkgd> = None;
  let mut inflator: Option<Inflator> = None;
  let mut resolved_format: Option<Format> = None;
  let mut metadata = Metadata::default();
  let mut ancillary_bytes_used = 0usize;

  for chunk in iter {
    let chunk = chunk?;
    chunk.verify_crc()?;
    validator.observe(chunk.ty)?;
    log::trace!("pngcore: chunk {:?} ({} bytes)", chunk.ty, chunk.data.len());

    if chunk.ty == ChunkIdentifier::CGBI {
      is_ios = true;
      continue;
    }
    if chunk.ty == ChunkIdentifier::IHDR {
      let parsed = Ihdr::parse(chunk.data, is_ios)?;
      if (parsed.width as u64) * (parsed.height as u64) > limits.max_image_pixels {
        return Err(ParsingError::ImageTooLarge.into());
      }
      ihdr = Some(parsed);
      continue;
    }
    if chunk.ty == ChunkIdentifier::IEND {
      break;
    }

    let Some(ihdr_ref) = ihdr.as_ref() else {
      return Err(DecodingError::Required(*b"IHDR", chunk.ty.0).into());
    };

    match chunk.ty {
      ChunkIdentifier::PLTE => {
        palette = Some(Plte::parse(chunk.data, ihdr_ref.pixel_format.depth())?);
      }
      ChunkIdentifier::TRNS => {
        trns = Some(Trns::parse(chunk.data, ihdr_ref.pixel_format)?);
      }
      ChunkIdentifier::BKGD => {
        bkgd = Some(Bkgd::parse(chunk.data, ihdr_ref.pixel_format)?);
      }
      ChunkIdentifier::CHRM => metadata.chrm = Some(Chrm::parse(chunk.data)?),
      ChunkIdentifier::GAMA => metadata.gamma = Some(parse_gama(chunk.data)?),
      ChunkIdentifier::SRGB => metadata.srgb = Some(parse_srgb(chunk.data)?),
      ChunkIdentifier::SBIT => {
        metadata.significant_bits =
          Some(SignificantBits::parse(chunk.data, ihdr_ref.pixel_format.channels())?);
      }
      ChunkIdentifier::PHYS => metadata.physical_dimensions = Some(Phys::parse(chunk.data)?),
      ChunkIdentifier::TIME => metadata.modification_time = Some(PngTime::parse(chunk.data)?),
      ChunkIdentifier::HIST => {
        let palette_len = palette.as_ref().map(Plte::len).unwrap_or(0);
        let hist = Hist::parse(chunk.data, palette_len)?;
        let count = chunk.data.len() / 2;
        metadata.histogram = Some((0..count).map(|i| hist.frequency(i).unwrap()).collect());
      }
      ChunkIdentifier::SPLT => {
        let splt = Splt::parse(chunk.data)?;
        ancillary_bytes_used += chunk.data.len();
        if ancillary_bytes_used > limits.max_ancillary_bytes {
          return Err(LexingError::ChunkTooLarge.into());
        }
        metadata.suggested_palettes.push(SuggestedPalette {
          name: splt.name().to_vec(),
          sample_depth: splt.sample_depth(),
          entries: splt.entry_data().to_vec(),
        });
      }
      ChunkIdentifier::ICCP => {
        let iccp = Iccp::parse(chunk.data)?;
        let profile = iccp.inflate_profile()?;
        ancillary_bytes_used += iccp.name().len() + profile.len();
        if ancillary_bytes_used > limits.max_ancillary_bytes {
          return Err(LexingError::ChunkTooLarge.into());
        }
        metadata.icc_profile = Some(IccProfile { name: iccp.name().to_vec(), profile });
      }
      ChunkIdentifier::TEXT => {
        record_text(&mut metadata, &mut ancillary_bytes_used, limits, TextChunk::parse_text(chunk.data)?)?;
      }
      ChunkIdentifier::ZTXT => {
        record_text(&mut metadata, &mut ancillary_bytes_used, limits, TextChunk::parse_ztxt(chunk.data)?)?;
      }
      ChunkIdentifier::ITXT => {
        record_text(&mut metadata, &mut ancillary_bytes_used, limits, TextChunk::parse_itxt(chunk.data)?)?;
      }
      ChunkIdentifier::IDAT => {
        if inflator.is_none() {
          let format = Format::resolve(ihdr_ref.pixel_format, palette.take(), trns.take(), bkgd.take())?;
          inflator = Some(Inflator::new(if is_ios { InflateFormat::Ios } else { InflateFormat::Zlib }));
          resolved_format = Some(format);
        }
        inflator.as_mut().unwrap().push(chunk.data)?;
      }
      _ => {
        if !chunk.ty.is_known() {
          ancillary_bytes_used += chunk.data.len();
          if ancillary_bytes_used > limits.max_ancillary_bytes {
            return Err(LexingError::ChunkTooLarge.into());
          }
          metadata.unrecognized.push((chunk.ty, chunk.data.to_vec()));
        }
      }
    }
  }

  let ihdr = ihdr.ok_or(PngError::from(DecodingError::Required(*b"IHDR", *b"IEND")))?;
  let mut inflator = inflator.ok_or(PngError::from(DecodingError::Required(*b"IDAT", *b"IEND")))?;
  if !inflator.is_done() {
    return Err(DecodingError::IncompleteImageDataCompressedDatastream.into());
  }
  let decompressed = inflator.pull_all();
  let format = resolved_format.expect("set alongside the inflator at the first IDAT");

  let storage =
    reconstruct::reconstruct_image(&decompressed, ihdr.width, ihdr.height, ihdr.pixel_format, ihdr.interlace)?;

  Ok(Image { width: ihdr.width, height: ihdr.height, interlace: ihdr.interlace, format, metadata, storage })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::checksum::crc32_of_chunk;
  use alloc::vec;

  fn push_chunk(out: &mut Vec<u8>, ty: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(ty);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32_of_chunk(*ty, data).to_be_bytes());
  }

  /// A minimal stored-block zlib stream wrapping `data` exactly, built by
  /// hand so these tests don't need a compression crate.
  fn zlib_stored(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(0x78);
    out.push(0x01);
    out.push(1); // BFINAL=1, BTYPE=00
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(&(!(data.len() as u16)).to_le_bytes());
    out.extend_from_slice(data);
    let mut adler = crate::checksum::Adler32::new();
    adler.update(data);
    out.extend_from_slice(&adler.finish().to_be_bytes());
    out
  }

  fn minimal_ihdr(width: u32, height: u32, depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.push(depth);
    data.push(color_type);
    data.push(0);
    data.push(0);
    data.push(interlace);
    data
  }

  #[test]
  fn decodes_a_minimal_one_by_one_rgba8_image() {
    let mut bytes = Vec::from(PNG_SIGNATURE);
    push_chunk(&mut bytes, b"IHDR", &minimal_ihdr(1, 1, 8, 6, 0));
    let scanline = [0u8, 10, 20, 30, 40]; // filter none, then r,g,b,a
    let idat = zlib_stored(&scanline);
    push_chunk(&mut bytes, b"IDAT", &idat);
    push_chunk(&mut bytes, b"IEND", &[]);

    let image = decode(&bytes, &DecodeLimits::default()).unwrap();
    assert_eq!((image.width, image.height), (1, 1));
    assert_eq!(image.storage, vec![10, 20, 30, 40]);
  }

  #[test]
  fn rejects_bad_signature() {
    let bytes = [0u8; 8];
    assert_eq!(
      decode(&bytes, &DecodeLimits::default()),
      Err(PngError::Lexing(LexingError::BadSignatureBytes))
    );
  }

  #[test]
  fn rejects_crc_mismatch() {
    let mut bytes = Vec::from(PNG_SIGNATURE);
    let data = minimal_ihdr(1, 1, 8, 6, 0);
    bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&data);
    bytes.extend_from_slice(&0u32.to_be_bytes()); // declared CRC doesn't match the real data
    assert!(matches!(
      decode(&bytes, &DecodeLimits::default()),
      Err(PngError::Lexing(LexingError::InvalidChunkChecksum))
    ));
  }

  #[test]
  fn rejects_indexed_image_missing_palette() {
    let mut bytes = Vec::from(PNG_SIGNATURE);
    push_chunk(&mut bytes, b"IHDR", &minimal_ihdr(1, 1, 8, 3, 0));
    let idat = zlib_stored(&[0u8, 0]);
    push_chunk(&mut bytes, b"IDAT", &idat);
    push_chunk(&mut bytes, b"IEND", &[]);
    assert!(matches!(
      decode(&bytes, &DecodeLimits::default()),
      Err(PngError::Decoding(DecodingError::Required(..)))
    ));
  }

  #[test]
  fn rejects_noncontiguous_idat() {
    let mut bytes = Vec::from(PNG_SIGNATURE);
    push_chunk(&mut bytes, b"IHDR", &minimal_ihdr(1, 1, 8, 6, 0));
    let scanline = [0u8, 10, 20, 30, 40];
    let idat = zlib_stored(&scanline);
    let half = idat.len() / 2;
    push_chunk(&mut bytes, b"IDAT", &idat[..half]);
    push_chunk(&mut bytes, b"tEXt", b"k\0v");
    push_chunk(&mut bytes, b"IDAT", &idat[half..]);
    push_chunk(&mut bytes, b"IEND", &[]);
    assert!(matches!(
      decode(&bytes, &DecodeLimits::default()),
      Err(PngError::Decoding(DecodingError::Unexpected(..)))
    ));
  }

  #[test]
  fn decodes_ios_cgbi_variant() {
    let mut bytes = Vec::from(PNG_SIGNATURE);
    push_chunk(&mut bytes, b"CgBI", &[0, 0, 0, 0]);
    push_chunk(&mut bytes, b"IHDR", &minimal_ihdr(1, 1, 8, 6, 0));
    let scanline = [0u8, 10, 20, 30, 40];
    let mut idat = Vec::new();
    idat.push(1); // BFINAL=1, BTYPE=00, no zlib wrapper for CgBI
    idat.extend_from_slice(&(scanline.len() as u16).to_le_bytes());
    idat.extend_from_slice(&(!(scanline.len() as u16)).to_le_bytes());
    idat.extend_from_slice(&scanline);
    push_chunk(&mut bytes, b"IDAT", &idat);
    push_chunk(&mut bytes, b"IEND", &[]);

    let image = decode(&bytes, &DecodeLimits::default()).unwrap();
    // CgBI stores rgba8 as bgra8
    assert_eq!(image.format.pixel_format, crate::chunk::PixelFormat::Bgra8);
    assert_eq!(image.storage, vec![10, 20, 30, 40]);
  }
}
