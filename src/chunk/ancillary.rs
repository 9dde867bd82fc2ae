//! The "at most one", text, and other ancillary chunks: `cHRM`, `gAMA`,
//! `sBIT`, `sRGB`, `pHYs`, `tIME`, `hIST`, `sPLT`, `iCCP`, `tEXt`, `zTXt`,
//! `iTXt`.

use crate::error::{ParsingError, PngError, TextError};

/// `cHRM`: white point and the three primary chromaticities, each as the
/// raw PNG fixed-point value (the stored integer is the real value times
/// 100,000; this crate does not convert to floating point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chrm {
  pub white_point: (u32, u32),
  pub red: (u32, u32),
  pub green: (u32, u32),
  pub blue: (u32, u32),
}

impl Chrm {
  pub fn parse(data: &[u8]) -> Result<Self, PngError> {
    let Some((bytes, _)) = crate::util::try_split_array::<32>(data) else {
      return Err(ParsingError::WrongChunkLength(*b"cHRM").into());
    };
    let u = |i: usize| u32::from_be_bytes(bytes[i..i + 4].try_into().unwrap());
    Ok(Self {
      white_point: (u(0), u(4)),
      red: (u(8), u(12)),
      green: (u(16), u(20)),
      blue: (u(24), u(28)),
    })
  }
}

/// `gAMA`: image gamma times 100,000.
pub fn parse_gama(data: &[u8]) -> Result<u32, PngError> {
  let Some((bytes, _)) = crate::util::try_split_array::<4>(data) else {
    return Err(ParsingError::WrongChunkLength(*b"gAMA").into());
  };
  Ok(u32::from_be_bytes(bytes))
}

/// `sRGB`: rendering intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderingIntent {
  Perceptual,
  RelativeColorimetric,
  Saturation,
  AbsoluteColorimetric,
}

pub fn parse_srgb(data: &[u8]) -> Result<RenderingIntent, PngError> {
  match data.first() {
    Some(0) => Ok(RenderingIntent::Perceptual),
    Some(1) => Ok(RenderingIntent::RelativeColorimetric),
    Some(2) => Ok(RenderingIntent::Saturation),
    Some(3) => Ok(RenderingIntent::AbsoluteColorimetric),
    _ => Err(ParsingError::IllegalRenderingIntent.into()),
  }
}

/// `sBIT`: significant bits per channel, shape depends on color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignificantBits {
  Gray(u8),
  GrayAlpha(u8, u8),
  Rgb(u8, u8, u8),
  Rgba(u8, u8, u8, u8),
}

impl SignificantBits {
  pub fn parse(data: &[u8], channels: u32) -> Result<Self, PngError> {
    Ok(match (channels, data) {
      (1, [g, ..]) => Self::Gray(*g),
      (2, [g, a, ..]) => Self::GrayAlpha(*g, *a),
      (3, [r, g, b, ..]) => Self::Rgb(*r, *g, *b),
      (4, [r, g, b, a, ..]) => Self::Rgba(*r, *g, *b, *a),
      _ => return Err(ParsingError::WrongChunkLength(*b"sBIT").into()),
    })
  }
}

/// `pHYs`: physical pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phys {
  pub pixels_per_unit_x: u32,
  pub pixels_per_unit_y: u32,
  /// `false` = unknown unit, `true` = meter.
  pub unit_is_meter: bool,
}

impl Phys {
  pub fn parse(data: &[u8]) -> Result<Self, PngError> {
    let Some((bytes, _)) = crate::util::try_split_array::<9>(data) else {
      return Err(ParsingError::WrongChunkLength(*b"pHYs").into());
    };
    let unit = match bytes[8] {
      0 => false,
      1 => true,
      _ => return Err(ParsingError::IllegalDensityUnit.into()),
    };
    Ok(Self {
      pixels_per_unit_x: u32::from_be_bytes(bytes[0..4].try_into().unwrap()),
      pixels_per_unit_y: u32::from_be_bytes(bytes[4..8].try_into().unwrap()),
      unit_is_meter: unit,
    })
  }
}

/// `tIME`: last modification time, stored fields straight from the wire
/// (no calendar validation is performed by the core).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PngTime {
  pub year: u16,
  pub month: u8,
  pub day: u8,
  pub hour: u8,
  pub minute: u8,
  pub second: u8,
}

impl PngTime {
  pub fn parse(data: &[u8]) -> Result<Self, PngError> {
    let Some((bytes, _)) = crate::util::try_split_array::<7>(data) else {
      return Err(ParsingError::WrongChunkLength(*b"tIME").into());
    };
    Ok(Self {
      year: u16::from_be_bytes([bytes[0], bytes[1]]),
      month: bytes[2],
      day: bytes[3],
      hour: bytes[4],
      minute: bytes[5],
      second: bytes[6],
    })
  }
}

/// `hIST`: one relative-frequency value per palette entry. Requires that a
/// `PLTE` chunk has already been seen (enforced by
/// [`crate::chunk::OrderValidator`], not by this parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hist<'b> {
  frequencies: &'b [[u8; 2]],
}

impl<'b> Hist<'b> {
  pub fn parse(data: &'b [u8], palette_len: usize) -> Result<Self, PngError> {
    if data.len() % 2 != 0 {
      return Err(ParsingError::WrongChunkLength(*b"hIST").into());
    }
    let frequencies: &[[u8; 2]] = bytemuck::cast_slice(data);
    if frequencies.len() > palette_len {
      return Err(ParsingError::FieldOutOfRange(*b"hIST").into());
    }
    Ok(Self { frequencies })
  }

  #[inline]
  pub fn frequency(&self, index: usize) -> Option<u16> {
    self.frequencies.get(index).map(|b| u16::from_be_bytes(*b))
  }
}

/// `sPLT`: a suggested palette. Kept as raw bytes per the format's own
/// "unbounded, app-defined" treatment; callers that need the individual
/// `(r, g, b, a, frequency)` entries parse `data()` themselves, since the
/// entry width (6 or 10 bytes) depends on the embedded sample depth byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Splt<'b> {
  raw: &'b [u8],
}

impl<'b> Splt<'b> {
  pub fn parse(data: &'b [u8]) -> Result<Self, PngError> {
    let Some(null_pos) = data.iter().position(|&b| b == 0) else {
      return Err(ParsingError::WrongChunkLength(*b"sPLT").into());
    };
    if null_pos == 0 || null_pos > 79 || data.len() <= null_pos + 1 {
      return Err(ParsingError::FieldOutOfRange(*b"sPLT").into());
    }
    Ok(Self { raw: data })
  }

  #[inline]
  pub fn name(&self) -> &'b [u8] {
    let pos = self.raw.iter().position(|&b| b == 0).unwrap();
    &self.raw[..pos]
  }

  #[inline]
  pub fn sample_depth(&self) -> u8 {
    let pos = self.raw.iter().position(|&b| b == 0).unwrap();
    self.raw[pos + 1]
  }

  #[inline]
  pub fn entry_data(&self) -> &'b [u8] {
    let pos = self.raw.iter().position(|&b| b == 0).unwrap();
    &self.raw[pos + 2..]
  }
}

/// `iCCP`: an embedded ICC profile. The profile bytes are zlib-compressed
/// with the exact same DEFLATE format the `IDAT` stream uses, so inflating
/// them reuses [`crate::inflate::Inflator`] rather than a second codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Iccp<'b> {
  name: &'b [u8],
  compressed_profile: &'b [u8],
}

impl<'b> Iccp<'b> {
  pub fn parse(data: &'b [u8]) -> Result<Self, PngError> {
    let Some(null_pos) = data.iter().position(|&b| b == 0) else {
      return Err(ParsingError::WrongChunkLength(*b"iCCP").into());
    };
    if null_pos == 0 || null_pos > 79 || data.len() <= null_pos + 2 {
      return Err(ParsingError::FieldOutOfRange(*b"iCCP").into());
    }
    let name = &data[..null_pos];
    let compression_method = data[null_pos + 1];
    if compression_method != 0 {
      return Err(TextError::IllegalCompressionMethod.into());
    }
    Ok(Self { name, compressed_profile: &data[null_pos + 2..] })
  }

  #[inline]
  pub fn name(&self) -> &'b [u8] {
    self.name
  }

  #[inline]
  pub fn compressed_profile(&self) -> &'b [u8] {
    self.compressed_profile
  }

  /// Inflates the embedded ICC profile.
  #[cfg(feature = "alloc")]
  pub fn inflate_profile(&self) -> Result<alloc::vec::Vec<u8>, PngError> {
    crate::inflate::inflate_all(self.compressed_profile, crate::inflate::Format::Zlib)
  }
}

/// One parsed textual chunk: `tEXt` (uncompressed), `zTXt` (zlib
/// compressed), or `iTXt` (optionally compressed, UTF-8, with language and
/// translated-keyword metadata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextChunk<'b> {
  Text { keyword: &'b [u8], text: &'b [u8] },
  CompressedText { keyword: &'b [u8], compressed_text: &'b [u8] },
  International {
    keyword: &'b [u8],
    compressed: bool,
    language_tag: &'b [u8],
    translated_keyword: &'b [u8],
    text_or_compressed: &'b [u8],
  },
}

fn validate_keyword(keyword: &[u8]) -> Result<(), TextError> {
  if keyword.is_empty() {
    return Err(TextError::KeywordEmpty);
  }
  if keyword.len() > 79 {
    return Err(TextError::KeywordTooLong);
  }
  if keyword.contains(&0) {
    return Err(TextError::KeywordHasNullByte);
  }
  Ok(())
}

impl<'b> TextChunk<'b> {
  pub fn parse_text(data: &'b [u8]) -> Result<Self, PngError> {
    let Some(null_pos) = data.iter().position(|&b| b == 0) else {
      return Err(TextError::MissingNullSeparator.into());
    };
    let keyword = &data[..null_pos];
    validate_keyword(keyword)?;
    Ok(Self::Text { keyword, text: &data[null_pos + 1..] })
  }

  pub fn parse_ztxt(data: &'b [u8]) -> Result<Self, PngError> {
    let Some(null_pos) = data.iter().position(|&b| b == 0) else {
      return Err(TextError::MissingNullSeparator.into());
    };
    let keyword = &data[..null_pos];
    validate_keyword(keyword)?;
    if data.len() <= null_pos + 1 {
      return Err(TextError::MissingNullSeparator.into());
    }
    if data[null_pos + 1] != 0 {
      return Err(TextError::IllegalCompressionMethod.into());
    }
    Ok(Self::CompressedText { keyword, compressed_text: &data[null_pos + 2..] })
  }

  pub fn parse_itxt(data: &'b [u8]) -> Result<Self, PngError> {
    let Some(kw_null) = data.iter().position(|&b| b == 0) else {
      return Err(TextError::MissingNullSeparator.into());
    };
    let keyword = &data[..kw_null];
    validate_keyword(keyword)?;
    let rest = &data[kw_null + 1..];
    let [compression_flag, compression_method, rest @ ..] = rest else {
      return Err(TextError::MissingNullSeparator.into());
    };
    let compressed = match compression_flag {
      0 => false,
      1 => true,
      _ => return Err(TextError::IllegalCompressionFlag.into()),
    };
    if compressed && *compression_method != 0 {
      return Err(TextError::IllegalCompressionMethod.into());
    }
    let Some(lang_null) = rest.iter().position(|&b| b == 0) else {
      return Err(TextError::BadLanguageTag.into());
    };
    let language_tag = &rest[..lang_null];
    let rest = &rest[lang_null + 1..];
    let Some(trans_null) = rest.iter().position(|&b| b == 0) else {
      return Err(TextError::MissingNullSeparator.into());
    };
    let translated_keyword = &rest[..trans_null];
    let text_or_compressed = &rest[trans_null + 1..];
    Ok(Self::International { keyword, compressed, language_tag, translated_keyword, text_or_compressed })
  }

  /// Decodes the textual content to owned bytes, inflating it first if
  /// this is a `zTXt` or compressed `iTXt` entry.
  #[cfg(feature = "alloc")]
  pub fn decode_text(&self) -> Result<alloc::vec::Vec<u8>, PngError> {
    use alloc::vec::Vec;
    match *self {
      Self::Text { text, .. } => Ok(Vec::from(text)),
      Self::CompressedText { compressed_text, .. } => {
        crate::inflate::inflate_all(compressed_text, crate::inflate::Format::Zlib)
      }
      Self::International { compressed: false, text_or_compressed, .. } => {
        Ok(Vec::from(text_or_compressed))
      }
      Self::International { compressed: true, text_or_compressed, .. } => {
        crate::inflate::inflate_all(text_or_compressed, crate::inflate::Format::Zlib)
      }
    }
  }
}
