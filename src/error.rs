//! The crate's single error type.
//!
//! Every fallible operation in `pngcore` returns a [`PngError`]. There is no
//! retrying: once a decoder has produced an error it's done, the caller
//! should discard it and start over with fresh input if it wants to try
//! again.

use crate::util::AsciiArray;

/// Why the chunk lexer rejected the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LexingError {
  TruncatedSignature,
  BadSignatureBytes,
  TruncatedChunkHeader,
  TruncatedChunkBody,
  TruncatedChunkFooter,
  InvalidChunkChecksum,
  InvalidChunkType,
  ChunkTooLarge,
}

/// Why a chunk's payload failed to parse into a structured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ParsingError {
  WrongChunkLength(AsciiArray<4>),
  FieldOutOfRange(AsciiArray<4>),
  IllegalColorTypeBitDepthCombination,
  IllegalCompressionMethod,
  IllegalFilterMethod,
  IllegalInterlaceMethod,
  IllegalDensityUnit,
  IllegalRenderingIntent,
  WidthOrHeightZero,
  ImageTooLarge,
}

/// Why a chunk, though individually well formed, was illegal at the point it
/// appeared in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DecodingError {
  /// `curr` appeared without the `prev` chunk type it requires.
  Required(AsciiArray<4>, AsciiArray<4>),
  /// `curr` is only allowed to appear once.
  Duplicate(AsciiArray<4>),
  /// `curr` appeared somewhere it's never allowed, e.g. after `after`.
  Unexpected(AsciiArray<4>, AsciiArray<4>),
  /// The inflator had not reached `Complete` by the last `IDAT`.
  IncompleteImageDataCompressedDatastream,
  /// An `IDAT` arrived after the zlib stream had already completed.
  ExtraneousImageDataCompressedData,
  /// The inflator produced more bytes than the image's scanlines need.
  ExtraneousImageData,
}

/// Why the DEFLATE/zlib inflator rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum InflationError {
  BadZlibCompressionMethod,
  BadZlibWindowSize,
  BadZlibFlagCheck,
  BadZlibFlagDictionary,
  IllegalBlockType,
  CouldNotFindLitLenSymbol,
  CouldNotFindDistSymbol,
  BackRefToBeforeWindowStart,
  BackRefPastOutputEnd,
  StoredLenAndNLenDidNotMatch,
  BadDynamicHuffmanTreeData,
  Adler32Mismatch,
  UnexpectedEndOfInput,
}

/// Why a `tEXt`/`zTXt`/`iTXt` chunk was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TextError {
  KeywordEmpty,
  KeywordTooLong,
  KeywordHasNullByte,
  MissingNullSeparator,
  IllegalCompressionFlag,
  IllegalCompressionMethod,
  BadLanguageTag,
}

/// The crate's top level error, covering every way a decode can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PngError {
  Lexing(LexingError),
  Parsing(ParsingError),
  Decoding(DecodingError),
  Inflation(InflationError),
  Text(TextError),
}

impl From<LexingError> for PngError {
  #[inline]
  fn from(e: LexingError) -> Self {
    Self::Lexing(e)
  }
}
impl From<ParsingError> for PngError {
  #[inline]
  fn from(e: ParsingError) -> Self {
    Self::Parsing(e)
  }
}
impl From<DecodingError> for PngError {
  #[inline]
  fn from(e: DecodingError) -> Self {
    Self::Decoding(e)
  }
}
impl From<InflationError> for PngError {
  #[inline]
  fn from(e: InflationError) -> Self {
    Self::Inflation(e)
  }
}
impl From<TextError> for PngError {
  #[inline]
  fn from(e: TextError) -> Self {
    Self::Text(e)
  }
}

impl core::fmt::Display for PngError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Debug::fmt(self, f)
  }
}

#[cfg(feature = "std")]
impl std::error::Error for PngError {}

pub(crate) type PngResult<T> = Result<T, PngError>;
