//! The streaming DEFLATE/zlib inflator: `push`/`pull` over partial byte
//! arrivals, a 32 KiB sliding window, and Adler-32 verification.

mod bits;
mod huffman;
mod tables;

use crate::checksum::Adler32;
use crate::error::{InflationError, PngError};
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use bits::BitAccumulator;
use huffman::HuffmanTable;

const WINDOW_SIZE: usize = 32 * 1024;

/// Whether the `IDAT` stream is wrapped in a standard zlib header/Adler-32
/// trailer, or is the Apple iOS `CgBI` variant's bare DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Zlib,
  Ios,
}

/// What [`Inflator::push`] accomplished with the bytes it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
  /// The inflator consumed what it could; more input is needed to make
  /// further progress.
  NeedMore,
  /// The zlib (or iOS) stream has fully terminated; all pushed bytes past
  /// the trailer, if any, were not consumed. Further `push` calls are an
  /// error.
  Complete,
}

#[derive(Debug)]
enum PendingSymbol {
  None,
  LenExtra { base: u16, extra: u8 },
  NeedDistSymbol { length: u16 },
  NeedDistExtra { length: u16, dist_symbol: u16 },
}

#[derive(Debug)]
enum ClPending {
  None,
  Extra { code: u8 },
}

#[derive(Debug)]
enum DynPhase {
  Counts,
  ClLengths { hlit: usize, hdist: usize, hclen: usize, cl_raw: [u8; 19], next: usize },
  MainLengths {
    hlit: usize,
    hdist: usize,
    cl_table: HuffmanTable,
    lengths: Vec<u8>,
    prev_len: u8,
    pending_repeat: Option<(u8, u32)>,
    pending_extra: ClPending,
  },
}

enum Stage {
  ZlibHeader,
  BlockStart,
  StoredHeader { collected: Vec<u8> },
  Stored { remaining: u32 },
  DynHeader(DynPhase),
  Symbols { lit: HuffmanTable, dist: HuffmanTable, pending: PendingSymbol },
  Trailer { collected: Vec<u8> },
  Done,
}

/// A streaming DEFLATE/zlib inflator.
///
/// Feed compressed bytes with [`Self::push`] as they arrive; pull decoded
/// bytes out with [`Self::pull`]/[`Self::pull_all`]. Neither call blocks:
/// `push` returns [`PushOutcome::NeedMore`] rather than waiting for a full
/// block's worth of input, and `pull` returns `None` rather than waiting
/// for more decoded bytes to become available.
pub struct Inflator {
  format: Format,
  bits: BitAccumulator,
  stage: Stage,
  bfinal_seen: bool,
  window: alloc::boxed::Box<[u8; WINDOW_SIZE]>,
  window_pos: usize,
  total_emitted: u64,
  output: VecDeque<u8>,
  adler: Adler32,
}

impl Inflator {
  pub fn new(format: Format) -> Self {
    let stage = match format {
      Format::Zlib => Stage::ZlibHeader,
      Format::Ios => Stage::BlockStart,
    };
    Self {
      format,
      bits: BitAccumulator::new(),
      stage,
      bfinal_seen: false,
      window: alloc::boxed::Box::new([0u8; WINDOW_SIZE]),
      window_pos: 0,
      total_emitted: 0,
      output: VecDeque::new(),
      adler: Adler32::new(),
    }
  }

  fn emit_byte(&mut self, byte: u8) {
    self.window[self.window_pos] = byte;
    self.window_pos = (self.window_pos + 1) % WINDOW_SIZE;
    self.total_emitted += 1;
    self.output.push_back(byte);
    self.adler.update(&[byte]);
  }

  fn copy_match(&mut self, length: usize, distance: usize) -> Result<(), InflationError> {
    if distance == 0 || distance as u64 > self.total_emitted {
      return Err(InflationError::BackRefToBeforeWindowStart);
    }
    if distance > WINDOW_SIZE {
      return Err(InflationError::BackRefPastOutputEnd);
    }
    for _ in 0..length {
      let src = (self.window_pos + WINDOW_SIZE - distance) % WINDOW_SIZE;
      let byte = self.window[src];
      self.emit_byte(byte);
    }
    Ok(())
  }

  /// Feeds `bytes` into the inflator, advancing as far as the currently
  /// buffered bits allow.
  pub fn push(&mut self, bytes: &[u8]) -> Result<PushOutcome, PngError> {
    if matches!(self.stage, Stage::Done) {
      return Err(crate::error::DecodingError::ExtraneousImageDataCompressedData.into());
    }
    self.bits.push(bytes);
    loop {
      match self.step()? {
        StepOutcome::Progress => continue,
        StepOutcome::Suspend => return Ok(PushOutcome::NeedMore),
        StepOutcome::StreamComplete => {
          self.stage = Stage::Done;
          return Ok(PushOutcome::Complete);
        }
      }
    }
  }

  /// Returns up to `n` contiguous decoded bytes, or `None` if fewer than
  /// `n` are currently buffered.
  pub fn pull(&mut self, n: usize) -> Option<Vec<u8>> {
    if self.output.len() < n {
      return None;
    }
    Some(self.output.drain(..n).collect())
  }

  /// Drains every currently buffered decoded byte.
  pub fn pull_all(&mut self) -> Vec<u8> {
    self.output.drain(..).collect()
  }

  #[inline]
  pub fn pending_output_len(&self) -> usize {
    self.output.len()
  }

  #[inline]
  pub fn is_done(&self) -> bool {
    matches!(self.stage, Stage::Done)
  }

  fn step(&mut self) -> Result<StepOutcome, PngError> {
    match &mut self.stage {
      Stage::Done => Ok(StepOutcome::StreamComplete),

      Stage::ZlibHeader => {
        if !self.bits.ensure_bits(16) {
          return Ok(StepOutcome::Suspend);
        }
        let cmf = self.bits.take(8).unwrap() as u8;
        let flg = self.bits.take(8).unwrap() as u8;
        if cmf & 0x0f != 8 {
          return Err(InflationError::BadZlibCompressionMethod.into());
        }
        if (cmf >> 4) > 7 {
          return Err(InflationError::BadZlibWindowSize.into());
        }
        let header_value = ((cmf as u16) << 8) | flg as u16;
        if header_value % 31 != 0 {
          return Err(InflationError::BadZlibFlagCheck.into());
        }
        if flg & 0x20 != 0 {
          return Err(InflationError::BadZlibFlagDictionary.into());
        }
        self.stage = Stage::BlockStart;
        Ok(StepOutcome::Progress)
      }

      Stage::BlockStart => {
        if self.bfinal_seen {
          // The trailer is read as whole bytes; any bits left over in the
          // partially-consumed final byte of compressed data are padding.
          self.bits.align_to_byte();
          self.stage = Stage::Trailer { collected: Vec::new() };
          return Ok(StepOutcome::Progress);
        }
        if !self.bits.ensure_bits(3) {
          return Ok(StepOutcome::Suspend);
        }
        let bfinal = self.bits.take(1).unwrap() != 0;
        let btype = self.bits.take(2).unwrap();
        if bfinal {
          self.bfinal_seen = true;
        }
        self.stage = match btype {
          0 => {
            self.bits.align_to_byte();
            Stage::StoredHeader { collected: Vec::new() }
          }
          1 => {
            let lit = HuffmanTable::build(&tables::fixed_lit_len_lengths())?;
            let dist = HuffmanTable::build(&tables::fixed_dist_lengths())?;
            Stage::Symbols { lit, dist, pending: PendingSymbol::None }
          }
          2 => Stage::DynHeader(DynPhase::Counts),
          _ => return Err(InflationError::IllegalBlockType.into()),
        };
        Ok(StepOutcome::Progress)
      }

      Stage::StoredHeader { collected } => {
        let need = 4 - collected.len();
        let got = self.bits.take_available_bytes(need, collected);
        if got < need {
          return Ok(StepOutcome::Suspend);
        }
        let len = u16::from_le_bytes([collected[0], collected[1]]);
        let nlen = u16::from_le_bytes([collected[2], collected[3]]);
        if len != !nlen {
          return Err(InflationError::StoredLenAndNLenDidNotMatch.into());
        }
        self.stage = Stage::Stored { remaining: len as u32 };
        Ok(StepOutcome::Progress)
      }

      Stage::Stored { remaining } => {
        if *remaining == 0 {
          self.stage = Stage::BlockStart;
          return Ok(StepOutcome::Progress);
        }
        let mut buf = Vec::new();
        let got = self.bits.take_available_bytes(*remaining as usize, &mut buf);
        for byte in buf {
          self.emit_byte(byte);
        }
        *remaining -= got as u32;
        if *remaining > 0 {
          Ok(StepOutcome::Suspend)
        } else {
          Ok(StepOutcome::Progress)
        }
      }

      Stage::DynHeader(phase) => self.step_dyn_header(phase),

      Stage::Symbols { .. } => self.step_symbols(),

      Stage::Trailer { collected } => {
        if self.format == Format::Ios {
          return Ok(StepOutcome::StreamComplete);
        }
        let need = 4 - collected.len();
        let got = self.bits.take_available_bytes(need, collected);
        if got < need {
          return Ok(StepOutcome::Suspend);
        }
        let declared = u32::from_be_bytes([collected[0], collected[1], collected[2], collected[3]]);
        if declared != self.adler.finish() {
          return Err(InflationError::Adler32Mismatch.into());
        }
        Ok(StepOutcome::StreamComplete)
      }
    }
  }

  fn step_dyn_header(&mut self, phase: &mut DynPhase) -> Result<StepOutcome, PngError> {
    match phase {
      DynPhase::Counts => {
        if !self.bits.ensure_bits(14) {
          return Ok(StepOutcome::Suspend);
        }
        let hlit = self.bits.take(5).unwrap() as usize + 257;
        let hdist = self.bits.take(5).unwrap() as usize + 1;
        let hclen = self.bits.take(4).unwrap() as usize + 4;
        *phase = DynPhase::ClLengths { hlit, hdist, hclen, cl_raw: [0; 19], next: 0 };
        Ok(StepOutcome::Progress)
      }
      DynPhase::ClLengths { hlit, hdist, hclen, cl_raw, next } => {
        while *next < *hclen {
          if !self.bits.ensure_bits(3) {
            return Ok(StepOutcome::Suspend);
          }
          cl_raw[tables::CODE_LENGTH_ORDER[*next]] = self.bits.take(3).unwrap() as u8;
          *next += 1;
        }
        let cl_table = HuffmanTable::build(cl_raw)?;
        self.stage = Stage::DynHeader(DynPhase::MainLengths {
          hlit: *hlit,
          hdist: *hdist,
          cl_table,
          lengths: Vec::with_capacity(*hlit + *hdist),
          prev_len: 0,
          pending_repeat: None,
          pending_extra: ClPending::None,
        });
        Ok(StepOutcome::Progress)
      }
      DynPhase::MainLengths { .. } => unreachable!("handled by step_symbols' sibling below"),
    }
  }

  fn step_symbols(&mut self) -> Result<StepOutcome, PngError> {
    // DynHeader::MainLengths and Symbols share the "decode one alphabet
    // symbol, possibly suspend on extra bits" shape; MainLengths is still
    // inside Stage::DynHeader so it's handled here via a re-match.
    if let Stage::DynHeader(DynPhase::MainLengths {
      hlit,
      hdist,
      cl_table,
      lengths,
      prev_len,
      pending_repeat,
      pending_extra,
    }) = &mut self.stage
    {
      if let Some((fill, remaining)) = pending_repeat {
        while *remaining > 0 {
          lengths.push(*fill);
          *remaining -= 1;
        }
        *pending_repeat = None;
      }
      if lengths.len() >= *hlit + *hdist {
        let (lit_lengths, dist_lengths) = lengths.split_at(*hlit);
        let lit = HuffmanTable::build(lit_lengths)?;
        let dist = HuffmanTable::build(dist_lengths)?;
        self.stage = Stage::Symbols { lit, dist, pending: PendingSymbol::None };
        return Ok(StepOutcome::Progress);
      }
      if let ClPending::Extra { code } = *pending_extra {
        let extra_bits: u32 = match code {
          16 => 2,
          17 => 3,
          18 => 7,
          _ => unreachable!(),
        };
        let Some(extra) = self.bits.take(extra_bits) else {
          return Ok(StepOutcome::Suspend);
        };
        let (fill, count) = match code {
          16 => (*prev_len, 3 + extra),
          17 => (0, 3 + extra),
          18 => (0, 11 + extra),
          _ => unreachable!(),
        };
        *pending_extra = ClPending::None;
        *pending_repeat = Some((fill, count));
        return Ok(StepOutcome::Progress);
      }
      if !self.bits.ensure_bits(cl_table.max_bits.max(1)) {
        return Ok(StepOutcome::Suspend);
      }
      let bits = self.bits.peek(cl_table.max_bits);
      let (symbol, used) = cl_table.decode(bits)?;
      self.bits.consume(used as u32);
      match symbol {
        0..=15 => {
          lengths.push(symbol as u8);
          *prev_len = symbol as u8;
        }
        16 | 17 | 18 => {
          *pending_extra = ClPending::Extra { code: symbol as u8 };
        }
        _ => return Err(InflationError::BadDynamicHuffmanTreeData.into()),
      }
      return Ok(StepOutcome::Progress);
    }

    let Stage::Symbols { lit, dist, pending } = &mut self.stage else {
      unreachable!("step_symbols only called for Symbols/MainLengths stages");
    };
    match pending {
      PendingSymbol::None => {
        if !self.bits.ensure_bits(lit.max_bits.max(1)) {
          return Ok(StepOutcome::Suspend);
        }
        let bits = self.bits.peek(lit.max_bits);
        let (symbol, used) = lit.decode(bits)?;
        self.bits.consume(used as u32);
        if symbol < 256 {
          self.emit_byte(symbol as u8);
        } else if symbol == 256 {
          self.stage = Stage::BlockStart;
        } else {
          let (base, extra) = tables::LENGTH_BASE_EXTRA[(symbol - 257) as usize];
          if extra == 0 {
            *pending = PendingSymbol::NeedDistSymbol { length: base };
          } else {
            *pending = PendingSymbol::LenExtra { base, extra };
          }
        }
        Ok(StepOutcome::Progress)
      }
      PendingSymbol::LenExtra { base, extra } => {
        let Some(e) = self.bits.take(*extra as u32) else {
          return Ok(StepOutcome::Suspend);
        };
        let length = *base + e as u16;
        *pending = PendingSymbol::NeedDistSymbol { length };
        Ok(StepOutcome::Progress)
      }
      PendingSymbol::NeedDistSymbol { length } => {
        if !self.bits.ensure_bits(dist.max_bits.max(1)) {
          return Ok(StepOutcome::Suspend);
        }
        let bits = self.bits.peek(dist.max_bits);
        let (dist_symbol, used) = dist
          .decode(bits)
          .map_err(|_| PngError::from(InflationError::CouldNotFindDistSymbol))?;
        self.bits.consume(used as u32);
        let length = *length;
        if (dist_symbol as usize) >= tables::DIST_BASE_EXTRA.len() {
          return Err(InflationError::CouldNotFindDistSymbol.into());
        }
        let (dbase, dextra) = tables::DIST_BASE_EXTRA[dist_symbol as usize];
        if dextra == 0 {
          self.copy_match(length as usize, dbase as usize)?;
          *pending = PendingSymbol::None;
        } else {
          *pending = PendingSymbol::NeedDistExtra { length, dist_symbol };
        }
        Ok(StepOutcome::Progress)
      }
      PendingSymbol::NeedDistExtra { length, dist_symbol } => {
        let (dbase, dextra) = tables::DIST_BASE_EXTRA[*dist_symbol as usize];
        let Some(e) = self.bits.take(dextra as u32) else {
          return Ok(StepOutcome::Suspend);
        };
        let distance = dbase as u32 + e;
        self.copy_match(*length as usize, distance as usize)?;
        *pending = PendingSymbol::None;
        Ok(StepOutcome::Progress)
      }
    }
  }
}

enum StepOutcome {
  Progress,
  Suspend,
  StreamComplete,
}

/// Inflates an entire buffer in one call: used for `iCCP` profiles and
/// compressed text chunks, where the whole compressed payload is already
/// available rather than arriving in a stream.
#[cfg(feature = "alloc")]
pub fn inflate_all(compressed: &[u8], format: Format) -> Result<Vec<u8>, PngError> {
  let mut inflator = Inflator::new(format);
  match inflator.push(compressed)? {
    PushOutcome::Complete => Ok(inflator.pull_all()),
    PushOutcome::NeedMore => Err(InflationError::UnexpectedEndOfInput.into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  extern crate std;

  // A minimal, dependency-free "store-only" zlib stream builder, used so
  // tests don't need a compression crate: one uncompressed DEFLATE block
  // wraps `data` exactly, which is enough to exercise the zlib header,
  // stored-block path, and Adler-32 trailer end to end.
  fn zlib_stored(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(0x78);
    out.push(0x01); // CMF/FLG, a valid zlib header with no dictionary
    let mut remaining = data;
    loop {
      let take = remaining.len().min(u16::MAX as usize);
      let (chunk, rest) = remaining.split_at(take);
      let bfinal = rest.is_empty();
      out.push(if bfinal { 1 } else { 0 }); // BFINAL=bfinal, BTYPE=00, byte-aligned already
      out.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
      out.extend_from_slice(&(!(chunk.len() as u16)).to_le_bytes());
      out.extend_from_slice(chunk);
      remaining = rest;
      if bfinal {
        break;
      }
    }
    let mut adler = Adler32::new();
    adler.update(data);
    out.extend_from_slice(&adler.finish().to_be_bytes());
    out
  }

  #[test]
  fn round_trips_a_stored_block() {
    let data = b"Hello, PNG world! This text is long enough to be interesting.";
    let wire = zlib_stored(data);
    let mut inflator = Inflator::new(Format::Zlib);
    let outcome = inflator.push(&wire).unwrap();
    assert_eq!(outcome, PushOutcome::Complete);
    assert_eq!(inflator.pull_all(), data);
  }

  #[test]
  fn feeding_one_byte_at_a_time_still_completes() {
    let data = b"abcdefgh";
    let wire = zlib_stored(data);
    let mut inflator = Inflator::new(Format::Zlib);
    let mut done = false;
    for byte in &wire {
      match inflator.push(core::slice::from_ref(byte)).unwrap() {
        PushOutcome::Complete => {
          done = true;
          break;
        }
        PushOutcome::NeedMore => continue,
      }
    }
    assert!(done);
    assert_eq!(inflator.pull_all(), data);
  }

  #[test]
  fn ios_format_has_no_header_or_trailer() {
    // A bare stored DEFLATE block, no zlib wrapper, no Adler-32 trailer.
    let data = b"raw deflate, no wrapper";
    let mut wire = Vec::new();
    wire.push(1); // BFINAL=1, BTYPE=00
    wire.extend_from_slice(&(data.len() as u16).to_le_bytes());
    wire.extend_from_slice(&(!(data.len() as u16)).to_le_bytes());
    wire.extend_from_slice(data);
    let mut inflator = Inflator::new(Format::Ios);
    assert_eq!(inflator.push(&wire).unwrap(), PushOutcome::Complete);
    assert_eq!(inflator.pull_all(), data);
  }

  #[test]
  fn bad_zlib_header_is_rejected() {
    let mut inflator = Inflator::new(Format::Zlib);
    assert!(inflator.push(&[0x78, 0x00]).is_err()); // flag check byte wrong
  }

  #[test]
  fn pull_returns_none_when_not_enough_buffered() {
    let mut inflator = Inflator::new(Format::Zlib);
    assert_eq!(inflator.pull(1), None);
  }
}
