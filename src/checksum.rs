//! The two stream-integrity hashes PNG relies on: CRC-32 over each chunk's
//! `type ‖ data`, and zlib's Adler-32 over the inflated byte stream.

/// Reflected CRC-32 table, polynomial `0xEDB88320`, built at compile time.
const CRC_TABLE: [u32; 256] = {
  let mut table = [0u32; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if c & 1 != 0 { 0xedb88320 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    table[n] = c;
    n += 1;
  }
  table
};

/// Incremental CRC-32 accumulator, reflected form (the one PNG chunk
/// trailers use).
#[derive(Debug, Clone, Copy)]
pub struct Crc32(u32);

impl Crc32 {
  #[inline]
  pub const fn new() -> Self {
    Self(u32::MAX)
  }

  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    let mut c = self.0;
    for &b in bytes {
      c = CRC_TABLE[((c ^ b as u32) & 0xff) as usize] ^ (c >> 8);
    }
    self.0 = c;
  }

  #[inline]
  pub const fn finish(self) -> u32 {
    self.0 ^ u32::MAX
  }
}

impl Default for Crc32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

/// One-shot helper: the CRC-32 of `ty ‖ data`, as stored in a chunk trailer.
#[inline]
pub fn crc32_of_chunk(ty: [u8; 4], data: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(&ty);
  crc.update(data);
  crc.finish()
}

const ADLER_MOD: u32 = 65521;
/// Largest run of bytes that can accumulate into the `u32` halves of the
/// Adler-32 state before a modular reduction becomes mandatory to avoid
/// overflow. Deferring the `% ADLER_MOD` this long is the standard zlib
/// trick for throughput.
const ADLER_MAX_RUN: usize = 5552;

/// Incremental Adler-32 accumulator.
#[derive(Debug, Clone, Copy)]
pub struct Adler32 {
  single: u32,
  double: u32,
}

impl Adler32 {
  #[inline]
  pub const fn new() -> Self {
    Self { single: 1, double: 0 }
  }

  pub fn update(&mut self, mut bytes: &[u8]) {
    let (mut single, mut double) = (self.single, self.double);
    while !bytes.is_empty() {
      let take = bytes.len().min(ADLER_MAX_RUN);
      let (chunk, rest) = bytes.split_at(take);
      for &b in chunk {
        single += b as u32;
        double += single;
      }
      single %= ADLER_MOD;
      double %= ADLER_MOD;
      bytes = rest;
    }
    self.single = single;
    self.double = double;
  }

  #[inline]
  pub const fn finish(self) -> u32 {
    (self.double << 16) | self.single
  }
}

impl Default for Adler32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn crc32_of_empty_ihdr_type() {
    // crc32("IHDR") per any standard CRC-32/zlib implementation.
    let crc = crc32_of_chunk(*b"IHDR", &[]);
    assert_eq!(crc, 0xa8a1_ae0a);
  }

  #[test]
  fn adler32_of_empty_is_one() {
    assert_eq!(Adler32::new().finish(), 1);
  }

  #[test]
  fn adler32_matches_known_vector() {
    // adler32("Wikipedia") == 0x11E60398, a widely cited test vector.
    let mut a = Adler32::new();
    a.update(b"Wikipedia");
    assert_eq!(a.finish(), 0x11E6_0398);
  }

  #[test]
  fn adler32_handles_runs_longer_than_reduction_window() {
    let data = alloc::vec![7u8; ADLER_MAX_RUN * 3 + 17];
    let mut whole = Adler32::new();
    whole.update(&data);
    let mut piecewise = Adler32::new();
    for chunk in data.chunks(997) {
      piecewise.update(chunk);
    }
    assert_eq!(whole.finish(), piecewise.finish());
  }
}
