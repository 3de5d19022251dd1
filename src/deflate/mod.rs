//! The DEFLATE engine (RFC 1951) and the zlib wrapper (RFC 1950) around it.
//!
//! * [`inflate`] turns a raw DEFLATE stream back into bytes.
//! * [`deflate`] compresses bytes using LZ77 matching over a 32 KiB window
//!   followed by Huffman coding, picking stored, fixed, or dynamic blocks by
//!   whichever costs the fewest bits.
//! * [`zlib`] adds the two byte header and Adler-32 trailer that PNG's image
//!   data uses.

use crate::{error::*, options::CompressionLevel};
use alloc::vec::Vec;

mod adler32;
pub use adler32::*;

mod bit_sink;
pub(crate) use bit_sink::*;

mod bit_source;
pub(crate) use bit_source::*;

mod compress;

mod huff_symbol;
pub(crate) use huff_symbol::*;

mod huffman;
pub(crate) use huffman::*;

mod inflate;

mod lz77;

mod tree_entry;
pub(crate) use tree_entry::*;

pub mod zlib;

/// How far back a back reference can reach.
pub const WINDOW_SIZE: usize = 32 * 1024;

/// Shortest match worth a back reference.
pub const MIN_MATCH: usize = 3;

/// Longest match a single back reference can carry.
pub const MAX_MATCH: usize = 258;

/// Literal/length codes 0 through 285, 286 and 287 only exist in the fixed
/// tree.
pub(crate) const LIT_LEN_COUNT: usize = 288;
pub(crate) const DIST_COUNT: usize = 32;
pub(crate) const CODE_LENGTH_COUNT: usize = 19;

pub(crate) const END_OF_BLOCK: u16 = 256;

/// Base match length for length codes 257..=285.
pub(crate) const LENGTH_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
  131, 163, 195, 227, 258,
];
pub(crate) const LENGTH_EXTRA: [u8; 29] =
  [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

/// Base distance for distance codes 0..=29.
pub(crate) const DIST_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
  2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
pub(crate) const DIST_EXTRA: [u8; 30] =
  [0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13];

/// The order that a dynamic block lists the code length code lengths.
pub(crate) const CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Code lengths of the fixed literal/length tree (RFC 1951, 3.2.6).
pub(crate) const FIXED_LIT_LEN_LENGTHS: [u8; LIT_LEN_COUNT] = {
  let mut out = [0_u8; LIT_LEN_COUNT];
  let mut i = 0;
  while i < LIT_LEN_COUNT {
    out[i] = match i {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
    i += 1;
  }
  out
};

/// All 32 fixed distance codes are 5 bits.
pub(crate) const FIXED_DIST_LENGTHS: [u8; DIST_COUNT] = [5; DIST_COUNT];

/// Decodes a complete raw DEFLATE stream.
///
/// Anything after the final block is ignored.
///
/// ## Failure
/// * [`CorruptStreamError`] for any malformed block, tree, symbol, or back
///   reference, or when the stream ends early.
#[inline]
pub fn inflate(compressed: &[u8]) -> PngResult<Vec<u8>> {
  inflate::inflate_with_limit(compressed, usize::MAX).map(|(out, _)| out)
}

/// Compresses bytes into a raw DEFLATE stream.
///
/// This never fails on any input: the stored block type is always available.
/// Only the output size depends on the `level`.
#[inline]
#[must_use]
pub fn deflate(raw: &[u8], level: CompressionLevel) -> Vec<u8> {
  compress::deflate_to_vec(raw, level)
}

/// Length symbol (257..=285) and extra bit value for a match length.
#[inline]
pub(crate) fn length_to_symbol(len: u16) -> (u16, u16) {
  debug_assert!((MIN_MATCH as u16..=MAX_MATCH as u16).contains(&len));
  let i = LENGTH_BASE.partition_point(|&base| base <= len) - 1;
  (257 + i as u16, len - LENGTH_BASE[i])
}

/// Distance symbol (0..=29) and extra bit value for a match distance.
#[inline]
pub(crate) fn dist_to_symbol(dist: u16) -> (u16, u16) {
  debug_assert!(dist >= 1);
  let i = DIST_BASE.partition_point(|&base| base <= dist) - 1;
  (i as u16, dist - DIST_BASE[i])
}

#[test]
fn test_symbol_lookups() {
  assert_eq!(length_to_symbol(3), (257, 0));
  assert_eq!(length_to_symbol(10), (264, 0));
  assert_eq!(length_to_symbol(12), (265, 1));
  assert_eq!(length_to_symbol(257), (284, 30));
  // 258 has its own code even though 284 could also reach it.
  assert_eq!(length_to_symbol(258), (285, 0));
  assert_eq!(dist_to_symbol(1), (0, 0));
  assert_eq!(dist_to_symbol(4), (3, 0));
  assert_eq!(dist_to_symbol(6), (4, 1));
  assert_eq!(dist_to_symbol(32768), (29, 8191));
}
