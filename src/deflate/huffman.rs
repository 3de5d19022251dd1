//! Huffman tables: decoding canonical codes, and picking code lengths for
//! the encoder.

use super::*;

/// A canonical Huffman decoder over an alphabet of up to `N` symbols.
///
/// Only the number of codes of each length and the symbols sorted by code
/// are kept; decoding walks the lengths one bit at a time.
#[derive(Clone)]
pub(crate) struct HuffmanDecoder<const N: usize> {
  counts: [u16; 16],
  symbols: [u16; N],
}
impl<const N: usize> core::fmt::Debug for HuffmanDecoder<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("HuffmanDecoder").field("counts", &self.counts).finish()
  }
}

impl<const N: usize> HuffmanDecoder<N> {
  /// Builds the tables without checking that the lengths form a usable
  /// code. Lengths must all be 15 or less and there can be at most `N`.
  pub(crate) const fn from_lengths_unchecked(lengths: &[u8]) -> Self {
    let mut counts = [0_u16; 16];
    let mut i = 0;
    while i < lengths.len() {
      counts[lengths[i] as usize] += 1;
      i += 1;
    }
    counts[0] = 0;

    let mut offsets = [0_u16; 16];
    let mut len = 1;
    while len < 15 {
      offsets[len + 1] = offsets[len] + counts[len];
      len += 1;
    }

    let mut symbols = [0_u16; N];
    let mut sym = 0;
    while sym < lengths.len() {
      let l = lengths[sym] as usize;
      if l != 0 {
        symbols[offsets[l] as usize] = sym as u16;
        offsets[l] += 1;
      }
      sym += 1;
    }
    Self { counts, symbols }
  }

  /// Builds a decoder, rejecting over-subscribed and incomplete codes.
  ///
  /// With `allow_single_code`, a code that is incomplete only because it has
  /// a single 1-bit code (or no codes at all) is accepted, which the literal
  /// and distance trees of a dynamic block are permitted to do.
  pub(crate) fn from_lengths(lengths: &[u8], allow_single_code: bool) -> PngResult<Self> {
    debug_assert!(lengths.len() <= N);
    let mut counts = [0_u16; 16];
    for &l in lengths {
      if l > 15 {
        return Err(CorruptStreamError::OversubscribedTree.into());
      }
      counts[usize::from(l)] += 1;
    }
    let mut left: i32 = 1;
    let mut max_len = 0;
    for (len, &count) in counts.iter().enumerate().skip(1) {
      left <<= 1;
      left -= i32::from(count);
      if left < 0 {
        return Err(CorruptStreamError::OversubscribedTree.into());
      }
      if count != 0 {
        max_len = len;
      }
    }
    if left > 0 && !(allow_single_code && max_len <= 1) {
      return Err(CorruptStreamError::IncompleteTree.into());
    }
    Ok(Self::from_lengths_unchecked(lengths))
  }

  /// Reads one symbol.
  pub(crate) fn decode(&self, bits: &mut BitSource<'_>) -> PngResult<u16> {
    // `code` is the bits read so far, `first` the first code of the current
    // length, and `index` where that length's symbols start.
    let mut code: i32 = 0;
    let mut first: i32 = 0;
    let mut index: i32 = 0;
    for len in 1..16 {
      code |= bits.next_one_bit()? as i32;
      let count = i32::from(self.counts[len]);
      if code - count < first {
        return Ok(self.symbols[(index + (code - first)) as usize]);
      }
      index += count;
      first += count;
      first <<= 1;
      code <<= 1;
    }
    Err(CorruptStreamError::InvalidSymbol.into())
  }
}

/// The fixed literal/length decoder, built at compile time.
pub(crate) static FIXED_LIT_LEN_DECODER: HuffmanDecoder<LIT_LEN_COUNT> =
  HuffmanDecoder::from_lengths_unchecked(&FIXED_LIT_LEN_LENGTHS);

/// The fixed distance decoder, built at compile time.
pub(crate) static FIXED_DIST_DECODER: HuffmanDecoder<DIST_COUNT> =
  HuffmanDecoder::from_lengths_unchecked(&FIXED_DIST_LENGTHS);

/// Picks code lengths, none longer than `max_bits`, for symbols with the
/// given frequencies.
///
/// Symbols with frequency 0 get length 0. If fewer than two symbols are used
/// the first unused ones are given a code anyway, so that every tree is
/// complete and any decoder will accept it.
pub(crate) fn build_code_lengths(freqs: &[u32], max_bits: u8) -> Vec<u8> {
  debug_assert!(freqs.len() >= 2);
  debug_assert!((1_usize << max_bits) >= freqs.len());
  let max_bits = usize::from(max_bits);

  // (frequency, symbol), least frequent first
  let mut leaves: Vec<(u32, u16)> =
    freqs.iter().enumerate().filter(|(_, &f)| f > 0).map(|(s, &f)| (f, s as u16)).collect();
  let mut filler = 0_u16;
  while leaves.len() < 2 {
    if freqs[usize::from(filler)] == 0 {
      leaves.push((1, filler));
    }
    filler += 1;
  }
  leaves.sort_unstable();
  let n = leaves.len();

  // Two queue Huffman: leaves are already sorted, and internal nodes come out
  // in non-decreasing weight order, so the two smallest are always at the
  // front of one of the queues. Node `k` for k >= n is internal.
  let mut weight: Vec<u64> = Vec::with_capacity(2 * n - 1);
  weight.extend(leaves.iter().map(|&(f, _)| u64::from(f)));
  let mut parent = alloc::vec![0_usize; 2 * n - 1];
  let mut next_leaf = 0;
  let mut next_internal = n;
  for k in n..(2 * n - 1) {
    let mut take_smallest = || {
      let use_leaf =
        next_leaf < n && (next_internal >= k || weight[next_leaf] <= weight[next_internal]);
      if use_leaf {
        next_leaf += 1;
        next_leaf - 1
      } else {
        next_internal += 1;
        next_internal - 1
      }
    };
    let a = take_smallest();
    let b = take_smallest();
    weight.push(weight[a] + weight[b]);
    parent[a] = k;
    parent[b] = k;
  }

  // A parent always has a bigger index than its children, so going from the
  // root downward fills in every depth before it's read.
  let mut depth = alloc::vec![0_usize; 2 * n - 1];
  for k in (0..(2 * n - 2)).rev() {
    depth[k] = depth[parent[k]] + 1;
  }

  // Count codes per length, squashing anything too long into `max_bits`.
  let mut num_codes = [0_u32; 16];
  for &d in &depth[..n] {
    num_codes[d.min(max_bits)] += 1;
  }

  // Squashing over-subscribes the code; move codes down a level until the
  // Kraft sum is exactly one again.
  let mut total: u32 = (1..=max_bits).map(|i| num_codes[i] << (max_bits - i)).sum();
  while total > (1 << max_bits) {
    num_codes[max_bits] -= 1;
    for i in (1..max_bits).rev() {
      if num_codes[i] != 0 {
        num_codes[i] -= 1;
        num_codes[i + 1] += 2;
        break;
      }
    }
    total -= 1;
  }

  // The least frequent leaves take the longest codes.
  let mut lengths = alloc::vec![0_u8; freqs.len()];
  let mut leaf_iter = leaves.iter();
  for len in (1..=max_bits).rev() {
    for _ in 0..num_codes[len] {
      if let Some(&(_, sym)) = leaf_iter.next() {
        lengths[usize::from(sym)] = len as u8;
      }
    }
  }
  lengths
}

#[cfg(test)]
fn kraft_sum(lengths: &[u8]) -> f64 {
  lengths.iter().filter(|&&l| l > 0).map(|&l| 1.0 / f64::from(1_u32 << l)).sum()
}

#[test]
fn test_build_code_lengths_simple() {
  let lengths = build_code_lengths(&[10, 1, 1, 0, 5], 15);
  assert_eq!(lengths, alloc::vec![1, 3, 3, 0, 2]);
}

#[test]
fn test_build_code_lengths_forces_two_codes() {
  let lengths = build_code_lengths(&[0, 0, 7, 0], 7);
  assert_eq!(lengths.iter().filter(|&&l| l > 0).count(), 2);
  assert_eq!(kraft_sum(&lengths), 1.0);
  assert!(lengths[2] > 0);
}

#[test]
fn test_build_code_lengths_respects_the_limit() {
  // Fibonacci frequencies give the deepest possible Huffman tree.
  let mut freqs = alloc::vec![0_u32; 30];
  let (mut a, mut b) = (1_u32, 1_u32);
  for f in freqs.iter_mut() {
    *f = a;
    let c = a + b;
    a = b;
    b = c;
  }
  let lengths = build_code_lengths(&freqs, 7);
  assert!(lengths.iter().all(|&l| (1..=7).contains(&l)));
  assert_eq!(kraft_sum(&lengths), 1.0);
  HuffmanDecoder::<30>::from_lengths(&lengths, false).unwrap();
}

#[test]
fn test_decoder_rejects_bad_trees() {
  assert_eq!(
    HuffmanDecoder::<4>::from_lengths(&[1, 1, 1, 0], false).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::OversubscribedTree)
  );
  assert_eq!(
    HuffmanDecoder::<4>::from_lengths(&[1, 2, 0, 0], false).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::IncompleteTree)
  );
  assert!(HuffmanDecoder::<4>::from_lengths(&[0, 1, 0, 0], true).is_ok());
  assert!(HuffmanDecoder::<4>::from_lengths(&[0, 1, 0, 0], false).is_err());
}

#[test]
fn test_fixed_decoder_reads_fixed_codes() {
  // Literal 0 is the 8 bit code 00110000, end of block is 7 zero bits.
  let mut sink = BitSink::default();
  let codes = TreeEntry::codes_for_writing(&FIXED_LIT_LEN_LENGTHS).unwrap();
  sink.put_code(codes[0]);
  sink.put_code(codes[200]);
  sink.put_code(codes[256]);
  sink.put_code(codes[285]);
  let bytes = sink.finish();
  let mut bs = BitSource::new(&bytes);
  assert_eq!(FIXED_LIT_LEN_DECODER.decode(&mut bs).unwrap(), 0);
  assert_eq!(FIXED_LIT_LEN_DECODER.decode(&mut bs).unwrap(), 200);
  assert_eq!(FIXED_LIT_LEN_DECODER.decode(&mut bs).unwrap(), 256);
  assert_eq!(FIXED_LIT_LEN_DECODER.decode(&mut bs).unwrap(), 285);
}
