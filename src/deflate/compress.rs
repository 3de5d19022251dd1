use super::{lz77::*, *};
use log::trace;

/// Tokens per block. Smaller blocks adapt their trees to the data more
/// closely, bigger blocks spend less on tree headers.
const MAX_BLOCK_TOKENS: usize = 16 * 1024;

/// Largest payload of a single stored block.
const MAX_STORED_LEN: usize = u16::MAX as usize;

pub(crate) fn deflate_to_vec(raw: &[u8], level: CompressionLevel) -> Vec<u8> {
  let mut sink = BitSink::with_capacity(raw.len() / 2 + 64);
  match SearchParams::for_level(level) {
    None => {
      if raw.is_empty() {
        write_stored(&mut sink, &[], true);
      }
      let mut blocks = raw.chunks(MAX_STORED_LEN).peekable();
      while let Some(block) = blocks.next() {
        write_stored(&mut sink, block, blocks.peek().is_none());
      }
    }
    Some(params) => {
      let mut finder = MatchFinder::new(params);
      let mut tokens = Vec::with_capacity(MAX_BLOCK_TOKENS.min(raw.len() + 1));
      let mut start = 0;
      loop {
        tokens.clear();
        let end = finder.tokenize(raw, start, MAX_BLOCK_TOKENS, &mut tokens);
        let is_final = end == raw.len();
        write_block(&mut sink, &tokens, &raw[start..end], is_final);
        if is_final {
          break;
        }
        start = end;
      }
    }
  }
  sink.finish()
}

/// Symbol frequencies of one block, end of block included.
struct Frequencies {
  lit_len: [u32; 286],
  dist: [u32; 30],
}

impl Frequencies {
  fn count(tokens: &[HuffSymbol]) -> Self {
    let mut lit_len = [0_u32; 286];
    let mut dist = [0_u32; 30];
    for t in tokens {
      match t.get_literal() {
        Some(lit) => lit_len[usize::from(lit)] += 1,
        None => {
          let (len, d) = t.get_back_ref();
          lit_len[usize::from(length_to_symbol(len).0)] += 1;
          dist[usize::from(dist_to_symbol(d).0)] += 1;
        }
      }
    }
    lit_len[usize::from(END_OF_BLOCK)] += 1;
    Self { lit_len, dist }
  }

  /// Bits for all the tokens under the given code lengths.
  fn data_bits(&self, lit_len_lengths: &[u8], dist_lengths: &[u8]) -> u64 {
    let mut bits = 0_u64;
    for (sym, &f) in self.lit_len.iter().enumerate() {
      if f == 0 {
        continue;
      }
      let extra = if sym > 256 { u64::from(LENGTH_EXTRA[sym - 257]) } else { 0 };
      bits += u64::from(f) * (u64::from(lit_len_lengths[sym]) + extra);
    }
    for (sym, &f) in self.dist.iter().enumerate() {
      bits += u64::from(f) * (u64::from(dist_lengths[sym]) + u64::from(DIST_EXTRA[sym]));
    }
    bits
  }
}

/// The header of a dynamic block, ready to write.
struct DynamicHeader {
  lit_len_lengths: Vec<u8>,
  dist_lengths: Vec<u8>,
  hlit: usize,
  hdist: usize,
  hclen: usize,
  code_length_lengths: Vec<u8>,
  /// `(symbol, extra bits value)` in the code length alphabet.
  rle: Vec<(u8, u8)>,
}

impl DynamicHeader {
  fn new(freqs: &Frequencies) -> Self {
    let lit_len_lengths = build_code_lengths(&freqs.lit_len, 15);
    let dist_lengths = build_code_lengths(&freqs.dist, 15);
    let hlit = 257.max(last_used(&lit_len_lengths));
    let hdist = 1.max(last_used(&dist_lengths));

    let mut all = Vec::with_capacity(hlit + hdist);
    all.extend_from_slice(&lit_len_lengths[..hlit]);
    all.extend_from_slice(&dist_lengths[..hdist]);
    let rle = run_length_encode(&all);

    let mut cl_freqs = [0_u32; CODE_LENGTH_COUNT];
    for &(sym, _) in rle.iter() {
      cl_freqs[usize::from(sym)] += 1;
    }
    let code_length_lengths = build_code_lengths(&cl_freqs, 7);
    let hclen = 4.max(
      CODE_LENGTH_ORDER.iter().rposition(|&i| code_length_lengths[i] != 0).map_or(0, |p| p + 1),
    );
    Self { lit_len_lengths, dist_lengths, hlit, hdist, hclen, code_length_lengths, rle }
  }

  fn bits(&self) -> u64 {
    let mut bits = 5 + 5 + 4 + 3 * self.hclen as u64;
    for &(sym, _) in self.rle.iter() {
      bits += u64::from(self.code_length_lengths[usize::from(sym)]) + rle_extra_bits(sym) as u64;
    }
    bits
  }

  fn write(&self, sink: &mut BitSink, code_length_codes: &[TreeEntry]) {
    sink.put_bits((self.hlit - 257) as u32, 5);
    sink.put_bits((self.hdist - 1) as u32, 5);
    sink.put_bits((self.hclen - 4) as u32, 4);
    for &i in CODE_LENGTH_ORDER.iter().take(self.hclen) {
      sink.put_bits(u32::from(self.code_length_lengths[i]), 3);
    }
    for &(sym, extra) in self.rle.iter() {
      sink.put_code(code_length_codes[usize::from(sym)]);
      sink.put_bits(u32::from(extra), rle_extra_bits(sym));
    }
  }
}

/// One past the last non-zero length.
fn last_used(lengths: &[u8]) -> usize {
  lengths.iter().rposition(|&l| l != 0).map_or(0, |p| p + 1)
}

const fn rle_extra_bits(sym: u8) -> u32 {
  match sym {
    16 => 2,
    17 => 3,
    18 => 7,
    _ => 0,
  }
}

/// Encodes a list of code lengths with the repeat codes 16, 17, and 18.
fn run_length_encode(lengths: &[u8]) -> Vec<(u8, u8)> {
  let mut out = Vec::new();
  let mut i = 0;
  while i < lengths.len() {
    let l = lengths[i];
    let run = lengths[i..].iter().take_while(|&&x| x == l).count();
    let mut left = run;
    if l == 0 {
      while left >= 11 {
        let take = left.min(138);
        out.push((18, (take - 11) as u8));
        left -= take;
      }
      if left >= 3 {
        out.push((17, (left - 3) as u8));
        left = 0;
      }
    } else {
      out.push((l, 0));
      left -= 1;
      while left >= 3 {
        let take = left.min(6);
        out.push((16, (take - 3) as u8));
        left -= take;
      }
    }
    for _ in 0..left {
      out.push((l, 0));
    }
    i += run;
  }
  out
}

fn write_stored(sink: &mut BitSink, raw: &[u8], is_final: bool) {
  let mut pieces = raw.chunks(MAX_STORED_LEN).peekable();
  if raw.is_empty() {
    sink.put_bits(u32::from(is_final), 1);
    sink.put_bits(0, 2);
    sink.flush_to_byte();
    sink.put_bytes(&[0, 0, 0xFF, 0xFF]);
    return;
  }
  while let Some(piece) = pieces.next() {
    let last = is_final && pieces.peek().is_none();
    sink.put_bits(u32::from(last), 1);
    sink.put_bits(0, 2);
    sink.flush_to_byte();
    let len = piece.len() as u16;
    sink.put_bytes(&len.to_le_bytes());
    sink.put_bytes(&(!len).to_le_bytes());
    sink.put_bytes(piece);
  }
}

/// Every code a Huffman block needs, built before any bit is written.
struct BlockCodes<'h> {
  header: Option<(&'h DynamicHeader, Vec<TreeEntry>)>,
  lit_len: Vec<TreeEntry>,
  dist: Vec<TreeEntry>,
}

impl<'h> BlockCodes<'h> {
  fn fixed() -> PngResult<Self> {
    Ok(Self {
      header: None,
      lit_len: TreeEntry::codes_for_writing(&FIXED_LIT_LEN_LENGTHS)?,
      dist: TreeEntry::codes_for_writing(&FIXED_DIST_LENGTHS)?,
    })
  }

  fn dynamic(header: &'h DynamicHeader) -> PngResult<Self> {
    Ok(Self {
      header: Some((header, TreeEntry::codes_for_writing(&header.code_length_lengths)?)),
      lit_len: TreeEntry::codes_for_writing(&header.lit_len_lengths)?,
      dist: TreeEntry::codes_for_writing(&header.dist_lengths)?,
    })
  }

  fn write(&self, sink: &mut BitSink, tokens: &[HuffSymbol], is_final: bool) {
    sink.put_bits(u32::from(is_final), 1);
    match &self.header {
      None => sink.put_bits(1, 2),
      Some((header, code_length_codes)) => {
        sink.put_bits(2, 2);
        header.write(sink, code_length_codes);
      }
    }
    for t in tokens {
      match t.get_literal() {
        Some(lit) => sink.put_code(self.lit_len[usize::from(lit)]),
        None => {
          let (len, dist) = t.get_back_ref();
          let (len_sym, len_extra) = length_to_symbol(len);
          sink.put_code(self.lit_len[usize::from(len_sym)]);
          sink.put_bits(u32::from(len_extra), u32::from(LENGTH_EXTRA[usize::from(len_sym - 257)]));
          let (dist_sym, dist_extra) = dist_to_symbol(dist);
          sink.put_code(self.dist[usize::from(dist_sym)]);
          sink.put_bits(u32::from(dist_extra), u32::from(DIST_EXTRA[usize::from(dist_sym)]));
        }
      }
    }
    sink.put_code(self.lit_len[usize::from(END_OF_BLOCK)]);
  }
}

/// Bits a run of stored blocks takes, counting the padding after each
/// 3 bit block header.
fn stored_bits(sink: &BitSink, raw_len: usize) -> u64 {
  let pieces = ((raw_len + MAX_STORED_LEN - 1) / MAX_STORED_LEN).max(1) as u64;
  let room = u64::from(sink.bits_to_byte_boundary());
  let first_header = if room >= 3 { room } else { room + 8 };
  first_header + (pieces - 1) * 8 + pieces * 32 + 8 * raw_len as u64
}

/// Writes one block as whichever of stored, fixed, or dynamic is smallest.
fn write_block(sink: &mut BitSink, tokens: &[HuffSymbol], raw: &[u8], is_final: bool) {
  let freqs = Frequencies::count(tokens);
  let dynamic = DynamicHeader::new(&freqs);

  let fixed_bits = 3 + freqs.data_bits(&FIXED_LIT_LEN_LENGTHS, &FIXED_DIST_LENGTHS);
  let dynamic_bits =
    3 + dynamic.bits() + freqs.data_bits(&dynamic.lit_len_lengths, &dynamic.dist_lengths);
  let stored_bits = stored_bits(sink, raw.len());
  trace!(
    "block of {} bytes, {} tokens: stored={stored_bits} fixed={fixed_bits} dynamic={dynamic_bits}",
    raw.len(),
    tokens.len()
  );

  let codes = if stored_bits <= fixed_bits && stored_bits <= dynamic_bits {
    return write_stored(sink, raw, is_final);
  } else if fixed_bits <= dynamic_bits {
    BlockCodes::fixed()
  } else {
    BlockCodes::dynamic(&dynamic)
  };
  match codes {
    Ok(codes) => codes.write(sink, tokens, is_final),
    Err(e) => {
      // `build_code_lengths` only makes complete codes, so this is a bug.
      debug_assert!(false, "block codes failed to build: {e:?}");
      trace!("block codes failed to build ({e:?}), storing the block instead");
      write_stored(sink, raw, is_final)
    }
  }
}

#[cfg(test)]
fn round_trip(raw: &[u8], level: u8) -> Vec<u8> {
  let compressed = deflate_to_vec(raw, CompressionLevel::new(level));
  super::inflate(&compressed).unwrap()
}

#[test]
fn test_empty_input_is_one_final_block() {
  for level in [0, 1, 6, 9] {
    let compressed = deflate_to_vec(&[], CompressionLevel::new(level));
    assert!(!compressed.is_empty());
    // the very first bit is BFINAL
    assert_eq!(compressed[0] & 1, 1);
    assert_eq!(super::inflate(&compressed).unwrap(), b"");
  }
}

#[test]
fn test_round_trip_levels() {
  let mut text = Vec::new();
  for i in 0..3000_u32 {
    text.extend_from_slice(b"the quick brown fox ");
    text.push((i % 251) as u8);
  }
  for level in 0..=9 {
    assert_eq!(round_trip(&text, level), text, "level {level}");
  }
}

#[test]
fn test_compresses_repetitive_data() {
  let data = alloc::vec![7_u8; 100_000];
  let compressed = deflate_to_vec(&data, CompressionLevel::DEFAULT);
  assert!(compressed.len() < 1000, "{}", compressed.len());
  assert_eq!(super::inflate(&compressed).unwrap(), data);
}

#[test]
fn test_stored_level_splits_big_input() {
  let data: Vec<u8> = (0..200_000_u32).map(|i| (i * 7 + i / 13) as u8).collect();
  let compressed = deflate_to_vec(&data, CompressionLevel::NONE);
  // four stored pieces, five header bytes each
  assert_eq!(compressed.len(), data.len() + 4 * 5);
  assert_eq!(super::inflate(&compressed).unwrap(), data);
}

#[test]
fn test_block_codes_always_build() {
  let mut all_literals: Vec<HuffSymbol> = (0..=255_u8).map(HuffSymbol::literal).collect();
  all_literals.push(HuffSymbol::back_ref(258, 32768));
  let token_sets: [Vec<HuffSymbol>; 4] = [
    Vec::new(),
    alloc::vec![HuffSymbol::literal(b'a')],
    alloc::vec![HuffSymbol::literal(b'a'), HuffSymbol::back_ref(10, 1)],
    all_literals,
  ];
  assert!(BlockCodes::fixed().is_ok());
  for tokens in &token_sets {
    let header = DynamicHeader::new(&Frequencies::count(tokens));
    assert!(BlockCodes::dynamic(&header).is_ok(), "{} tokens", tokens.len());
  }
}

#[test]
fn test_run_length_encode() {
  let lengths = [0_u8; 141];
  assert_eq!(run_length_encode(&lengths), alloc::vec![(18, 127), (17, 0)]);
  let lengths = [0_u8; 150];
  assert_eq!(run_length_encode(&lengths), alloc::vec![(18, 127), (18, 1)]);
  let lengths = [5_u8; 8];
  assert_eq!(run_length_encode(&lengths), alloc::vec![(5, 0), (16, 3), (5, 0)]);
  let lengths = [3_u8, 3, 0, 0, 4];
  assert_eq!(run_length_encode(&lengths), alloc::vec![(3, 0), (3, 0), (0, 0), (0, 0), (4, 0)]);
}
