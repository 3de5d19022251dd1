//! Hash chain match finder.

use super::*;

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const HASH_MASK: usize = HASH_SIZE - 1;
const WINDOW_MASK: usize = WINDOW_SIZE - 1;
const NIL: u32 = u32::MAX;

/// How hard to look for matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SearchParams {
  /// Most chain links followed per search.
  pub(crate) max_chain: u32,
  /// Stop searching once a match is at least this long.
  pub(crate) nice_len: usize,
  /// Check whether the next position has a longer match before taking one.
  pub(crate) lazy: bool,
}

impl SearchParams {
  /// `None` for level 0, which stores without searching.
  pub(crate) const fn for_level(level: CompressionLevel) -> Option<Self> {
    let (max_chain, nice_len, lazy) = match level.get() {
      0 => return None,
      1 => (4, 8, false),
      2 => (8, 16, false),
      3 => (32, 32, false),
      4 => (16, 16, true),
      5 => (32, 32, true),
      6 => (128, 128, true),
      7 => (256, 128, true),
      8 => (1024, MAX_MATCH, true),
      _ => (4096, MAX_MATCH, true),
    };
    Some(Self { max_chain, nice_len, lazy })
  }
}

/// The match finder state for one compression call.
///
/// `head` holds the newest position for each hash, and `prev` links each
/// position in the window to the previous one with the same hash.
pub(crate) struct MatchFinder {
  head: Vec<u32>,
  prev: Vec<u32>,
  params: SearchParams,
  /// Every position before this has been put into the chains.
  next_insert: usize,
}

impl MatchFinder {
  pub(crate) fn new(params: SearchParams) -> Self {
    Self {
      head: alloc::vec![NIL; HASH_SIZE],
      prev: alloc::vec![NIL; WINDOW_SIZE],
      params,
      next_insert: 0,
    }
  }

  #[inline]
  fn hash(data: &[u8], pos: usize) -> usize {
    let a = usize::from(data[pos]);
    let b = usize::from(data[pos + 1]);
    let c = usize::from(data[pos + 2]);
    ((a << 10) ^ (b << 5) ^ c) & HASH_MASK
  }

  /// Puts every position up to (not including) `end` into the chains.
  fn insert_until(&mut self, data: &[u8], end: usize) {
    let last_hashable = data.len().saturating_sub(MIN_MATCH - 1);
    while self.next_insert < end.min(last_hashable) {
      let pos = self.next_insert;
      let h = Self::hash(data, pos);
      self.prev[pos & WINDOW_MASK] = self.head[h];
      self.head[h] = pos as u32;
      self.next_insert += 1;
    }
    self.next_insert = self.next_insert.max(end);
  }

  /// The longest earlier match for the bytes at `pos`, as `(len, dist)`.
  ///
  /// `len` is 0 when nothing of at least [`MIN_MATCH`] bytes was found.
  fn longest_match(&self, data: &[u8], pos: usize) -> (usize, usize) {
    let max_len = (data.len() - pos).min(MAX_MATCH);
    if max_len < MIN_MATCH {
      return (0, 0);
    }
    let here = &data[pos..pos + max_len];
    let mut best_len = MIN_MATCH - 1;
    let mut best_dist = 0;
    let mut candidate = self.head[Self::hash(data, pos)];
    let mut chain_left = self.params.max_chain;
    while candidate != NIL && chain_left > 0 {
      let cand = candidate as usize;
      let dist = pos - cand;
      if dist > WINDOW_SIZE {
        break;
      }
      let there = &data[cand..cand + max_len];
      // checking the byte just past the current best skips most candidates
      if there[best_len] == here[best_len] {
        let len = here.iter().zip(there.iter()).take_while(|(a, b)| a == b).count();
        if len > best_len {
          best_len = len;
          best_dist = dist;
          if len >= self.params.nice_len || len == max_len {
            break;
          }
        }
      }
      candidate = self.prev[cand & WINDOW_MASK];
      chain_left -= 1;
    }
    if best_dist == 0 {
      (0, 0)
    } else {
      (best_len, best_dist)
    }
  }

  /// Tokenizes from `start` until the data ends or `max_tokens` have been
  /// made. Gives the position tokenizing stopped at.
  ///
  /// Earlier calls' data stays in the window, so a block can refer back into
  /// the previous block.
  pub(crate) fn tokenize(
    &mut self, data: &[u8], start: usize, max_tokens: usize, tokens: &mut Vec<HuffSymbol>,
  ) -> usize {
    debug_assert!(self.next_insert <= start);
    let mut pos = start;
    while pos < data.len() && tokens.len() < max_tokens {
      let (len, dist) = self.longest_match(data, pos);
      if len >= MIN_MATCH && self.params.lazy && len < self.params.nice_len {
        self.insert_until(data, pos + 1);
        let (next_len, _) = self.longest_match(data, pos + 1);
        if next_len > len {
          // the next position does better, so this byte goes out alone
          tokens.push(HuffSymbol::literal(data[pos]));
          pos += 1;
          continue;
        }
      }
      if len >= MIN_MATCH {
        tokens.push(HuffSymbol::back_ref(len, dist));
        self.insert_until(data, pos + len);
        pos += len;
      } else {
        tokens.push(HuffSymbol::literal(data[pos]));
        self.insert_until(data, pos + 1);
        pos += 1;
      }
    }
    pos
  }
}

#[cfg(test)]
fn expand(tokens: &[HuffSymbol]) -> Vec<u8> {
  let mut out = Vec::new();
  for t in tokens {
    match t.get_literal() {
      Some(lit) => out.push(lit),
      None => {
        let (len, dist) = t.get_back_ref();
        let start = out.len() - usize::from(dist);
        for k in 0..usize::from(len) {
          out.push(out[start + k]);
        }
      }
    }
  }
  out
}

#[test]
fn test_tokenize_finds_repeats() {
  let data = b"abcabcabcabcabcabc";
  for level in 1..=9 {
    let params = SearchParams::for_level(CompressionLevel::new(level)).unwrap();
    let mut finder = MatchFinder::new(params);
    let mut tokens = Vec::new();
    let end = finder.tokenize(data, 0, usize::MAX, &mut tokens);
    assert_eq!(end, data.len());
    assert_eq!(expand(&tokens), data);
    assert!(tokens.len() < data.len(), "level {level}: {tokens:?}");
  }
}

#[test]
fn test_tokenize_across_blocks() {
  let mut data = Vec::new();
  for i in 0..5000_u32 {
    data.extend_from_slice(&(i % 97).to_le_bytes());
  }
  let mut finder = MatchFinder::new(SearchParams::for_level(CompressionLevel::DEFAULT).unwrap());
  let mut all = Vec::new();
  let mut pos = 0;
  while pos < data.len() {
    let mut tokens = Vec::new();
    pos = finder.tokenize(&data, pos, 100, &mut tokens);
    assert!(tokens.len() <= 100);
    all.extend(tokens);
  }
  assert_eq!(expand(&all), data);
}

#[test]
fn test_level_zero_has_no_search() {
  assert!(SearchParams::for_level(CompressionLevel::NONE).is_none());
}
