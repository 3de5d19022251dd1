//! Scanline filters.
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! For each byte `x` of a row the filters look at `a` (the same byte of the
//! pixel to the left), `b` (the same byte in the row above), and `c` (the
//! same byte of the pixel above and to the left). Anything past the left or
//! top edge counts as 0.

use super::*;

/// The five per-row filters of filter method 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl FilterType {
  /// Every filter, in type byte order.
  pub const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];
}
impl TryFrom<u8> for FilterType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      other => return Err(CorruptStreamError::IllegalFilterType(other).into()),
    })
  }
}

/// Filters one row of raw bytes.
///
/// * `prev` is the raw row above, all zeroes for the first row.
/// * `bpp` is the bytes per pixel (at least 1).
/// * `cur`, `prev`, and `out` must all be the same length.
pub fn filter_row(ty: FilterType, cur: &[u8], prev: &[u8], bpp: usize, out: &mut [u8]) {
  debug_assert_eq!(cur.len(), prev.len());
  debug_assert_eq!(cur.len(), out.len());
  debug_assert!(bpp > 0);
  match ty {
    FilterType::None => out.copy_from_slice(cur),
    FilterType::Sub => {
      for x in 0..cur.len() {
        let a = if x >= bpp { cur[x - bpp] } else { 0 };
        out[x] = cur[x].wrapping_sub(a);
      }
    }
    FilterType::Up => {
      for ((o, &x), &b) in out.iter_mut().zip(cur).zip(prev) {
        *o = x.wrapping_sub(b);
      }
    }
    FilterType::Average => {
      for x in 0..cur.len() {
        let a = if x >= bpp { cur[x - bpp] } else { 0 };
        out[x] = cur[x].wrapping_sub(average(a, prev[x]));
      }
    }
    FilterType::Paeth => {
      for x in 0..cur.len() {
        let (a, c) = if x >= bpp { (cur[x - bpp], prev[x - bpp]) } else { (0, 0) };
        out[x] = cur[x].wrapping_sub(paeth_predictor(a, prev[x], c));
      }
    }
  }
}

/// Reverses [`filter_row`] in place: `row` goes in filtered and comes out
/// raw.
///
/// * `prev` is the already unfiltered row above, all zeroes for the first row.
pub fn unfilter_row(ty: FilterType, row: &mut [u8], prev: &[u8], bpp: usize) {
  debug_assert_eq!(row.len(), prev.len());
  debug_assert!(bpp > 0);
  match ty {
    FilterType::None => (),
    FilterType::Sub => {
      // the first pixel has nothing to its left
      for x in bpp..row.len() {
        row[x] = reconstruct_sub(row[x], row[x - bpp]);
      }
    }
    FilterType::Up => {
      for (x, &b) in row.iter_mut().zip(prev) {
        *x = reconstruct_up(*x, b);
      }
    }
    FilterType::Average => {
      for x in 0..row.len() {
        let a = if x >= bpp { row[x - bpp] } else { 0 };
        row[x] = reconstruct_average(row[x], a, prev[x]);
      }
    }
    FilterType::Paeth => {
      for x in 0..row.len() {
        let (a, c) = if x >= bpp { (row[x - bpp], prev[x - bpp]) } else { (0, 0) };
        row[x] = reconstruct_paeth(row[x], a, prev[x], c);
      }
    }
  }
}

/// Unfilters decompressed image data in place.
///
/// The data is `height` rows of one filter type byte then `row_bytes` bytes.
/// Afterwards the rows are packed together at the front of the buffer with
/// the type bytes gone, and the buffer is truncated to `row_bytes * height`.
///
/// ## Failure
/// * [`CorruptStreamError::IllegalFilterType`] for a type byte above 4.
pub(crate) fn reconstruct_in_place(
  data: &mut Vec<u8>, row_bytes: usize, bpp: usize,
) -> PngResult<()> {
  let stride = row_bytes + 1;
  debug_assert_eq!(data.len() % stride, 0);
  let height = data.len() / stride;
  let mut zero_row = Vec::new();
  zero_row.try_reserve(row_bytes)?;
  zero_row.resize(row_bytes, 0);

  for y in 0..height {
    let (done, rest) = data.split_at_mut(y * stride);
    let (filter_byte, row) = match rest[..stride].split_first_mut() {
      Some(split) => split,
      None => break,
    };
    let prev: &[u8] = if y == 0 { &zero_row } else { &done[done.len() - row_bytes..] };
    unfilter_row(FilterType::try_from(*filter_byte)?, row, prev, bpp);
  }

  // drop the type bytes
  for y in 0..height {
    let src = y * stride + 1;
    data.copy_within(src..src + row_bytes, y * row_bytes);
  }
  data.truncate(row_bytes * height);
  Ok(())
}

/// Filters a whole image, giving `height` rows that each start with their
/// filter type byte.
pub(crate) fn filter_image(
  pixels: &[u8], row_bytes: usize, bpp: usize, strategy: FilterStrategy,
) -> PngResult<Vec<u8>> {
  debug_assert!(row_bytes > 0);
  let height = pixels.len() / row_bytes;
  let mut out = Vec::new();
  out.try_reserve((row_bytes + 1) * height)?;
  let zero_row = alloc::vec![0_u8; row_bytes];
  let mut candidate = alloc::vec![0_u8; row_bytes];
  let mut best = alloc::vec![0_u8; row_bytes];

  let mut prev: &[u8] = &zero_row;
  for cur in pixels.chunks_exact(row_bytes) {
    let ty = match strategy {
      FilterStrategy::Fixed(ty) => {
        filter_row(ty, cur, prev, bpp, &mut best);
        ty
      }
      FilterStrategy::MinSum => {
        let mut best_ty = FilterType::None;
        let mut best_score = u64::MAX;
        for ty in FilterType::ALL {
          filter_row(ty, cur, prev, bpp, &mut candidate);
          let score = min_sum_score(&candidate);
          if score < best_score {
            best_score = score;
            best_ty = ty;
            core::mem::swap(&mut best, &mut candidate);
          }
        }
        best_ty
      }
    };
    out.push(ty as u8);
    out.extend_from_slice(&best);
    prev = cur;
  }
  Ok(out)
}

/// Sum of the output bytes read as signed values, ignoring their sign.
///
/// Small signed values mean the filter predicted well, which tends to
/// compress well.
fn min_sum_score(filtered: &[u8]) -> u64 {
  filtered.iter().map(|&b| u64::from((b as i8).unsigned_abs())).sum()
}

/// `floor((a + b) / 2)` without overflow.
#[inline]
const fn average(a: u8, b: u8) -> u8 {
  ((a as u16 + b as u16) / 2) as u8
}

/// Reconstruct Filter Type 1
///
/// * `fx` filtered X
/// * `ra` reconstructed `a`, the corresponding byte from the pixel to the
///   left.
const fn reconstruct_sub(fx: u8, ra: u8) -> u8 {
  fx.wrapping_add(ra)
}

/// Reconstruct Filter Type 2
///
/// * `fx` filtered X
/// * `rb` reconstructed `b`: The byte corresponding to this byte within the
///   previous scanline.
const fn reconstruct_up(fx: u8, rb: u8) -> u8 {
  fx.wrapping_add(rb)
}

/// Reconstruct Filter Type 3
const fn reconstruct_average(fx: u8, ra: u8, rb: u8) -> u8 {
  fx.wrapping_add(average(ra, rb))
}

/// Reconstruct Filter Type 4
const fn reconstruct_paeth(fx: u8, ra: u8, rb: u8, rc: u8) -> u8 {
  fx.wrapping_add(paeth_predictor(ra, rb, rc))
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring pixels (left `a`, above `b`, upper left `c`).
///
/// The output is whichever neighbor is closest to the computed value, with
/// ties going to `a`, then `b`, then `c`.
pub(crate) const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  // "The calculations within the PaethPredictor function shall be performed
  // exactly, without overflow.", so i32 math here.
  let a = a as i32;
  let b = b as i32;
  let c = c as i32;
  let p = a + b - c;
  let pa = (p - a).abs();
  let pb = (p - b).abs();
  let pc = (p - c).abs();
  if pa <= pb && pa <= pc {
    a as u8
  } else if pb <= pc {
    b as u8
  } else {
    c as u8
  }
}

#[test]
fn test_paeth_tie_order() {
  // all three equally close: a wins
  assert_eq!(paeth_predictor(10, 10, 10), 10);
  // p = 20 + 30 - 20 = 30, b is exact
  assert_eq!(paeth_predictor(20, 30, 20), 30);
  // p = 5 + 5 - 10 = 0: pa = 5, pb = 5, pc = 10, a wins the tie with b
  assert_eq!(paeth_predictor(5, 5, 10), 5);
  // p = 100 + 0 - 50 = 50: pa = 50, pb = 50, pc = 0, c is closest
  assert_eq!(paeth_predictor(100, 0, 50), 50);
}

#[test]
fn test_average_does_not_overflow() {
  assert_eq!(average(255, 255), 255);
  assert_eq!(average(255, 0), 127);
  assert_eq!(reconstruct_average(1, 200, 201), 201);
}

#[test]
fn test_each_filter_reverses() {
  let prev: Vec<u8> = (0..24_u32).map(|i| (i * 37 + 11) as u8).collect();
  let cur: Vec<u8> = (0..24_u32).map(|i| (i * 91 + 250) as u8).collect();
  for bpp in [1, 4] {
    for ty in FilterType::ALL {
      let mut row = alloc::vec![0; cur.len()];
      filter_row(ty, &cur, &prev, bpp, &mut row);
      unfilter_row(ty, &mut row, &prev, bpp);
      assert_eq!(row, cur, "{ty:?} bpp {bpp}");
    }
  }
}

#[test]
fn test_filter_image_then_reconstruct() {
  let row_bytes = 12;
  let pixels: Vec<u8> = (0..(row_bytes * 5) as u32).map(|i| (i * i / 3) as u8).collect();
  for strategy in [FilterStrategy::MinSum, FilterStrategy::Fixed(FilterType::Paeth)] {
    let mut filtered = filter_image(&pixels, row_bytes, 4, strategy).unwrap();
    assert_eq!(filtered.len(), (row_bytes + 1) * 5);
    reconstruct_in_place(&mut filtered, row_bytes, 4).unwrap();
    assert_eq!(filtered, pixels);
  }
}

#[test]
fn test_reconstruct_rejects_bad_filter_type() {
  let mut data = alloc::vec![0, 1, 2, 5, 1, 2];
  assert_eq!(
    reconstruct_in_place(&mut data, 2, 1).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::IllegalFilterType(5))
  );
}

#[test]
fn test_min_sum_prefers_small_signed_values() {
  // a smooth gradient: Sub turns it into all 1s
  let cur: Vec<u8> = (0..16).collect();
  let filtered = filter_image(&cur, 16, 1, FilterStrategy::MinSum).unwrap();
  assert_eq!(filtered[0], FilterType::Sub as u8);
}
