//! Indexed color tables, as stored in `PLTE` and `tRNS`.

use super::*;
use alloc::collections::BTreeMap;
use log::warn;

/// An indexed color table of 1 to 256 RGBA entries.
///
/// In a PNG the colors live in a `PLTE` chunk as RGB triples, and any
/// entry that isn't fully opaque has its alpha in a `tRNS` chunk.
#[derive(Debug, Clone)]
pub struct Palette {
  entries: Vec<r8g8b8a8_Srgb>,
}
impl PartialEq for Palette {
  fn eq(&self, other: &Self) -> bool {
    self.entries.len() == other.entries.len()
      && self.colors().zip(other.colors()).all(|(a, b)| a == b)
  }
}
impl Eq for Palette {}
impl core::hash::Hash for Palette {
  fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
    self.entries.len().hash(state);
    self.colors().for_each(|c| c.hash(state));
  }
}

impl Palette {
  /// Most entries a palette can have.
  pub const MAX_ENTRIES: usize = 256;

  /// ## Failure
  /// * [`PngError::InvalidPalette`] with no entries.
  /// * [`PngError::TooManyColors`] with more than 256 entries.
  pub fn new(entries: Vec<r8g8b8a8_Srgb>) -> PngResult<Self> {
    if entries.is_empty() {
      Err(PngError::InvalidPalette)
    } else if entries.len() > Self::MAX_ENTRIES {
      Err(PngError::TooManyColors)
    } else {
      Ok(Self { entries })
    }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn entries(&self) -> &[r8g8b8a8_Srgb] {
    &self.entries
  }

  /// Number of entries, 1 to 256.
  #[inline]
  #[must_use]
  #[allow(clippy::len_without_is_empty)]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Each entry as `[r, g, b, a]`.
  pub fn colors(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
    self.entries.iter().map(|e| [e.r, e.g, e.b, e.a])
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub fn get(&self, index: u8) -> Option<r8g8b8a8_Srgb> {
    self.entries.get(usize::from(index)).cloned()
  }

  /// Builds a palette from RGBA pixels, and the index of each pixel.
  ///
  /// Colors get entries in the order they're first seen.
  ///
  /// ## Failure
  /// * [`PngError::TooManyColors`] if there are more than 256 distinct colors.
  /// * [`PngError::PixelBufferLength`] if the buffer isn't whole pixels, or is
  ///   empty.
  pub fn build(rgba: &[u8]) -> PngResult<(Self, Vec<u8>)> {
    if rgba.is_empty() || rgba.len() % 4 != 0 {
      return Err(PngError::PixelBufferLength {
        expected: (rgba.len() / 4 * 4).max(4),
        actual: rgba.len(),
      });
    }
    let pixels: &[[u8; 4]] = bytemuck::cast_slice(rgba);
    let mut lookup: BTreeMap<[u8; 4], u8> = BTreeMap::new();
    let mut entries = Vec::new();
    let mut indexes = Vec::new();
    indexes.try_reserve(pixels.len())?;
    for &px in pixels {
      let index = match lookup.get(&px) {
        Some(&i) => i,
        None => {
          if entries.len() == Self::MAX_ENTRIES {
            return Err(PngError::TooManyColors);
          }
          let i = entries.len() as u8;
          let [r, g, b, a] = px;
          entries.push(r8g8b8a8_Srgb { r, g, b, a });
          lookup.insert(px, i);
          i
        }
      };
      indexes.push(index);
    }
    Ok((Self { entries }, indexes))
  }

  /// Turns indexes back into RGBA pixels.
  ///
  /// ## Failure
  /// * [`PngError::IndexOutOfRange`] for any index past the last entry.
  pub fn resolve(&self, indexes: &[u8]) -> PngResult<Vec<u8>> {
    self.check_indexes(indexes)?;
    let mut out: Vec<u8> = Vec::new();
    out.try_reserve(indexes.len() * 4)?;
    out.resize(indexes.len() * 4, 0);
    let out_px: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut out);
    for (px, &i) in out_px.iter_mut().zip(indexes) {
      let e = &self.entries[usize::from(i)];
      *px = [e.r, e.g, e.b, e.a];
    }
    Ok(out)
  }

  /// Errors on the first index that has no entry.
  pub fn check_indexes(&self, indexes: &[u8]) -> PngResult<()> {
    let palette_len = self.entries.len();
    match indexes.iter().find(|&&i| usize::from(i) >= palette_len) {
      Some(&index) => Err(PngError::IndexOutOfRange { index, palette_len }),
      None => Ok(()),
    }
  }

  /// Reads `PLTE` data and the optional `tRNS` data that goes with it.
  ///
  /// ## Failure
  /// * [`FormatError::BadPaletteLength`] unless the `PLTE` data is 1 to 256
  ///   RGB triples.
  pub fn from_chunks(plte: &[u8], trns: Option<&[u8]>) -> PngResult<Self> {
    if plte.is_empty() || plte.len() % 3 != 0 || plte.len() / 3 > Self::MAX_ENTRIES {
      return Err(FormatError::BadPaletteLength(plte.len()).into());
    }
    let triples: &[[u8; 3]] = bytemuck::cast_slice(plte);
    let mut entries: Vec<r8g8b8a8_Srgb> =
      triples.iter().map(|&[r, g, b]| r8g8b8a8_Srgb { r, g, b, a: 255 }).collect();
    if let Some(alphas) = trns {
      if alphas.len() > entries.len() {
        warn!("tRNS has {} entries for a palette of {}, ignoring the extra", alphas.len(), entries.len());
      }
      for (entry, &a) in entries.iter_mut().zip(alphas) {
        entry.a = a;
      }
    }
    Ok(Self { entries })
  }

  /// `PLTE` chunk data: the RGB part of every entry.
  #[must_use]
  pub fn plte_bytes(&self) -> Vec<u8> {
    self.entries.iter().flat_map(|e| [e.r, e.g, e.b]).collect()
  }

  /// `tRNS` chunk data, or `None` when every entry is opaque.
  ///
  /// Trailing opaque entries are left off, a decoder fills them in as 255.
  #[must_use]
  pub fn trns_bytes(&self) -> Option<Vec<u8>> {
    let used = self.entries.iter().rposition(|e| e.a != 255)? + 1;
    Some(self.entries[..used].iter().map(|e| e.a).collect())
  }
}

#[cfg(test)]
fn rgba(r: u8, g: u8, b: u8, a: u8) -> r8g8b8a8_Srgb {
  r8g8b8a8_Srgb { r, g, b, a }
}

#[cfg(test)]
fn colors(p: &Palette) -> Vec<[u8; 4]> {
  p.colors().collect()
}

#[test]
fn test_build_first_seen_order() {
  let pixels = [9, 9, 9, 255, 1, 2, 3, 4, 9, 9, 9, 255, 0, 0, 0, 0];
  let (palette, indexes) = Palette::build(&pixels).unwrap();
  assert_eq!(colors(&palette), [[9, 9, 9, 255], [1, 2, 3, 4], [0, 0, 0, 0]]);
  assert_eq!(indexes, [0, 1, 0, 2]);
  assert_eq!(palette.resolve(&indexes).unwrap(), pixels);
}

#[test]
fn test_build_too_many_colors() {
  let mut pixels = Vec::new();
  for i in 0..257_u32 {
    pixels.extend_from_slice(&[i as u8, (i >> 8) as u8, 0, 255]);
  }
  assert_eq!(Palette::build(&pixels).unwrap_err(), PngError::TooManyColors);
  // exactly 256 is fine
  assert_eq!(Palette::build(&pixels[..256 * 4]).unwrap().0.len(), 256);
}

#[test]
fn test_resolve_out_of_range() {
  let palette = Palette::new(alloc::vec![rgba(1, 1, 1, 255), rgba(2, 2, 2, 255)]).unwrap();
  assert_eq!(
    palette.resolve(&[0, 1, 2]).unwrap_err(),
    PngError::IndexOutOfRange { index: 2, palette_len: 2 }
  );
}

#[test]
fn test_chunk_bytes() {
  let palette =
    Palette::new(alloc::vec![rgba(1, 2, 3, 255), rgba(4, 5, 6, 7), rgba(8, 9, 10, 255)]).unwrap();
  assert_eq!(palette.plte_bytes(), [1, 2, 3, 4, 5, 6, 8, 9, 10]);
  assert_eq!(palette.trns_bytes(), Some(alloc::vec![255, 7]));
  let back = Palette::from_chunks(&palette.plte_bytes(), palette.trns_bytes().as_deref()).unwrap();
  assert_eq!(back, palette);

  let opaque = Palette::new(alloc::vec![rgba(1, 2, 3, 255)]).unwrap();
  assert_eq!(opaque.trns_bytes(), None);
}

#[test]
fn test_from_chunks_errors() {
  assert_eq!(
    Palette::from_chunks(&[1, 2], None).unwrap_err(),
    PngError::Format(FormatError::BadPaletteLength(2))
  );
  assert_eq!(
    Palette::from_chunks(&[], None).unwrap_err(),
    PngError::Format(FormatError::BadPaletteLength(0))
  );
  // tRNS longer than the palette only gets used as far as it goes
  let p = Palette::from_chunks(&[1, 2, 3], Some(&[7, 8, 9])).unwrap();
  assert_eq!(colors(&p), [[1, 2, 3, 7]]);
  assert_eq!(Palette::new(Vec::new()).unwrap_err(), PngError::InvalidPalette);
}
