//! Heap allocated image data going in and out of the codec.

use crate::{error::*, png::Palette};
use alloc::vec::Vec;

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// pixel index.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  y as usize * width as usize + x as usize
}

/// An owned image.
///
/// * With no palette, `pixels` is `RGBA8` data, 4 bytes per pixel.
/// * With a palette, `pixels` is one palette index per pixel.
///
/// Rows go top to bottom with no padding. The fields are public, but if you
/// put them together weirdly the encoder will reject the image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Image {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<u8>,
  pub palette: Option<Palette>,
}
impl Image {
  /// ## Failure
  /// * [`PngError::InvalidDimensions`] if either dimension is 0.
  /// * [`PngError::PixelBufferLength`] unless there's exactly 4 bytes per pixel.
  pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> PngResult<Self> {
    check_len(width, height, 4, pixels.len())?;
    Ok(Self { width, height, pixels, palette: None })
  }

  /// ## Failure
  /// * [`PngError::InvalidDimensions`] if either dimension is 0.
  /// * [`PngError::PixelBufferLength`] unless there's exactly 1 index per pixel.
  /// * [`PngError::IndexOutOfRange`] if an index has no palette entry.
  pub fn from_indexed(
    width: u32, height: u32, indexes: Vec<u8>, palette: Palette,
  ) -> PngResult<Self> {
    check_len(width, height, 1, indexes.len())?;
    palette.check_indexes(&indexes)?;
    Ok(Self { width, height, pixels: indexes, palette: Some(palette) })
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn is_indexed(&self) -> bool {
    self.palette.is_some()
  }

  /// 1 for indexed images, 4 for RGBA.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(&self) -> usize {
    if self.is_indexed() {
      1
    } else {
      4
    }
  }

  /// Bytes per row of `pixels`.
  #[inline]
  #[must_use]
  pub const fn stride(&self) -> usize {
    self.bytes_per_pixel() * self.width as usize
  }

  /// Gets the bytes of the pixel at the position, or `None` if the position
  /// is out of bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<&[u8]> {
    if x < self.width && y < self.height {
      let bpp = self.bytes_per_pixel();
      let i = xy_width_to_index(x, y, self.width) * bpp;
      self.pixels.get(i..i + bpp)
    } else {
      None
    }
  }

  /// The pixels as `RGBA8`, looking each index up in the palette if there is
  /// one.
  pub fn to_rgba(&self) -> PngResult<Vec<u8>> {
    match &self.palette {
      Some(palette) => palette.resolve(&self.pixels),
      None => Ok(self.pixels.clone()),
    }
  }
}

fn check_len(width: u32, height: u32, bpp: usize, actual: usize) -> PngResult<()> {
  if width == 0 || height == 0 {
    return Err(PngError::InvalidDimensions { width, height });
  }
  let expected = (width as usize)
    .checked_mul(height as usize)
    .and_then(|px| px.checked_mul(bpp))
    .ok_or(PngError::InvalidDimensions { width, height })?;
  if expected == actual {
    Ok(())
  } else {
    Err(PngError::PixelBufferLength { expected, actual })
  }
}

/// What [`peek_info`](crate::png::peek_info) reads from the front of a PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PngInfo {
  #[allow(missing_docs)]
  pub width: u32,
  #[allow(missing_docs)]
  pub height: u32,
  /// `PLTE` entries of an indexed image, 0 for anything else.
  pub colormap_entries: usize,
  /// As declared in the header, even if it isn't supported.
  pub bit_depth: u8,
  /// As declared in the header, even if it isn't supported.
  pub color_type: u8,
}

#[test]
fn test_image_accessors() {
  use pixel_formats::r8g8b8a8_Srgb;
  let rgba = Image::from_rgba(2, 1, alloc::vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
  assert_eq!(rgba.stride(), 8);
  assert_eq!(rgba.get(1, 0), Some(&[5, 6, 7, 8][..]));
  assert_eq!(rgba.get(2, 0), None);

  let palette = Palette::new(alloc::vec![
    r8g8b8a8_Srgb { r: 1, g: 2, b: 3, a: 4 },
    r8g8b8a8_Srgb { r: 5, g: 6, b: 7, a: 8 },
  ])
  .unwrap();
  let indexed = Image::from_indexed(2, 1, alloc::vec![1, 0], palette).unwrap();
  assert!(indexed.is_indexed());
  assert_eq!(indexed.get(0, 0), Some(&[1][..]));
  assert_eq!(indexed.to_rgba().unwrap(), [5, 6, 7, 8, 1, 2, 3, 4]);

  assert_eq!(
    Image::from_rgba(2, 2, alloc::vec![0; 15]).unwrap_err(),
    PngError::PixelBufferLength { expected: 16, actual: 15 }
  );
}
