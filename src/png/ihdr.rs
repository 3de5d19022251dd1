use super::*;

/// The PNG color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum PngColorType {
  Y = 0,
  RGB = 2,
  Index = 3,
  YA = 4,
  RGBA = 6,
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      other => return Err(UnsupportedFormatError::ColorType(other).into()),
    })
  }
}

/// The pixel layouts this crate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PngPixelFormat {
  /// One byte per pixel, an index into the palette.
  I8,
  /// Four bytes per pixel: red, green, blue, alpha.
  RGBA8,
}
impl PngPixelFormat {
  /// The step between a byte and "the same byte of the pixel to the left",
  /// as the filters use it.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self) -> usize {
    match self {
      Self::I8 => 1,
      Self::RGBA8 => 4,
    }
  }

  /// Bytes of pixel data per row, without the filter type byte.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(self, width: u32) -> usize {
    self.bytes_per_pixel() * width as usize
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn color_type(self) -> PngColorType {
    match self {
      Self::I8 => PngColorType::Index,
      Self::RGBA8 => PngColorType::RGBA,
    }
  }
}

/// Width and height may not be above this.
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

/// The image header chunk.
///
/// The values are stored as read, and checked only as far as the PNG format
/// itself requires. [`IHDR::pixel_format`] narrows them down to what this
/// crate supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct IHDR {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: u8,
  pub compression_method: u8,
  pub filter_method: u8,
  pub interlace_method: u8,
}
impl TryFrom<&[u8]> for IHDR {
  type Error = PngError;
  /// Parses the 13 data bytes of an `IHDR` chunk.
  #[inline]
  fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
    match *data {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression_method, filter_method, interlace_method] =>
      {
        let width = u32::from_be_bytes([w0, w1, w2, w3]);
        let height = u32::from_be_bytes([h0, h1, h2, h3]);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
          return Err(PngError::InvalidDimensions { width, height });
        }
        Ok(Self {
          width,
          height,
          bit_depth,
          color_type,
          compression_method,
          filter_method,
          interlace_method,
        })
      }
      _ => Err(FormatError::BadHeaderLength(data.len()).into()),
    }
  }
}
impl IHDR {
  /// A header for an image this crate can write.
  #[inline]
  #[must_use]
  pub const fn new(width: u32, height: u32, format: PngPixelFormat) -> Self {
    Self {
      width,
      height,
      bit_depth: 8,
      color_type: format.color_type() as u8,
      compression_method: 0,
      filter_method: 0,
      interlace_method: 0,
    }
  }

  /// The 13 data bytes of the chunk.
  #[must_use]
  pub fn to_bytes(&self) -> [u8; 13] {
    let mut out = [0_u8; 13];
    out[0..4].copy_from_slice(&self.width.to_be_bytes());
    out[4..8].copy_from_slice(&self.height.to_be_bytes());
    out[8] = self.bit_depth;
    out[9] = self.color_type;
    out[10] = self.compression_method;
    out[11] = self.filter_method;
    out[12] = self.interlace_method;
    out
  }

  /// Checks that the image is 8-bit RGBA or 8-bit indexed, not interlaced,
  /// and uses the standard compression and filter methods.
  ///
  /// ## Failure
  /// * [`UnsupportedFormatError`] naming the first value out of range.
  pub fn pixel_format(&self) -> PngResult<PngPixelFormat> {
    if self.compression_method != 0 {
      return Err(UnsupportedFormatError::CompressionMethod(self.compression_method).into());
    }
    if self.filter_method != 0 {
      return Err(UnsupportedFormatError::FilterMethod(self.filter_method).into());
    }
    if self.interlace_method != 0 {
      return Err(UnsupportedFormatError::Interlaced.into());
    }
    let format = match PngColorType::try_from(self.color_type)? {
      PngColorType::RGBA => PngPixelFormat::RGBA8,
      PngColorType::Index => PngPixelFormat::I8,
      _ => return Err(UnsupportedFormatError::ColorType(self.color_type).into()),
    };
    if self.bit_depth != 8 {
      return Err(UnsupportedFormatError::BitDepth(self.bit_depth).into());
    }
    Ok(format)
  }

  /// Bytes of zlib output the image data has to inflate to: every row plus
  /// its filter type byte.
  pub fn filtered_len(&self, format: PngPixelFormat) -> PngResult<usize> {
    let row = format
      .bytes_per_pixel()
      .checked_mul(self.width as usize)
      .and_then(|r| r.checked_add(1))
      .ok_or(PngError::InvalidDimensions { width: self.width, height: self.height })?;
    row
      .checked_mul(self.height as usize)
      .ok_or(PngError::InvalidDimensions { width: self.width, height: self.height })
  }
}

#[test]
fn test_ihdr_round_trip_and_checks() {
  let ihdr = IHDR::new(2, 3, PngPixelFormat::RGBA8);
  let bytes = ihdr.to_bytes();
  assert_eq!(bytes, [0, 0, 0, 2, 0, 0, 0, 3, 8, 6, 0, 0, 0]);
  assert_eq!(IHDR::try_from(&bytes[..]).unwrap(), ihdr);
  assert_eq!(ihdr.pixel_format().unwrap(), PngPixelFormat::RGBA8);
  assert_eq!(ihdr.filtered_len(PngPixelFormat::RGBA8).unwrap(), 3 * (1 + 8));

  assert_eq!(
    IHDR::try_from(&bytes[..12]).unwrap_err(),
    PngError::Format(FormatError::BadHeaderLength(12))
  );
  let zero_w = [0, 0, 0, 0, 0, 0, 0, 3, 8, 6, 0, 0, 0];
  assert_eq!(
    IHDR::try_from(&zero_w[..]).unwrap_err(),
    PngError::InvalidDimensions { width: 0, height: 3 }
  );
}

#[test]
fn test_ihdr_unsupported_subset() {
  let check = |bit_depth, color_type, interlace_method| IHDR {
    width: 1,
    height: 1,
    bit_depth,
    color_type,
    compression_method: 0,
    filter_method: 0,
    interlace_method,
  }
  .pixel_format();
  assert_eq!(check(8, 3, 0), Ok(PngPixelFormat::I8));
  assert_eq!(check(16, 6, 0), Err(PngError::UnsupportedFormat(UnsupportedFormatError::BitDepth(16))));
  assert_eq!(check(4, 3, 0), Err(PngError::UnsupportedFormat(UnsupportedFormatError::BitDepth(4))));
  assert_eq!(check(8, 2, 0), Err(PngError::UnsupportedFormat(UnsupportedFormatError::ColorType(2))));
  assert_eq!(check(8, 5, 0), Err(PngError::UnsupportedFormat(UnsupportedFormatError::ColorType(5))));
  assert_eq!(check(8, 6, 1), Err(PngError::UnsupportedFormat(UnsupportedFormatError::Interlaced)));
}
