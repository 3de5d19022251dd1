//! Knobs for decoding and encoding.
//!
//! All fields are public, and each has a `set_` builder method so that options
//! can be made in a single expression:
//!
//! ```
//! # use pngcore::*;
//! let opts = EncoderOptions::default().set_level(CompressionLevel::BEST).set_indexed(true);
//! assert!(opts.indexed);
//! ```

use crate::png::FilterType;

/// DEFLATE effort, from 0 (stored only) to 9 (slowest, smallest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
  /// No compression at all, every block is stored.
  pub const NONE: Self = Self(0);
  /// Short hash chains, no lazy matching.
  pub const FAST: Self = Self(1);
  #[allow(missing_docs)]
  pub const DEFAULT: Self = Self(6);
  /// Long hash chains and lazy matching.
  pub const BEST: Self = Self(9);

  /// Values above 9 are clamped to 9.
  #[inline]
  #[must_use]
  pub const fn new(level: u8) -> Self {
    if level > 9 {
      Self(9)
    } else {
      Self(level)
    }
  }

  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn get(self) -> u8 {
    self.0
  }
}

impl Default for CompressionLevel {
  #[inline]
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// How the encoder picks each row's filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterStrategy {
  /// Every row uses the same filter.
  Fixed(FilterType),
  /// Try all five filters on each row and keep the one with the smallest sum
  /// of absolute (signed) output bytes.
  #[default]
  MinSum,
}

/// Options for the decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderOptions {
  /// Images wider than this are rejected before any allocation.
  pub max_width: u32,
  /// Images taller than this are rejected before any allocation.
  pub max_height: u32,
  /// Check every chunk's CRC.
  pub confirm_crc: bool,
  /// Check the Adler-32 at the end of the image data.
  pub confirm_adler: bool,
  /// Give back palette indexes plus the palette instead of RGBA.
  pub want_palette: bool,
}

impl Default for DecoderOptions {
  #[inline]
  fn default() -> Self {
    Self {
      max_width: 1 << 17,
      max_height: 1 << 17,
      confirm_crc: true,
      confirm_adler: true,
      want_palette: false,
    }
  }
}

#[allow(missing_docs)]
impl DecoderOptions {
  #[inline]
  #[must_use]
  pub const fn set_max_width(mut self, width: u32) -> Self {
    self.max_width = width;
    self
  }
  #[inline]
  #[must_use]
  pub const fn set_max_height(mut self, height: u32) -> Self {
    self.max_height = height;
    self
  }
  #[inline]
  #[must_use]
  pub const fn set_confirm_crc(mut self, yes: bool) -> Self {
    self.confirm_crc = yes;
    self
  }
  #[inline]
  #[must_use]
  pub const fn set_confirm_adler(mut self, yes: bool) -> Self {
    self.confirm_adler = yes;
    self
  }
  #[inline]
  #[must_use]
  pub const fn set_want_palette(mut self, yes: bool) -> Self {
    self.want_palette = yes;
    self
  }
}

/// Options for the encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncoderOptions {
  #[allow(missing_docs)]
  pub level: CompressionLevel,
  #[allow(missing_docs)]
  pub filter: FilterStrategy,
  /// Write an RGBA image as indexed color, building the palette from its
  /// colors. Fails if there are more than 256 of them.
  pub indexed: bool,
  /// Most bytes of image data per `IDAT` chunk.
  pub idat_chunk_size: usize,
}

impl Default for EncoderOptions {
  #[inline]
  fn default() -> Self {
    Self {
      level: CompressionLevel::DEFAULT,
      filter: FilterStrategy::MinSum,
      indexed: false,
      idat_chunk_size: 8192,
    }
  }
}

#[allow(missing_docs)]
impl EncoderOptions {
  #[inline]
  #[must_use]
  pub const fn set_level(mut self, level: CompressionLevel) -> Self {
    self.level = level;
    self
  }
  #[inline]
  #[must_use]
  pub const fn set_filter(mut self, filter: FilterStrategy) -> Self {
    self.filter = filter;
    self
  }
  #[inline]
  #[must_use]
  pub const fn set_indexed(mut self, yes: bool) -> Self {
    self.indexed = yes;
    self
  }
  /// A size of 0 is treated as 1.
  #[inline]
  #[must_use]
  pub const fn set_idat_chunk_size(mut self, size: usize) -> Self {
    self.idat_chunk_size = if size == 0 { 1 } else { size };
    self
  }
}

#[test]
fn test_compression_level_clamps() {
  assert_eq!(CompressionLevel::new(200), CompressionLevel::BEST);
  assert_eq!(CompressionLevel::new(3).get(), 3);
  assert_eq!(CompressionLevel::default(), CompressionLevel::DEFAULT);
}
