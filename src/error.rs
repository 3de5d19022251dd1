use core::fmt;

/// Shorthand for results with a [`PngError`].
pub type PngResult<T> = Result<T, PngError>;

/// An error from the `pngcore` crate.
///
/// Every failure is terminal for the call that produced it: no partial image
/// is ever handed back alongside an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngError {
  /// The container framing is wrong (signature, chunk layout, CRC, chunk
  /// order).
  Format(FormatError),

  /// The compressed stream or the filtered scanlines inside it are invalid.
  CorruptStream(CorruptStreamError),

  /// A valid PNG, but outside of 8-bit RGBA and 8-bit indexed color.
  UnsupportedFormat(UnsupportedFormatError),

  /// Building a palette found more than 256 distinct colors.
  TooManyColors,

  /// A pixel index doesn't name an entry of the palette.
  IndexOutOfRange {
    /// The bad index.
    index: u8,
    /// How many entries the palette actually has.
    palette_len: usize,
  },

  /// The width or height is zero, too big for this crate, or above a
  /// configured limit.
  InvalidDimensions {
    #[allow(missing_docs)]
    width: u32,
    #[allow(missing_docs)]
    height: u32,
  },

  /// A caller supplied palette has no entries.
  InvalidPalette,

  /// The pixel buffer length doesn't match `stride * height`.
  PixelBufferLength {
    #[allow(missing_docs)]
    expected: usize,
    #[allow(missing_docs)]
    actual: usize,
  },

  /// The allocator couldn't give us enough space.
  Alloc,

  /// Reading or writing a file failed.
  #[cfg(feature = "std")]
  #[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
  Io(std::io::ErrorKind),
}

/// Problems with the PNG container itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FormatError {
  BadSignature,
  /// Input ended in the middle of a chunk.
  TruncatedChunk,
  CrcMismatch {
    chunk: [u8; 4],
    declared: u32,
    actual: u32,
  },
  FirstChunkNotIhdr,
  BadHeaderLength(usize),
  /// `PLTE` data must be 1 to 256 RGB triples.
  BadPaletteLength(usize),
  DuplicatePalette,
  PaletteAfterImageData,
  MissingPalette,
  MissingImageData,
  MissingImageEnd,
}

/// Problems inside the zlib/DEFLATE stream or the filtered scanlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CorruptStreamError {
  UnexpectedEndOfInput,
  /// Block type `0b11` is reserved.
  InvalidBlockType,
  /// A stored block's `LEN` isn't the complement of its `NLEN`.
  StoredLengthMismatch,
  OversubscribedTree,
  IncompleteTree,
  /// A dynamic literal/length tree without a code for symbol 256.
  MissingEndOfBlock,
  /// Repeat code 16 with no previous length, or a repeat running past the
  /// end of the code lengths.
  BadCodeLengthRepeat,
  /// A decoded symbol that the alphabet doesn't allow (286, 287, dist 30, 31).
  InvalidSymbol,
  /// A back reference reaching before the start of the output.
  DistanceTooFar,
  /// More output than the caller said could possibly be needed.
  OutputLimitExceeded,
  BadZlibHeader,
  AdlerMismatch,
  /// The decompressed scanlines are shorter than the header requires.
  NotEnoughImageData,
  IllegalFilterType(u8),
}

/// Legal PNG values that this crate doesn't handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum UnsupportedFormatError {
  BitDepth(u8),
  ColorType(u8),
  CompressionMethod(u8),
  FilterMethod(u8),
  Interlaced,
  UnknownCriticalChunk([u8; 4]),
}

impl From<FormatError> for PngError {
  #[inline]
  fn from(e: FormatError) -> Self {
    Self::Format(e)
  }
}
impl From<CorruptStreamError> for PngError {
  #[inline]
  fn from(e: CorruptStreamError) -> Self {
    Self::CorruptStream(e)
  }
}
impl From<UnsupportedFormatError> for PngError {
  #[inline]
  fn from(e: UnsupportedFormatError) -> Self {
    Self::UnsupportedFormat(e)
  }
}
impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
#[cfg(feature = "std")]
impl From<std::io::Error> for PngError {
  #[inline]
  fn from(e: std::io::Error) -> Self {
    Self::Io(e.kind())
  }
}

impl fmt::Display for PngError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PngError::Format(e) => write!(f, "format error: {e}"),
      PngError::CorruptStream(e) => write!(f, "corrupt stream: {e}"),
      PngError::UnsupportedFormat(e) => write!(f, "unsupported format: {e}"),
      PngError::TooManyColors => write!(f, "more than 256 distinct colors"),
      PngError::IndexOutOfRange { index, palette_len } => {
        write!(f, "index {index} out of range for a palette of {palette_len} entries")
      }
      PngError::InvalidDimensions { width, height } => {
        write!(f, "invalid dimensions {width}x{height}")
      }
      PngError::InvalidPalette => write!(f, "palette has no entries"),
      PngError::PixelBufferLength { expected, actual } => {
        write!(f, "pixel buffer is {actual} bytes, expected {expected}")
      }
      PngError::Alloc => write!(f, "allocation failed"),
      #[cfg(feature = "std")]
      PngError::Io(kind) => write!(f, "io error: {kind}"),
    }
  }
}

impl fmt::Display for FormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FormatError::BadSignature => write!(f, "not a PNG signature"),
      FormatError::TruncatedChunk => write!(f, "truncated chunk"),
      FormatError::CrcMismatch { chunk, declared, actual } => write!(
        f,
        "CRC mismatch in {:?} chunk (declared {declared:08X}, actual {actual:08X})",
        core::str::from_utf8(chunk).unwrap_or("????")
      ),
      FormatError::FirstChunkNotIhdr => write!(f, "first chunk is not IHDR"),
      FormatError::BadHeaderLength(len) => write!(f, "IHDR is {len} bytes, expected 13"),
      FormatError::BadPaletteLength(len) => write!(f, "PLTE of {len} bytes"),
      FormatError::DuplicatePalette => write!(f, "more than one PLTE chunk"),
      FormatError::PaletteAfterImageData => write!(f, "PLTE after IDAT"),
      FormatError::MissingPalette => write!(f, "indexed image without PLTE"),
      FormatError::MissingImageData => write!(f, "no IDAT chunk"),
      FormatError::MissingImageEnd => write!(f, "no IEND chunk"),
    }
  }
}

impl fmt::Display for CorruptStreamError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CorruptStreamError::UnexpectedEndOfInput => write!(f, "unexpected end of input"),
      CorruptStreamError::InvalidBlockType => write!(f, "invalid block type"),
      CorruptStreamError::StoredLengthMismatch => write!(f, "stored block LEN/NLEN mismatch"),
      CorruptStreamError::OversubscribedTree => write!(f, "over-subscribed Huffman tree"),
      CorruptStreamError::IncompleteTree => write!(f, "incomplete Huffman tree"),
      CorruptStreamError::MissingEndOfBlock => write!(f, "no end-of-block code"),
      CorruptStreamError::BadCodeLengthRepeat => write!(f, "bad code length repeat"),
      CorruptStreamError::InvalidSymbol => write!(f, "invalid symbol"),
      CorruptStreamError::DistanceTooFar => write!(f, "back reference distance too far"),
      CorruptStreamError::OutputLimitExceeded => write!(f, "too much output"),
      CorruptStreamError::BadZlibHeader => write!(f, "bad zlib header"),
      CorruptStreamError::AdlerMismatch => write!(f, "Adler-32 mismatch"),
      CorruptStreamError::NotEnoughImageData => write!(f, "not enough image data"),
      CorruptStreamError::IllegalFilterType(t) => write!(f, "illegal filter type {t}"),
    }
  }
}

impl fmt::Display for UnsupportedFormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UnsupportedFormatError::BitDepth(d) => write!(f, "bit depth {d}"),
      UnsupportedFormatError::ColorType(t) => write!(f, "color type {t}"),
      UnsupportedFormatError::CompressionMethod(m) => write!(f, "compression method {m}"),
      UnsupportedFormatError::FilterMethod(m) => write!(f, "filter method {m}"),
      UnsupportedFormatError::Interlaced => write!(f, "interlaced image"),
      UnsupportedFormatError::UnknownCriticalChunk(ty) => write!(
        f,
        "unknown critical chunk {:?}",
        core::str::from_utf8(ty).unwrap_or("????")
      ),
    }
  }
}

#[cfg(feature = "std")]
impl std::error::Error for PngError {}
