//! Splitting PNG bytes into chunks, and writing chunks back out.

use super::*;

/// A PNG chunk type tag, such as `IHDR`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngChunkTy(pub [u8; 4]);
#[allow(nonstandard_style)]
#[allow(missing_docs)]
impl PngChunkTy {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
}
impl PngChunkTy {
  /// Critical chunks have an uppercase first letter (bit 5 clear). A decoder
  /// that doesn't understand a critical chunk can't show the image.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & (1 << 5)) == 0
  }
}
impl core::fmt::Debug for PngChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Debug::fmt(core::str::from_utf8(self.0.as_slice()).unwrap_or("?"), f)
  }
}
impl core::fmt::Display for PngChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for &b in self.0.iter() {
      core::fmt::Write::write_char(f, if b.is_ascii_graphic() { b as char } else { '?' })?;
    }
    Ok(())
  }
}

/// One chunk: a type tag, its data, and the CRC it carries.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PngChunk<'b> {
  pub(crate) ty: PngChunkTy,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl core::fmt::Debug for PngChunk<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl<'b> PngChunk<'b> {
  /// A new chunk with the correct CRC for its contents.
  #[inline]
  #[must_use]
  pub fn new(ty: PngChunkTy, data: &'b [u8]) -> Self {
    Self { ty, data, declared_crc: crc32::chunk_crc(ty.0, data) }
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn ty(&self) -> PngChunkTy {
    self.ty
  }
  #[inline]
  #[must_use]
  #[allow(missing_docs)]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }
  /// The CRC that was stored in the chunk.
  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }
  /// The CRC computed from the chunk's type and data.
  #[inline]
  #[must_use]
  pub fn compute_actual_crc(&self) -> u32 {
    crc32::chunk_crc(self.ty.0, self.data)
  }
  /// Errors with [`FormatError::CrcMismatch`] if the CRCs disagree.
  pub fn check_crc(&self) -> PngResult<()> {
    let actual = self.compute_actual_crc();
    if actual == self.declared_crc {
      Ok(())
    } else {
      Err(FormatError::CrcMismatch { chunk: self.ty.0, declared: self.declared_crc, actual }.into())
    }
  }
}

/// Walks the chunks of a PNG.
///
/// Each chunk is only framed, the CRC is not checked. The iterator ends after
/// an `IEND` chunk, or when the input runs out exactly at a chunk boundary.
/// Input that ends partway through a chunk gives one
/// [`FormatError::TruncatedChunk`] and then ends.
#[derive(Debug, Clone)]
pub struct PngChunkIter<'b> {
  spare: &'b [u8],
  done: bool,
}
impl<'b> PngChunkIter<'b> {
  /// Starts after the signature, which must be present.
  pub fn from_png_bytes(bytes: &'b [u8]) -> PngResult<Self> {
    match bytes {
      [137, 80, 78, 71, 13, 10, 26, 10, rest @ ..] => Ok(Self::from_chunk_bytes(rest)),
      _ => Err(FormatError::BadSignature.into()),
    }
  }
  /// Starts on bytes that have no signature in front.
  #[inline]
  #[must_use]
  pub const fn from_chunk_bytes(spare: &'b [u8]) -> Self {
    Self { spare, done: false }
  }
}
impl<'b> Iterator for PngChunkIter<'b> {
  type Item = PngResult<PngChunk<'b>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done || self.spare.is_empty() {
      return None;
    }
    let (len, ty, rest) = match self.spare {
      [l0, l1, l2, l3, t0, t1, t2, t3, rest @ ..] => {
        (u32::from_be_bytes([*l0, *l1, *l2, *l3]) as usize, PngChunkTy([*t0, *t1, *t2, *t3]), rest)
      }
      _ => {
        self.done = true;
        return Some(Err(FormatError::TruncatedChunk.into()));
      }
    };
    // data plus the 4 byte CRC
    if rest.len() < len || rest.len() - len < 4 {
      self.done = true;
      return Some(Err(FormatError::TruncatedChunk.into()));
    }
    let (data, rest) = rest.split_at(len);
    let (crc_bytes, rest) = rest.split_at(4);
    let declared_crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    self.spare = rest;
    if ty == PngChunkTy::IEND {
      self.done = true;
    }
    Some(Ok(PngChunk { ty, data, declared_crc }))
  }
}
impl core::iter::FusedIterator for PngChunkIter<'_> {}

/// Splits PNG bytes into chunks, checking the signature and every CRC.
///
/// Stops at `IEND` or at the end of input.
///
/// ## Failure
/// * [`FormatError`] on a bad signature, truncated chunk, or CRC mismatch.
#[inline]
pub fn parse_chunks(bytes: &[u8]) -> PngResult<Vec<PngChunk<'_>>> {
  parse_chunks_with(bytes, true)
}

/// As [`parse_chunks`], with the CRC check optional.
pub fn parse_chunks_with(bytes: &[u8], confirm_crc: bool) -> PngResult<Vec<PngChunk<'_>>> {
  let mut out = Vec::new();
  for chunk in PngChunkIter::from_png_bytes(bytes)? {
    let chunk = chunk?;
    if confirm_crc {
      chunk.check_crc()?;
    }
    out.try_reserve(1)?;
    out.push(chunk);
  }
  Ok(out)
}

/// Appends one framed chunk: length, type, data, CRC.
pub(crate) fn write_chunk(out: &mut Vec<u8>, ty: PngChunkTy, data: &[u8]) {
  debug_assert!(data.len() <= i32::MAX as usize);
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(&ty.0);
  out.extend_from_slice(data);
  out.extend_from_slice(&crc32::chunk_crc(ty.0, data).to_be_bytes());
}

/// Writes the signature and then each chunk in order, with freshly computed
/// CRCs. An `IEND` is added if the list doesn't already end with one.
#[must_use]
pub fn serialize_chunks(chunks: &[PngChunk<'_>]) -> Vec<u8> {
  let body: usize = chunks.iter().map(|c| c.data.len() + 12).sum();
  let mut out = Vec::with_capacity(PNG_SIGNATURE.len() + body + 12);
  out.extend_from_slice(&PNG_SIGNATURE);
  for chunk in chunks {
    write_chunk(&mut out, chunk.ty, chunk.data);
  }
  if chunks.last().map(|c| c.ty) != Some(PngChunkTy::IEND) {
    write_chunk(&mut out, PngChunkTy::IEND, &[]);
  }
  out
}

#[test]
fn test_serialize_then_parse() {
  let data = [1, 2, 3, 4, 5];
  let bytes = serialize_chunks(&[PngChunk::new(PngChunkTy(*b"abCd"), &data)]);
  assert_eq!(&bytes[..8], &PNG_SIGNATURE);
  let chunks = parse_chunks(&bytes).unwrap();
  assert_eq!(chunks.len(), 2);
  assert_eq!(chunks[0].ty(), PngChunkTy(*b"abCd"));
  assert_eq!(chunks[0].data(), &data);
  assert_eq!(chunks[1].ty(), PngChunkTy::IEND);
  assert_eq!(chunks[1].declared_crc(), 0xAE42_6082);
}

#[test]
fn test_parse_errors() {
  assert_eq!(parse_chunks(b"not a png").unwrap_err(), PngError::Format(FormatError::BadSignature));

  let bytes = serialize_chunks(&[PngChunk::new(PngChunkTy::IDAT, &[9; 20])]);
  assert_eq!(
    parse_chunks(&bytes[..bytes.len() - 14]).unwrap_err(),
    PngError::Format(FormatError::TruncatedChunk)
  );

  let mut bad = bytes.clone();
  bad[8 + 8 + 3] ^= 0b100;
  assert!(matches!(
    parse_chunks(&bad).unwrap_err(),
    PngError::Format(FormatError::CrcMismatch { chunk: [b'I', b'D', b'A', b'T'], .. })
  ));
  assert!(parse_chunks_with(&bad, false).is_ok());
}

#[test]
fn test_parse_stops_at_iend() {
  let mut bytes = serialize_chunks(&[]);
  bytes.extend_from_slice(b"trailing garbage");
  let chunks = parse_chunks(&bytes).unwrap();
  assert_eq!(chunks.len(), 1);
  // and with no IEND, the end of input is a fine place to stop
  let bytes = serialize_chunks(&[PngChunk::new(PngChunkTy::IDAT, &[])]);
  assert_eq!(parse_chunks(&bytes[..bytes.len() - 12]).unwrap().len(), 1);
}

#[test]
fn test_chunk_ty_criticality() {
  assert!(PngChunkTy::IHDR.is_critical());
  assert!(!PngChunkTy::tRNS.is_critical());
  assert_eq!(alloc::format!("{}", PngChunkTy::PLTE), "PLTE");
}
