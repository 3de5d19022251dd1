//! The zlib container: a two byte header, a DEFLATE stream, and an Adler-32
//! of the uncompressed data.

use super::*;
use log::debug;

/// `CM = 8` (deflate) with `CINFO = 7` (32 KiB window).
const CMF: u8 = 0x78;

/// Wraps a DEFLATE stream of `raw` in a zlib header and trailer.
#[must_use]
pub fn compress(raw: &[u8], level: CompressionLevel) -> Vec<u8> {
  let flevel: u8 = match level.get() {
    0..=1 => 0,
    2..=5 => 1,
    6 => 2,
    _ => 3,
  };
  let mut flg = flevel << 6;
  flg += 31 - ((u16::from(CMF) << 8 | u16::from(flg)) % 31) as u8;
  debug_assert_eq!((u16::from(CMF) << 8 | u16::from(flg)) % 31, 0);

  let body = super::deflate(raw, level);
  let mut out = Vec::with_capacity(2 + body.len() + 4);
  out.push(CMF);
  out.push(flg);
  out.extend_from_slice(&body);
  out.extend_from_slice(&adler32(raw).to_be_bytes());
  debug!("zlib compress: {} bytes in, {} bytes out, level {}", raw.len(), out.len(), level.get());
  out
}

/// Unwraps and inflates a zlib stream.
///
/// * `limit` is the most output allowed, more than that is an error.
/// * `confirm_adler` checks the trailer against the output.
pub fn decompress(stream: &[u8], limit: usize, confirm_adler: bool) -> PngResult<Vec<u8>> {
  let (cmf, flg, body) = match stream {
    [cmf, flg, body @ ..] => (*cmf, *flg, body),
    _ => return Err(CorruptStreamError::UnexpectedEndOfInput.into()),
  };
  let cm = cmf & 0b1111;
  let cinfo = cmf >> 4;
  let has_dict = (flg & 0b10_0000) != 0;
  if cm != 8 || cinfo > 7 || (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 || has_dict {
    return Err(CorruptStreamError::BadZlibHeader.into());
  }
  let (out, trailer) = inflate::inflate_with_limit(body, limit)?;
  if confirm_adler {
    let declared = match trailer {
      [a, b, c, d, ..] => u32::from_be_bytes([*a, *b, *c, *d]),
      _ => return Err(CorruptStreamError::UnexpectedEndOfInput.into()),
    };
    if declared != adler32(&out) {
      return Err(CorruptStreamError::AdlerMismatch.into());
    }
  }
  Ok(out)
}

#[test]
fn test_zlib_header_is_valid_at_every_level() {
  for level in 0..=9 {
    let z = compress(b"hello hello hello", CompressionLevel::new(level));
    assert_eq!(z[0], 0x78);
    assert_eq!((u16::from(z[0]) << 8 | u16::from(z[1])) % 31, 0);
    assert_eq!(decompress(&z, usize::MAX, true).unwrap(), b"hello hello hello");
  }
}

#[test]
fn test_zlib_rejects_bad_header_and_trailer() {
  let mut z = compress(b"some bytes", CompressionLevel::DEFAULT);
  let last = z.len() - 1;
  z[last] ^= 1;
  assert_eq!(
    decompress(&z, usize::MAX, true).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::AdlerMismatch)
  );
  assert_eq!(decompress(&z, usize::MAX, false).unwrap(), b"some bytes");
  z[0] = 0x79;
  assert_eq!(
    decompress(&z, usize::MAX, false).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::BadZlibHeader)
  );
}
