//! The CRC-32 used by PNG chunks (reflected polynomial `0xEDB88320`).

const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

/// Feeds more bytes into a running (pre-conditioned) CRC register.
#[inline]
fn update_crc(mut crc: u32, bytes: &[u8]) -> u32 {
  for &byte in bytes {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc
}

/// Computes the CRC-32 of the bytes given.
#[inline]
#[must_use]
pub fn compute(bytes: &[u8]) -> u32 {
  update_crc(u32::MAX, bytes) ^ u32::MAX
}

/// Checks the bytes against an expected CRC-32.
#[inline]
#[must_use]
pub fn verify(bytes: &[u8], expected: u32) -> bool {
  compute(bytes) == expected
}

/// The CRC of a chunk, which covers the type tag and then the data.
#[inline]
#[must_use]
pub fn chunk_crc(chunk_ty: [u8; 4], data: &[u8]) -> u32 {
  update_crc(update_crc(u32::MAX, &chunk_ty), data) ^ u32::MAX
}

#[test]
fn test_crc_known_values() {
  assert_eq!(compute(b""), 0);
  assert_eq!(compute(b"123456789"), 0xCBF4_3926);
  // an empty IEND chunk always carries the same CRC.
  assert_eq!(chunk_crc(*b"IEND", &[]), 0xAE42_6082);
  assert!(verify(b"IEND", 0xAE42_6082));
  assert!(!verify(b"IEND", 0xAE42_6083));
}

#[test]
fn test_chunk_crc_matches_concatenation() {
  let data = [0, 0, 0, 2, 0, 0, 0, 2, 8, 6, 0, 0, 0];
  let mut joined = alloc::vec::Vec::new();
  joined.extend_from_slice(b"IHDR");
  joined.extend_from_slice(&data);
  assert_eq!(chunk_crc(*b"IHDR", &data), compute(&joined));
}
