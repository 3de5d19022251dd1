const MOD_ADLER: u32 = 65521;

/// Largest number of bytes that can be summed before `b` could overflow a
/// `u32` and must be reduced.
const NMAX: usize = 5552;

/// Computes the Adler-32 checksum that trails a zlib stream.
#[must_use]
pub fn adler32(bytes: &[u8]) -> u32 {
  let mut a: u32 = 1;
  let mut b: u32 = 0;
  for block in bytes.chunks(NMAX) {
    for &byte in block {
      a += u32::from(byte);
      b += a;
    }
    a %= MOD_ADLER;
    b %= MOD_ADLER;
  }
  (b << 16) | a
}

#[test]
fn test_adler32() {
  assert_eq!(adler32(b""), 1);
  assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
  // long enough to need the deferred reduction more than once.
  let big = alloc::vec![0xFF_u8; 100_000];
  let mut a = 1_u64;
  let mut b = 0_u64;
  for &x in big.iter() {
    a = (a + u64::from(x)) % 65521;
    b = (b + a) % 65521;
  }
  assert_eq!(adler32(&big), ((b << 16) | a) as u32);
}
