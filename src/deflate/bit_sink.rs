use super::*;

/// Writes a DEFLATE bit stream, least significant bit of each byte first.
#[derive(Debug, Default)]
pub(crate) struct BitSink {
  out: Vec<u8>,
  bit_buffer: u64,
  bit_count: u32,
}

impl BitSink {
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self { out: Vec::with_capacity(capacity), bit_buffer: 0, bit_count: 0 }
  }

  /// Appends the low `count` bits of `value`.
  pub(crate) fn put_bits(&mut self, value: u32, count: u32) {
    debug_assert!(count <= 32);
    debug_assert!(count == 32 || value >> count == 0);
    self.bit_buffer |= u64::from(value) << self.bit_count;
    self.bit_count += count;
    while self.bit_count >= 8 {
      self.out.push(self.bit_buffer as u8);
      self.bit_buffer >>= 8;
      self.bit_count -= 8;
    }
  }

  /// Appends a Huffman code. Codes are stored most significant bit first, so
  /// the entry keeps its pattern already reversed.
  #[inline]
  pub(crate) fn put_code(&mut self, te: TreeEntry) {
    self.put_bits(u32::from(te.bit_pattern), u32::from(te.bit_count));
  }

  /// Zero pads up to the next byte boundary.
  pub(crate) fn flush_to_byte(&mut self) {
    if self.bit_count > 0 {
      self.out.push(self.bit_buffer as u8);
      self.bit_buffer = 0;
      self.bit_count = 0;
    }
  }

  /// Appends whole bytes. Only valid on a byte boundary.
  pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
    debug_assert_eq!(self.bit_count, 0);
    self.out.extend_from_slice(bytes);
  }

  /// How many bits are needed to reach the next byte boundary.
  #[inline]
  pub(crate) const fn bits_to_byte_boundary(&self) -> u32 {
    (8 - self.bit_count) % 8
  }

  pub(crate) fn finish(mut self) -> Vec<u8> {
    self.flush_to_byte();
    self.out
  }
}

#[test]
fn test_bit_sink_packs_lsb_first() {
  let mut sink = BitSink::default();
  sink.put_bits(1, 1);
  sink.put_bits(0b10, 2);
  sink.put_bits(0b10101, 5);
  sink.put_bits(0b011, 3);
  assert_eq!(sink.bits_to_byte_boundary(), 5);
  assert_eq!(sink.finish(), alloc::vec![0b1010_1101, 0b0000_0011]);
}
