use super::*;

/// Reads a DEFLATE bit stream.
///
/// Bits are packed starting from the least significant bit of each byte.
/// Between calls there are always fewer than 8 spare bits held, so aligning
/// to a byte boundary just drops them.
pub(crate) struct BitSource<'b> {
  current: &'b [u8],
  spare_bits: u32,
  spare_bit_count: u32,
}

impl<'b> core::fmt::Debug for BitSource<'b> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("BitSource")
      .field("bytes_left", &self.current.len())
      .field("spare_bits", &self.spare_bits)
      .field("spare_bit_count", &self.spare_bit_count)
      .finish()
  }
}

impl<'b> BitSource<'b> {
  pub(crate) const fn new(current: &'b [u8]) -> Self {
    Self { current, spare_bits: 0, spare_bit_count: 0 }
  }

  fn grab_byte(&mut self) -> PngResult<u8> {
    match self.current {
      [n, rest @ ..] => {
        self.current = rest;
        Ok(*n)
      }
      [] => Err(CorruptStreamError::UnexpectedEndOfInput.into()),
    }
  }

  fn feed(&mut self, count_after: u32) -> PngResult<()> {
    debug_assert!(count_after <= 24);
    while count_after > self.spare_bit_count {
      let new_byte = u32::from(self.grab_byte()?);
      self.spare_bits |= new_byte << self.spare_bit_count;
      self.spare_bit_count += 8;
    }
    Ok(())
  }

  /// Takes `count` bits (up to 16), first bit read ends up in bit 0.
  pub(crate) fn next_bits(&mut self, count: u32) -> PngResult<u32> {
    debug_assert!(count <= 16);
    if count == 0 {
      return Ok(0);
    }
    if self.spare_bit_count < count {
      self.feed(count)?;
    }
    let out = self.spare_bits & ((1 << count) - 1);
    self.spare_bits >>= count;
    self.spare_bit_count -= count;
    Ok(out)
  }

  #[inline]
  pub(crate) fn next_one_bit(&mut self) -> PngResult<u32> {
    self.next_bits(1)
  }

  pub(crate) fn get_bfinal(&mut self) -> PngResult<bool> {
    Ok(self.next_one_bit()? != 0)
  }

  pub(crate) fn get_btype(&mut self) -> PngResult<u32> {
    self.next_bits(2)
  }

  /// Discards the partial byte, if any.
  pub(crate) fn align_to_byte(&mut self) {
    debug_assert!(self.spare_bit_count < 8);
    self.spare_bits = 0;
    self.spare_bit_count = 0;
  }

  /// Takes whole bytes directly. Only valid after [`align_to_byte`](Self::align_to_byte).
  pub(crate) fn take_bytes(&mut self, count: usize) -> PngResult<&'b [u8]> {
    debug_assert_eq!(self.spare_bit_count, 0);
    if count > self.current.len() {
      return Err(CorruptStreamError::UnexpectedEndOfInput.into());
    }
    let (out, rest) = self.current.split_at(count);
    self.current = rest;
    Ok(out)
  }

  /// Bytes not yet touched by the reader.
  pub(crate) fn remaining(&self) -> &'b [u8] {
    self.current
  }
}

#[test]
fn test_bit_source_lsb_first() {
  let bytes = [0b1010_1101, 0b0000_0011];
  let mut bs = BitSource::new(&bytes);
  assert_eq!(bs.get_bfinal().unwrap(), true);
  assert_eq!(bs.get_btype().unwrap(), 0b10);
  assert_eq!(bs.next_bits(5).unwrap(), 0b10101);
  assert_eq!(bs.next_bits(3).unwrap(), 0b011);
  bs.align_to_byte();
  assert!(bs.take_bytes(1).is_err());
  assert!(bs.remaining().is_empty());
}

#[test]
fn test_bit_source_stored_bytes() {
  let bytes = [0b0000_0001, 0xAA, 0xBB];
  let mut bs = BitSource::new(&bytes);
  assert_eq!(bs.next_bits(3).unwrap(), 1);
  bs.align_to_byte();
  assert_eq!(bs.take_bytes(2).unwrap(), &[0xAA, 0xBB]);
  assert_eq!(bs.next_bits(1), Err(PngError::CorruptStream(CorruptStreamError::UnexpectedEndOfInput)));
}
