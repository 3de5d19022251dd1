/// One LZ77 output token: a literal byte, or a back reference.
///
/// Back references pack the length in the high half and the distance in the
/// low half, so a whole block of tokens stays at four bytes each.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct HuffSymbol(u32);

impl core::fmt::Debug for HuffSymbol {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self.get_literal() {
      Some(lit) => write!(f, "Lit({lit})"),
      None => {
        let (len, dist) = self.get_back_ref();
        write!(f, "Ref({len}, {dist})")
      }
    }
  }
}

#[test]
fn test_size_of_huff_symbol() {
  use core::mem::size_of;
  assert_eq!(size_of::<HuffSymbol>(), size_of::<u32>());
}

impl HuffSymbol {
  #[inline]
  pub(crate) const fn literal(lit: u8) -> Self {
    HuffSymbol(lit as u32)
  }
  #[inline]
  pub(crate) const fn get_literal(self) -> Option<u8> {
    if self.0 < 256 {
      Some(self.0 as u8)
    } else {
      None
    }
  }
  //
  #[inline]
  pub(crate) fn back_ref(len: usize, dist: usize) -> Self {
    debug_assert!(len >= 3);
    debug_assert!(len <= 258);
    debug_assert!(dist >= 1);
    debug_assert!(dist <= 32_768);
    HuffSymbol((len as u32) << 16 | dist as u32)
  }
  /// `(length, distance)`
  #[inline]
  pub(crate) const fn get_back_ref(self) -> (u16, u16) {
    ((self.0 >> 16) as u16, (self.0 & 0xFFFF) as u16)
  }
}

#[test]
fn test_huff_symbol_packing() {
  assert_eq!(HuffSymbol::literal(7).get_literal(), Some(7));
  let r = HuffSymbol::back_ref(258, 32_768);
  assert_eq!(r.get_literal(), None);
  assert_eq!(r.get_back_ref(), (258, 32_768));
}
