use super::*;

/// One canonical Huffman code.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TreeEntry {
  pub(crate) bit_pattern: u16,
  pub(crate) bit_count: u16,
}
impl core::fmt::Debug for TreeEntry {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    if f.alternate() || self.bit_count == 0 {
      write!(
        f,
        "TreeEntry {{ bit_pattern: {}, bit_count: {}, }}",
        self.bit_pattern, self.bit_count
      )
    } else {
      write!(f, "TE {{ \"{:0width$b}\" }}", self.bit_pattern, width = usize::from(self.bit_count))
    }
  }
}

impl TreeEntry {
  /// Given a list of filled in `bit_counts`, computes the `bit_patterns`.
  ///
  /// * `bit_count` must be 15 or less.
  /// * `bit_count` 0 means that the TreeEntry doesn't participate in
  ///   `bit_pattern` generation at all.
  pub(crate) fn fill_in_the_codes(tree: &mut [TreeEntry]) -> PngResult<()> {
    let max_bits = usize::from(tree.iter().map(|te| te.bit_count).max().unwrap_or(0));
    if max_bits > 15 {
      return Err(CorruptStreamError::OversubscribedTree.into());
    }

    // 1) Count the number of codes for each code length.
    let mut bl_count = [0_u16; 16];
    for te in tree.iter() {
      bl_count[usize::from(te.bit_count)] += 1;
    }

    // 2) Find the numerical value of the smallest code for each code length.
    let mut next_code = [0_u32; 16];
    let mut code = 0_u32;
    bl_count[0] = 0;
    for bits in 1..=max_bits {
      code = (code + u32::from(bl_count[bits - 1])) << 1;
      next_code[bits] = code;
    }

    // 3) Consecutive values for all codes of the same length, starting from
    //    the base values of step 2. Unused codes get no value.
    for te in tree.iter_mut() {
      let len = usize::from(te.bit_count);
      if len != 0 {
        if next_code[len] >> len == 0 {
          te.bit_pattern = next_code[len] as u16;
          next_code[len] += 1;
        } else {
          return Err(CorruptStreamError::OversubscribedTree.into());
        }
      }
    }

    Ok(())
  }

  /// Canonical codes ready for a [`BitSink`]: the patterns come back
  /// bit-reversed, because Huffman codes go out most significant bit first
  /// while everything else goes out least significant bit first.
  pub(crate) fn codes_for_writing(lengths: &[u8]) -> PngResult<Vec<TreeEntry>> {
    let mut tree: Vec<TreeEntry> =
      lengths.iter().map(|&l| TreeEntry { bit_pattern: 0, bit_count: u16::from(l) }).collect();
    Self::fill_in_the_codes(&mut tree)?;
    for te in tree.iter_mut() {
      if te.bit_count > 0 {
        te.bit_pattern = te.bit_pattern.reverse_bits() >> (16 - te.bit_count);
      }
    }
    Ok(tree)
  }
}

#[test]
fn test_fill_in_the_codes() {
  // the small example in RFC 1951.
  let mut test_tree = [
    TreeEntry { bit_count: 2, bit_pattern: 0 },
    TreeEntry { bit_count: 1, bit_pattern: 0 },
    TreeEntry { bit_count: 3, bit_pattern: 0 },
    TreeEntry { bit_count: 3, bit_pattern: 0 },
  ];
  TreeEntry::fill_in_the_codes(&mut test_tree).unwrap();
  let expected_tree = [
    TreeEntry { bit_count: 2, bit_pattern: 0b10 },
    TreeEntry { bit_count: 1, bit_pattern: 0b0 },
    TreeEntry { bit_count: 3, bit_pattern: 0b110 },
    TreeEntry { bit_count: 3, bit_pattern: 0b111 },
  ];
  assert_eq!(test_tree, expected_tree);

  // the bigger example in RFC 1951.
  let mut test_tree = [
    TreeEntry { bit_count: 3, bit_pattern: 0 },
    TreeEntry { bit_count: 3, bit_pattern: 0 },
    TreeEntry { bit_count: 3, bit_pattern: 0 },
    TreeEntry { bit_count: 3, bit_pattern: 0 },
    TreeEntry { bit_count: 3, bit_pattern: 0 },
    TreeEntry { bit_count: 2, bit_pattern: 0 },
    TreeEntry { bit_count: 4, bit_pattern: 0 },
    TreeEntry { bit_count: 4, bit_pattern: 0 },
  ];
  TreeEntry::fill_in_the_codes(&mut test_tree).unwrap();
  let expected_tree = [
    TreeEntry { bit_count: 3, bit_pattern: 0b010 },
    TreeEntry { bit_count: 3, bit_pattern: 0b011 },
    TreeEntry { bit_count: 3, bit_pattern: 0b100 },
    TreeEntry { bit_count: 3, bit_pattern: 0b101 },
    TreeEntry { bit_count: 3, bit_pattern: 0b110 },
    TreeEntry { bit_count: 2, bit_pattern: 0b00 },
    TreeEntry { bit_count: 4, bit_pattern: 0b1110 },
    TreeEntry { bit_count: 4, bit_pattern: 0b1111 },
  ];
  assert_eq!(test_tree, expected_tree);

  /* Table from the "compressed with fixed huffman codes"

      Lit Value     Bits    Codes
      ---------     ----    ----
      0 - 143       8       00110000 through
                            10111111
      144 - 255     9       110010000 through
                            111111111
      256 - 279     7       0000000 through
                            0010111
      280 - 287     8       11000000 through
                            11000111
  */
  let mut v: Vec<TreeEntry> = FIXED_LIT_LEN_LENGTHS
    .iter()
    .map(|&l| TreeEntry { bit_count: u16::from(l), bit_pattern: 0 })
    .collect();
  TreeEntry::fill_in_the_codes(&mut v).unwrap();
  //
  assert_eq!(v[0].bit_pattern, 0b00110000);
  assert_eq!(v[143].bit_pattern, 0b10111111);
  //
  assert_eq!(v[144].bit_pattern, 0b110010000);
  assert_eq!(v[255].bit_pattern, 0b111111111);
  //
  assert_eq!(v[256].bit_pattern, 0b0000000);
  assert_eq!(v[279].bit_pattern, 0b0010111);
  //
  assert_eq!(v[280].bit_pattern, 0b11000000);
  assert_eq!(v[287].bit_pattern, 0b11000111);
}

#[test]
fn test_codes_for_writing_are_reversed() {
  let codes = TreeEntry::codes_for_writing(&[2, 1, 3, 3]).unwrap();
  assert_eq!(codes[0], TreeEntry { bit_count: 2, bit_pattern: 0b01 });
  assert_eq!(codes[1], TreeEntry { bit_count: 1, bit_pattern: 0b0 });
  assert_eq!(codes[2], TreeEntry { bit_count: 3, bit_pattern: 0b011 });
  assert_eq!(codes[3], TreeEntry { bit_count: 3, bit_pattern: 0b111 });
}

#[test]
fn test_oversubscribed_is_rejected() {
  let mut tree = [TreeEntry { bit_count: 1, bit_pattern: 0 }; 3];
  assert!(TreeEntry::fill_in_the_codes(&mut tree).is_err());
}

#[test]
fn test_codes_for_writing_oversubscribed() {
  let err = PngError::CorruptStream(CorruptStreamError::OversubscribedTree);
  assert_eq!(TreeEntry::codes_for_writing(&[1, 1, 1]).unwrap_err(), err);
  assert_eq!(TreeEntry::codes_for_writing(&[16, 1]).unwrap_err(), err);

  // one code of each length up to 15 plus a second 15 is exactly complete,
  // the last 15 bit code lands on 0x7FFF
  let mut lengths: Vec<u8> = (1..=15).collect();
  lengths.push(15);
  let codes = TreeEntry::codes_for_writing(&lengths).unwrap();
  assert_eq!(codes[15], TreeEntry { bit_count: 15, bit_pattern: 0x7FFF });
  // and one more overflows the 15 bit space
  lengths.push(15);
  assert_eq!(TreeEntry::codes_for_writing(&lengths).unwrap_err(), err);
}
