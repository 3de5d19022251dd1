use super::*;
use log::trace;

/// Inflates a raw DEFLATE stream, producing at most `limit` bytes.
///
/// On success also gives back whatever input follows the final block (for the
/// zlib trailer).
pub(crate) fn inflate_with_limit(compressed: &[u8], limit: usize) -> PngResult<(Vec<u8>, &[u8])> {
  let mut bits = BitSource::new(compressed);
  let mut out: Vec<u8> = Vec::new();
  // Guess that image data compresses around 4:1, it's only a starting size.
  out.try_reserve(compressed.len().saturating_mul(4).min(limit))?;
  loop {
    let bfinal = bits.get_bfinal()?;
    let btype = bits.get_btype()?;
    trace!("inflate block: bfinal={bfinal}, btype={btype}, out_len={}", out.len());
    match btype {
      0 => inflate_stored(&mut bits, &mut out, limit)?,
      1 => inflate_codes(&mut bits, &mut out, limit, &FIXED_LIT_LEN_DECODER, &FIXED_DIST_DECODER)?,
      2 => {
        let (lit_len, dist) = read_dynamic_trees(&mut bits)?;
        inflate_codes(&mut bits, &mut out, limit, &lit_len, &dist)?
      }
      _ => return Err(CorruptStreamError::InvalidBlockType.into()),
    }
    if bfinal {
      break;
    }
  }
  bits.align_to_byte();
  Ok((out, bits.remaining()))
}

fn push_checked(out: &mut Vec<u8>, bytes: &[u8], limit: usize) -> PngResult<()> {
  if out.len() + bytes.len() > limit {
    return Err(CorruptStreamError::OutputLimitExceeded.into());
  }
  out.try_reserve(bytes.len())?;
  out.extend_from_slice(bytes);
  Ok(())
}

fn inflate_stored(bits: &mut BitSource<'_>, out: &mut Vec<u8>, limit: usize) -> PngResult<()> {
  bits.align_to_byte();
  let (len, nlen) = match *bits.take_bytes(4)? {
    [l0, l1, n0, n1] => (u16::from_le_bytes([l0, l1]), u16::from_le_bytes([n0, n1])),
    _ => return Err(CorruptStreamError::UnexpectedEndOfInput.into()),
  };
  if len != !nlen {
    return Err(CorruptStreamError::StoredLengthMismatch.into());
  }
  push_checked(out, bits.take_bytes(usize::from(len))?, limit)
}

/// Reads the dynamic block header and builds both trees.
fn read_dynamic_trees(
  bits: &mut BitSource<'_>,
) -> PngResult<(HuffmanDecoder<LIT_LEN_COUNT>, HuffmanDecoder<DIST_COUNT>)> {
  let hlit = bits.next_bits(5)? as usize + 257;
  let hdist = bits.next_bits(5)? as usize + 1;
  let hclen = bits.next_bits(4)? as usize + 4;
  if hlit > 286 || hdist > 30 {
    return Err(CorruptStreamError::InvalidSymbol.into());
  }

  let mut code_length_lengths = [0_u8; CODE_LENGTH_COUNT];
  for &i in CODE_LENGTH_ORDER.iter().take(hclen) {
    code_length_lengths[i] = bits.next_bits(3)? as u8;
  }
  let code_length_decoder =
    HuffmanDecoder::<CODE_LENGTH_COUNT>::from_lengths(&code_length_lengths, false)?;

  // Repeats are allowed to run from the literal lengths straight into the
  // distance lengths, so both are read as one list.
  let mut lengths = [0_u8; 286 + 30];
  let total = hlit + hdist;
  let mut acquired = 0_usize;
  while acquired < total {
    let sym = code_length_decoder.decode(bits)?;
    let (value, repeat) = match sym {
      0..=15 => (sym as u8, 1),
      16 => {
        if acquired == 0 {
          return Err(CorruptStreamError::BadCodeLengthRepeat.into());
        }
        (lengths[acquired - 1], 3 + bits.next_bits(2)? as usize)
      }
      17 => (0, 3 + bits.next_bits(3)? as usize),
      18 => (0, 11 + bits.next_bits(7)? as usize),
      _ => return Err(CorruptStreamError::InvalidSymbol.into()),
    };
    if acquired + repeat > total {
      return Err(CorruptStreamError::BadCodeLengthRepeat.into());
    }
    lengths[acquired..acquired + repeat].fill(value);
    acquired += repeat;
  }

  let (lit_len_lengths, dist_lengths) = lengths[..total].split_at(hlit);
  if lit_len_lengths[usize::from(END_OF_BLOCK)] == 0 {
    return Err(CorruptStreamError::MissingEndOfBlock.into());
  }
  let lit_len = HuffmanDecoder::from_lengths(lit_len_lengths, true)?;
  let dist = HuffmanDecoder::from_lengths(dist_lengths, true)?;
  Ok((lit_len, dist))
}

/// Decodes symbols of a fixed or dynamic block until end of block.
fn inflate_codes(
  bits: &mut BitSource<'_>, out: &mut Vec<u8>, limit: usize,
  lit_len: &HuffmanDecoder<LIT_LEN_COUNT>, dist: &HuffmanDecoder<DIST_COUNT>,
) -> PngResult<()> {
  loop {
    let sym = lit_len.decode(bits)?;
    match sym {
      0..=255 => {
        if out.len() >= limit {
          return Err(CorruptStreamError::OutputLimitExceeded.into());
        }
        out.try_reserve(1)?;
        out.push(sym as u8);
      }
      END_OF_BLOCK => return Ok(()),
      257..=285 => {
        let i = usize::from(sym - 257);
        let len = usize::from(LENGTH_BASE[i])
          + bits.next_bits(u32::from(LENGTH_EXTRA[i]))? as usize;
        let dist_sym = usize::from(dist.decode(bits)?);
        if dist_sym >= 30 {
          return Err(CorruptStreamError::InvalidSymbol.into());
        }
        let distance = usize::from(DIST_BASE[dist_sym])
          + bits.next_bits(u32::from(DIST_EXTRA[dist_sym]))? as usize;
        if distance > out.len() {
          return Err(CorruptStreamError::DistanceTooFar.into());
        }
        if out.len() + len > limit {
          return Err(CorruptStreamError::OutputLimitExceeded.into());
        }
        out.try_reserve(len)?;
        // The source can overlap what's being written (a run), so copy one
        // byte at a time.
        let start = out.len() - distance;
        for k in 0..len {
          let b = out[start + k];
          out.push(b);
        }
      }
      _ => return Err(CorruptStreamError::InvalidSymbol.into()),
    }
  }
}

#[test]
fn test_inflate_stored_block() {
  let stream = [0b0000_0001, 3, 0, !3, !0, b'a', b'b', b'c'];
  assert_eq!(inflate_with_limit(&stream, usize::MAX).unwrap().0, b"abc");
}

#[test]
fn test_inflate_rejects_reserved_block_type() {
  let stream = [0b0000_0111];
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::InvalidBlockType)
  );
}

#[test]
fn test_inflate_stored_length_mismatch() {
  let stream = [0b0000_0001, 3, 0, 3, 0, b'a', b'b', b'c'];
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::StoredLengthMismatch)
  );
}

#[test]
fn test_inflate_fixed_block_with_back_ref() {
  // "abcabcabc" as literals a, b, c then a (len 6, dist 3) reference.
  let codes = TreeEntry::codes_for_writing(&FIXED_LIT_LEN_LENGTHS).unwrap();
  let dist_codes = TreeEntry::codes_for_writing(&FIXED_DIST_LENGTHS).unwrap();
  let mut sink = BitSink::default();
  sink.put_bits(1, 1);
  sink.put_bits(1, 2);
  for &b in b"abc" {
    sink.put_code(codes[usize::from(b)]);
  }
  let (len_sym, len_extra) = length_to_symbol(6);
  sink.put_code(codes[usize::from(len_sym)]);
  sink.put_bits(u32::from(len_extra), u32::from(LENGTH_EXTRA[usize::from(len_sym - 257)]));
  let (dist_sym, dist_extra) = dist_to_symbol(3);
  sink.put_code(dist_codes[usize::from(dist_sym)]);
  sink.put_bits(u32::from(dist_extra), u32::from(DIST_EXTRA[usize::from(dist_sym)]));
  sink.put_code(codes[256]);
  let stream = sink.finish();
  assert_eq!(inflate_with_limit(&stream, usize::MAX).unwrap().0, b"abcabcabc");
  assert_eq!(
    inflate_with_limit(&stream, 8).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::OutputLimitExceeded)
  );
}

#[test]
fn test_inflate_distance_too_far() {
  let codes = TreeEntry::codes_for_writing(&FIXED_LIT_LEN_LENGTHS).unwrap();
  let dist_codes = TreeEntry::codes_for_writing(&FIXED_DIST_LENGTHS).unwrap();
  let mut sink = BitSink::default();
  sink.put_bits(1, 1);
  sink.put_bits(1, 2);
  sink.put_code(codes[usize::from(b'z')]);
  sink.put_code(codes[257]);
  sink.put_code(dist_codes[1]);
  sink.put_code(codes[256]);
  let stream = sink.finish();
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::DistanceTooFar)
  );
}

#[test]
fn test_inflate_truncated() {
  let stream = [0b0000_0001, 3, 0, !3, !0, b'a'];
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::UnexpectedEndOfInput)
  );
  assert!(inflate_with_limit(&[], usize::MAX).is_err());
}

#[test]
fn test_inflate_stored_header_cut_short() {
  // LEN is there, NLEN is missing its second byte
  let stream = [0b0000_0001, 3, 0, !3];
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::UnexpectedEndOfInput)
  );
}

/// Starts a final dynamic block with the given code length code lengths,
/// giving back the sink and the codes to write code length symbols with.
#[cfg(test)]
fn dynamic_block_start(
  hlit: u32, hdist: u32, code_length_lengths: &[u8; CODE_LENGTH_COUNT],
) -> (BitSink, Vec<TreeEntry>) {
  let mut sink = BitSink::default();
  sink.put_bits(1, 1);
  sink.put_bits(2, 2);
  sink.put_bits(hlit - 257, 5);
  sink.put_bits(hdist - 1, 5);
  let hclen =
    CODE_LENGTH_ORDER.iter().rposition(|&i| code_length_lengths[i] != 0).map_or(0, |p| p + 1).max(4);
  sink.put_bits(hclen as u32 - 4, 4);
  for &i in CODE_LENGTH_ORDER.iter().take(hclen) {
    sink.put_bits(u32::from(code_length_lengths[i]), 3);
  }
  let codes = TreeEntry::codes_for_writing(code_length_lengths).unwrap();
  (sink, codes)
}

#[test]
fn test_inflate_dynamic_repeat_with_nothing_before() {
  let mut cl = [0_u8; CODE_LENGTH_COUNT];
  cl[16] = 1;
  cl[17] = 1;
  let (mut sink, codes) = dynamic_block_start(257, 1, &cl);
  sink.put_code(codes[16]);
  sink.put_bits(0, 2);
  let stream = sink.finish();
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::BadCodeLengthRepeat)
  );
}

#[test]
fn test_inflate_dynamic_repeat_past_the_end() {
  let mut cl = [0_u8; CODE_LENGTH_COUNT];
  cl[0] = 1;
  cl[18] = 1;
  let (mut sink, codes) = dynamic_block_start(257, 1, &cl);
  // 138 + 138 zeros, only 258 lengths wanted
  sink.put_code(codes[18]);
  sink.put_bits(127, 7);
  sink.put_code(codes[18]);
  sink.put_bits(127, 7);
  let stream = sink.finish();
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::BadCodeLengthRepeat)
  );
}

#[test]
fn test_inflate_dynamic_without_end_of_block() {
  let mut cl = [0_u8; CODE_LENGTH_COUNT];
  cl[0] = 1;
  cl[18] = 1;
  let (mut sink, codes) = dynamic_block_start(257, 1, &cl);
  // 138 + 120 zeros covers every length, symbol 256 included
  sink.put_code(codes[18]);
  sink.put_bits(127, 7);
  sink.put_code(codes[18]);
  sink.put_bits(109, 7);
  let stream = sink.finish();
  assert_eq!(
    inflate_with_limit(&stream, usize::MAX).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::MissingEndOfBlock)
  );
}

#[test]
fn test_inflate_dynamic_too_many_lengths() {
  let mut sink = BitSink::default();
  sink.put_bits(1, 1);
  sink.put_bits(2, 2);
  sink.put_bits(287 - 257, 5);
  sink.put_bits(0, 5);
  sink.put_bits(0, 4);
  let mut stream = sink.finish();
  stream.extend_from_slice(&[0; 8]);
  assert_eq!(inflate(&stream).unwrap_err(), PngError::CorruptStream(CorruptStreamError::InvalidSymbol));

  // HDIST past 30 too
  let mut sink = BitSink::default();
  sink.put_bits(1, 1);
  sink.put_bits(2, 2);
  sink.put_bits(0, 5);
  sink.put_bits(31 - 1, 5);
  sink.put_bits(0, 4);
  let mut stream = sink.finish();
  stream.extend_from_slice(&[0; 8]);
  assert_eq!(inflate(&stream).unwrap_err(), PngError::CorruptStream(CorruptStreamError::InvalidSymbol));
}
