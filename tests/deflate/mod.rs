use pngcore::{deflate::*, *};

fn sample_inputs() -> Vec<Vec<u8>> {
  let text = b"It was the best of times, it was the worst of times, it was the age of \
  wisdom, it was the age of foolishness, it was the epoch of belief, it was the epoch \
  of incredulity."
    .repeat(40);
  let mut stairs = Vec::new();
  for i in 0..70_000_u32 {
    stairs.push((i / 300) as u8);
  }
  vec![
    Vec::new(),
    vec![7],
    vec![0; 100_000],
    text,
    stairs,
    super::rand_bytes(1),
    super::rand_bytes(300),
    super::rand_bytes(70_000),
  ]
}

#[test]
fn test_our_deflate_miniz_inflate() {
  for input in sample_inputs() {
    for level in 0..=9 {
      let compressed = deflate(&input, CompressionLevel::new(level));
      let back = miniz_oxide::inflate::decompress_to_vec(&compressed).unwrap();
      assert!(back == input, "level {level}, {} bytes", input.len());
    }
  }
}

#[test]
fn test_miniz_deflate_our_inflate() {
  for input in sample_inputs() {
    for level in [0, 1, 6, 10] {
      let compressed = miniz_oxide::deflate::compress_to_vec(&input, level);
      let back = inflate(&compressed).unwrap();
      assert!(back == input, "level {level}, {} bytes", input.len());
    }
  }
}

#[test]
fn test_zlib_both_ways() {
  for input in sample_inputs() {
    let ours = zlib::compress(&input, CompressionLevel::DEFAULT);
    assert_eq!(miniz_oxide::inflate::decompress_to_vec_zlib(&ours).unwrap(), input);

    let theirs = miniz_oxide::deflate::compress_to_vec_zlib(&input, 6);
    assert_eq!(zlib::decompress(&theirs, input.len(), true).unwrap(), input);
  }
}

#[test]
fn test_zlib_limit_and_checksum() {
  let input = vec![5_u8; 1000];
  let stream = zlib::compress(&input, CompressionLevel::FAST);
  assert_eq!(
    zlib::decompress(&stream, 999, true).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::OutputLimitExceeded)
  );

  let mut bad = stream.clone();
  let last = bad.len() - 1;
  bad[last] ^= 1;
  assert_eq!(
    zlib::decompress(&bad, 1000, true).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::AdlerMismatch)
  );
  assert_eq!(zlib::decompress(&bad, 1000, false).unwrap(), input);

  // preset dictionary
  assert_eq!(
    zlib::decompress(&[0x78, 0xBB, 0, 0, 0, 0], 10, true).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::BadZlibHeader)
  );
}

#[test]
fn test_compression_actually_compresses() {
  let input = vec![0_u8; 100_000];
  let stored = deflate(&input, CompressionLevel::NONE);
  let fast = deflate(&input, CompressionLevel::FAST);
  let best = deflate(&input, CompressionLevel::BEST);
  assert!(stored.len() > input.len());
  assert!(fast.len() < 1000, "{}", fast.len());
  assert!(best.len() <= fast.len());
}

#[test]
fn test_inflate_random_garbage_no_panics() {
  for _ in 0..200 {
    let v = super::rand_bytes(256);
    let _ = inflate(&v);
    let _ = zlib::decompress(&v, 1 << 16, true);
  }
}

#[test]
fn test_adler32_matches_known() {
  assert_eq!(adler32(b""), 1);
  assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
}
