use pixel_formats::r8g8b8a8_Srgb;
use pngcore::{png::*, *};
use walkdir::WalkDir;

/// Offsets of the data of each chunk, signature skipped.
fn chunk_data_ranges(png: &[u8]) -> Vec<core::ops::Range<usize>> {
  let mut out = Vec::new();
  let mut pos = 8;
  while pos + 12 <= png.len() {
    let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
    out.push(pos + 8..pos + 8 + len);
    pos += 12 + len;
  }
  out
}

#[test]
fn test_PngChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in PngChunkIter::from_chunk_bytes(&v) {
      //
    }
    let _ = decode(&v, false);
    let _ = peek_info(&v);
  }
  // even totally random data should never panic the iterator!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for _ in PngChunkIter::from_chunk_bytes(&v) {
      //
    }
    let mut with_sig = PNG_SIGNATURE.to_vec();
    with_sig.extend_from_slice(&v);
    assert!(decode_bytes(&with_sig).is_err());
  }
}

#[test]
fn test_rgba_round_trip_sizes() {
  let sizes =
    [(1, 1), (1, 512), (512, 1), (2, 3), (7, 5), (16, 16), (31, 17), (100, 3), (255, 9), (33, 200)];
  for (width, height) in sizes {
    let pixels = super::rand_bytes(width as usize * height as usize * 4);
    let png = encode(width, height, &pixels, None).unwrap();
    let image = decode(&png, false).unwrap();
    assert_eq!((image.width, image.height), (width, height));
    assert!(image.palette.is_none());
    assert!(image.pixels == pixels, "{width}x{height}");
  }
}

#[test]
fn test_rgba_round_trip_largest() {
  // smooth data, so the filters and matcher actually have work to do
  let (width, height) = (512_u32, 512_u32);
  let mut pixels = Vec::with_capacity((width * height * 4) as usize);
  for y in 0..height {
    for x in 0..width {
      pixels.extend_from_slice(&[x as u8, y as u8, (x ^ y) as u8, 255]);
    }
  }
  let image = Image::from_rgba(width, height, pixels).unwrap();
  for level in [CompressionLevel::NONE, CompressionLevel::FAST, CompressionLevel::DEFAULT] {
    let png = encode_with(&image, &EncoderOptions::default().set_level(level)).unwrap();
    assert_eq!(decode_bytes(&png).unwrap(), image, "level {}", level.get());
  }
}

#[test]
fn test_round_trip_every_filter() {
  let pixels = super::rand_bytes(13 * 11 * 4);
  let image = Image::from_rgba(13, 11, pixels).unwrap();
  for ty in FilterType::ALL {
    let opts = EncoderOptions::default().set_filter(FilterStrategy::Fixed(ty));
    let png = encode_with(&image, &opts).unwrap();
    assert_eq!(decode_bytes(&png).unwrap(), image, "{ty:?}");
  }
}

#[test]
fn test_palette_round_trip() {
  // 200 colors, some translucent
  let colors: Vec<[u8; 4]> = super::rand_bytes(200 * 4)
    .chunks_exact(4)
    .enumerate()
    .map(|(i, c)| [i as u8, c[1], c[2], if i % 3 == 0 { c[3] } else { 255 }])
    .collect();
  let (width, height) = (40_u32, 30_u32);
  let choices = super::rand_bytes((width * height) as usize);
  let pixels: Vec<u8> = choices.iter().flat_map(|&c| colors[usize::from(c) % 200]).collect();

  let image = Image::from_rgba(width, height, pixels.clone()).unwrap();
  let png = encode_with(&image, &EncoderOptions::default().set_indexed(true)).unwrap();
  assert_eq!(peek_info(&png).unwrap().color_type, 3);

  // back to RGBA
  assert_eq!(decode(&png, false).unwrap().pixels, pixels);

  // or as indexes
  let indexed = decode(&png, true).unwrap();
  let palette = indexed.palette.as_ref().unwrap();
  assert!(palette.len() <= 200);
  assert_eq!(indexed.pixels.len(), (width * height) as usize);
  assert_eq!(indexed.to_rgba().unwrap(), pixels);
}

#[test]
fn test_caller_palette_round_trip() {
  let palette = Palette::new(
    (0..=255_u8).map(|i| r8g8b8a8_Srgb { r: i, g: !i, b: i / 2, a: 255 - i / 4 }).collect(),
  )
  .unwrap();
  let indexes = super::rand_bytes(19 * 23);
  let png = encode(19, 23, &indexes, Some(&palette)).unwrap();
  let image = decode(&png, true).unwrap();
  assert_eq!(image.pixels, indexes);
  assert_eq!(image.palette.as_ref(), Some(&palette));
  assert_eq!(peek_info(&png).unwrap().colormap_entries, 256);
}

#[test]
fn test_want_palette_on_rgba_file() {
  let pixels = [0, 0, 0, 255, 9, 9, 9, 9, 0, 0, 0, 255];
  let png = encode(3, 1, &pixels, None).unwrap();
  let image = decode(&png, true).unwrap();
  assert_eq!(image.pixels, [0, 1, 0]);
  assert_eq!(image.palette.as_ref().map(Palette::len), Some(2));

  let noisy = super::rand_bytes(64 * 64 * 4);
  let png = encode(64, 64, &noisy, None).unwrap();
  assert_eq!(decode(&png, true).unwrap_err(), PngError::TooManyColors);
}

#[test]
fn test_crc_catches_any_single_bit_flip() {
  let image = Image::from_rgba(3, 2, super::rand_bytes(3 * 2 * 4)).unwrap();
  let png = encode_bytes(&image).unwrap();
  for range in chunk_data_ranges(&png) {
    for i in range {
      for bit in 0..8 {
        let mut bad = png.clone();
        bad[i] ^= 1 << bit;
        assert!(
          matches!(parse_chunks(&bad), Err(PngError::Format(FormatError::CrcMismatch { .. }))),
          "byte {i} bit {bit}"
        );
        assert!(matches!(decode_bytes(&bad), Err(PngError::Format(_))));
      }
    }
  }
}

#[test]
fn test_too_many_colors() {
  let mut pixels = Vec::new();
  for i in 0..257_u32 {
    pixels.extend_from_slice(&[(i % 256) as u8, (i / 256) as u8, 7, 255]);
  }
  let image = Image::from_rgba(257, 1, pixels).unwrap();
  let opts = EncoderOptions::default().set_indexed(true);
  assert_eq!(encode_with(&image, &opts).unwrap_err(), PngError::TooManyColors);

  // a 1x1 image is fine either way
  let one = Image::from_rgba(1, 1, vec![1, 2, 3, 4]).unwrap();
  let png = encode_with(&one, &opts).unwrap();
  assert_eq!(decode_bytes(&png).unwrap(), one);
}

#[test]
fn test_two_by_two_red() {
  let red: Vec<u8> = [255, 0, 0, 255].repeat(4);
  let png = encode(2, 2, &red, None).unwrap();
  let info = peek_info(&png).unwrap();
  assert_eq!((info.width, info.height), (2, 2));
  let image = decode(&png, false).unwrap();
  assert_eq!((image.width, image.height), (2, 2));
  assert_eq!(image.pixels, red);
  assert_eq!(image.pixels.len(), 16);
}

#[test]
fn test_truncated_stream() {
  let png = encode(2, 2, &[0; 16], None).unwrap();
  // signature, then IHDR's 25 bytes
  let truncated = &png[..8 + 25];
  assert_eq!(
    decode(truncated, false).unwrap_err(),
    PngError::Format(FormatError::MissingImageData)
  );
  // partway into the next chunk
  assert_eq!(
    decode(&png[..8 + 25 + 6], false).unwrap_err(),
    PngError::Format(FormatError::TruncatedChunk)
  );
  assert_eq!(decode(&png[..5], false).unwrap_err(), PngError::Format(FormatError::BadSignature));
}

#[test]
fn test_peek_info_with_corrupt_image_data() {
  let pixels = super::rand_bytes(37 * 21 * 4);
  let mut png = encode(37, 21, &pixels, None).unwrap();
  let ranges = chunk_data_ranges(&png);
  // IHDR is first, the image data follows
  for i in ranges[1].clone() {
    png[i] = 0xFF;
  }
  let info = peek_info(&png).unwrap();
  assert_eq!((info.width, info.height), (37, 21));
  assert_eq!(info.colormap_entries, 0);
  assert!(decode_bytes(&png).is_err());
  // and without the CRC check the stream itself is what's broken
  let opts = DecoderOptions::default().set_confirm_crc(false);
  assert!(matches!(decode_with(&png, &opts), Err(PngError::CorruptStream(_))));
}

#[test]
fn test_decode_miniz_image_data() {
  let pixels = super::rand_bytes(9 * 4 * 4);
  let mut filtered = Vec::new();
  for row in pixels.chunks_exact(9 * 4) {
    filtered.push(0);
    filtered.extend_from_slice(row);
  }
  let ihdr = IHDR::new(9, 4, PngPixelFormat::RGBA8).to_bytes();
  let idat = miniz_oxide::deflate::compress_to_vec_zlib(&filtered, 8);
  let png = serialize_chunks(&[
    PngChunk::new(PngChunkTy::IHDR, &ihdr),
    PngChunk::new(PngChunkTy::IDAT, &idat),
  ]);
  assert_eq!(decode_bytes(&png).unwrap().pixels, pixels);
}

#[test]
fn test_unsupported_formats() {
  let mut ihdr = IHDR::new(4, 4, PngPixelFormat::RGBA8);
  ihdr.bit_depth = 16;
  let png = serialize_chunks(&[PngChunk::new(PngChunkTy::IHDR, &ihdr.to_bytes())]);
  assert_eq!(
    decode_bytes(&png).unwrap_err(),
    PngError::UnsupportedFormat(UnsupportedFormatError::BitDepth(16))
  );
  // peek_info still reports what the header says
  let info = peek_info(&png).unwrap();
  assert_eq!((info.width, info.bit_depth, info.color_type), (4, 16, 6));
}

#[test]
fn test_file_round_trip() {
  let dir = std::env::temp_dir();
  let path = dir.join(format!("pngcore_file_round_trip_{}.png", std::process::id()));
  let image = Image::from_rgba(5, 4, super::rand_bytes(5 * 4 * 4)).unwrap();
  encode_file(&path, &image).unwrap();
  assert_eq!(peek_info_file(&path).unwrap().width, 5);
  assert_eq!(decode_file(&path).unwrap(), image);
  std::fs::remove_file(&path).unwrap();
  assert!(matches!(decode_file(&path), Err(PngError::Io(std::io::ErrorKind::NotFound))));
}
