use super::*;
use crate::deflate::zlib;
use log::debug;

/// Encodes pixels as a PNG with the default [`EncoderOptions`].
///
/// * With no palette, `pixels` is `RGBA8` data, 4 bytes per pixel.
/// * With a palette, `pixels` is one palette index per pixel and the palette
///   is written as `PLTE` (plus `tRNS` if any entry has alpha).
///
/// ## Failure
/// * [`PngError::InvalidDimensions`] if either dimension is 0 or too large.
/// * [`PngError::PixelBufferLength`] if `pixels` isn't exactly `width *
///   height` pixels.
/// * [`PngError::IndexOutOfRange`] for an index the palette doesn't have.
#[inline]
pub fn encode(
  width: u32, height: u32, pixels: &[u8], palette: Option<&Palette>,
) -> PngResult<Vec<u8>> {
  encode_pixels(width, height, pixels, palette, &EncoderOptions::default())
}

/// Encodes an [`Image`] with the default [`EncoderOptions`].
#[inline]
pub fn encode_bytes(image: &Image) -> PngResult<Vec<u8>> {
  encode_with(image, &EncoderOptions::default())
}

/// Encodes an [`Image`].
///
/// An image without a palette is written as RGBA, unless
/// [`EncoderOptions::indexed`] is set, in which case a palette is built from
/// its colors and this fails with [`PngError::TooManyColors`] if there are
/// more than 256 of them.
#[inline]
pub fn encode_with(image: &Image, options: &EncoderOptions) -> PngResult<Vec<u8>> {
  encode_pixels(image.width, image.height, &image.pixels, image.palette.as_ref(), options)
}

fn encode_pixels(
  width: u32, height: u32, pixels: &[u8], palette: Option<&Palette>, options: &EncoderOptions,
) -> PngResult<Vec<u8>> {
  if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
    return Err(PngError::InvalidDimensions { width, height });
  }
  let check_len = |format: PngPixelFormat| -> PngResult<usize> {
    let row_bytes = format
      .bytes_per_pixel()
      .checked_mul(width as usize)
      .ok_or(PngError::InvalidDimensions { width, height })?;
    let expected =
      row_bytes.checked_mul(height as usize).ok_or(PngError::InvalidDimensions { width, height })?;
    if pixels.len() == expected {
      Ok(row_bytes)
    } else {
      Err(PngError::PixelBufferLength { expected, actual: pixels.len() })
    }
  };

  let built: (Palette, Vec<u8>);
  let (format, row_bytes, pixels, palette) = match palette {
    Some(palette) => {
      let row_bytes = check_len(PngPixelFormat::I8)?;
      palette.check_indexes(pixels)?;
      (PngPixelFormat::I8, row_bytes, pixels, Some(palette))
    }
    None if options.indexed => {
      check_len(PngPixelFormat::RGBA8)?;
      built = Palette::build(pixels)?;
      let row_bytes = PngPixelFormat::I8.bytes_per_scanline(width);
      (PngPixelFormat::I8, row_bytes, built.1.as_slice(), Some(&built.0))
    }
    None => (PngPixelFormat::RGBA8, check_len(PngPixelFormat::RGBA8)?, pixels, None),
  };

  let filtered = filter_image(pixels, row_bytes, format.bytes_per_pixel(), options.filter)?;
  let zlib_data = zlib::compress(&filtered, options.level);
  drop(filtered);

  let chunk_size = options.idat_chunk_size.max(1);
  let idat_count = (zlib_data.len() + chunk_size - 1) / chunk_size;
  let plte = palette.map(|p| (p.plte_bytes(), p.trns_bytes()));
  let palette_bytes = plte.as_ref().map_or(0, |(plte, trns)| {
    plte.len() + 12 + trns.as_ref().map_or(0, |t| t.len() + 12)
  });

  let mut out = Vec::new();
  out.try_reserve(PNG_SIGNATURE.len() + 25 + palette_bytes + zlib_data.len() + idat_count * 12 + 12)?;
  out.extend_from_slice(&PNG_SIGNATURE);
  write_chunk(&mut out, PngChunkTy::IHDR, &IHDR::new(width, height, format).to_bytes());
  if let Some((plte, trns)) = &plte {
    write_chunk(&mut out, PngChunkTy::PLTE, plte);
    if let Some(trns) = trns {
      write_chunk(&mut out, PngChunkTy::tRNS, trns);
    }
  }
  for part in zlib_data.chunks(chunk_size) {
    write_chunk(&mut out, PngChunkTy::IDAT, part);
  }
  write_chunk(&mut out, PngChunkTy::IEND, &[]);
  debug!(
    "encoded {width}x{height} {format:?}: {} bytes of image data in {idat_count} IDAT, {} bytes total",
    zlib_data.len(),
    out.len()
  );
  Ok(out)
}

#[test]
fn test_encode_rejects_bad_input() {
  assert_eq!(encode(0, 1, &[], None).unwrap_err(), PngError::InvalidDimensions { width: 0, height: 1 });
  assert_eq!(
    encode(2, 1, &[0; 7], None).unwrap_err(),
    PngError::PixelBufferLength { expected: 8, actual: 7 }
  );
  let palette = Palette::new(alloc::vec![r8g8b8a8_Srgb { r: 0, g: 0, b: 0, a: 255 }]).unwrap();
  assert_eq!(
    encode(2, 1, &[0, 1], Some(&palette)).unwrap_err(),
    PngError::IndexOutOfRange { index: 1, palette_len: 1 }
  );
}

#[test]
fn test_encode_chunk_order() {
  let palette = Palette::new(alloc::vec![
    r8g8b8a8_Srgb { r: 10, g: 20, b: 30, a: 255 },
    r8g8b8a8_Srgb { r: 40, g: 50, b: 60, a: 128 },
  ])
  .unwrap();
  let indexes: Vec<u8> = (0..64 * 64).map(|i| ((i * 7) % 3 % 2) as u8).collect();
  let image = Image::from_indexed(64, 64, indexes, palette).unwrap();
  let opts = EncoderOptions::default().set_level(CompressionLevel::NONE).set_idat_chunk_size(1000);
  let bytes = encode_with(&image, &opts).unwrap();
  let tys: Vec<PngChunkTy> = parse_chunks(&bytes).unwrap().iter().map(|c| c.ty()).collect();
  assert_eq!(&tys[..4], &[PngChunkTy::IHDR, PngChunkTy::PLTE, PngChunkTy::tRNS, PngChunkTy::IDAT]);
  assert_eq!(tys.last(), Some(&PngChunkTy::IEND));
  // 64 rows of 65 bytes stored, more than 4 chunks of 1000
  assert!(tys.iter().filter(|&&t| t == PngChunkTy::IDAT).count() >= 5);

  let back = decode(&bytes, true).unwrap();
  assert_eq!(back, image);
}

#[test]
fn test_encode_indexed_option() {
  let pixels = [1, 2, 3, 255, 4, 5, 6, 255, 1, 2, 3, 255, 4, 5, 6, 255];
  let image = Image::from_rgba(2, 2, pixels.to_vec()).unwrap();
  let bytes = encode_with(&image, &EncoderOptions::default().set_indexed(true)).unwrap();
  let info = peek_info(&bytes).unwrap();
  assert_eq!(info.color_type, PngColorType::Index as u8);
  assert_eq!(info.colormap_entries, 2);
  assert_eq!(decode(&bytes, false).unwrap().pixels, pixels);
}
