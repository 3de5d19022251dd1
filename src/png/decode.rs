use super::*;
use crate::deflate::zlib;
use log::{debug, trace, warn};

/// Decodes a PNG with the default [`DecoderOptions`].
///
/// * When `want_palette` is `false` the pixels are always `RGBA8`.
/// * When `want_palette` is `true` the pixels are always palette indexes, and
///   the image has a palette. An RGBA file gets a palette built from its
///   colors, which fails if there are more than 256 of them.
#[inline]
pub fn decode(bytes: &[u8], want_palette: bool) -> PngResult<Image> {
  decode_with(bytes, &DecoderOptions::default().set_want_palette(want_palette))
}

/// Decodes a PNG to `RGBA8` pixels.
#[inline]
pub fn decode_bytes(bytes: &[u8]) -> PngResult<Image> {
  decode(bytes, false)
}

/// Decodes a PNG.
///
/// No partial image is ever returned: any problem anywhere in the data fails
/// the whole call.
pub fn decode_with(bytes: &[u8], options: &DecoderOptions) -> PngResult<Image> {
  let chunks = parse_chunks_with(bytes, options.confirm_crc)?;
  let mut it = chunks.iter();
  let ihdr = match it.next() {
    Some(chunk) if chunk.ty == PngChunkTy::IHDR => IHDR::try_from(chunk.data)?,
    _ => return Err(FormatError::FirstChunkNotIhdr.into()),
  };
  debug!("decoding {ihdr:?}");
  if ihdr.width > options.max_width || ihdr.height > options.max_height {
    return Err(PngError::InvalidDimensions { width: ihdr.width, height: ihdr.height });
  }
  let format = ihdr.pixel_format()?;

  let mut plte: Option<&[u8]> = None;
  let mut trns: Option<&[u8]> = None;
  let mut idat: Vec<u8> = Vec::new();
  let mut idat_runs = 0_usize;
  let mut in_idat_run = false;
  let mut saw_iend = false;
  for chunk in it {
    match chunk.ty {
      PngChunkTy::PLTE => {
        if idat_runs > 0 {
          return Err(FormatError::PaletteAfterImageData.into());
        }
        if plte.is_some() {
          return Err(FormatError::DuplicatePalette.into());
        }
        plte = Some(chunk.data);
      }
      PngChunkTy::tRNS => trns = Some(chunk.data),
      PngChunkTy::IDAT => {
        if !in_idat_run {
          idat_runs += 1;
          if idat_runs == 2 {
            warn!("IDAT chunks are not consecutive, joining them anyway");
          }
        }
        idat.try_reserve(chunk.data.len())?;
        idat.extend_from_slice(chunk.data);
      }
      PngChunkTy::IEND => saw_iend = true,
      PngChunkTy::IHDR => warn!("ignoring a second IHDR"),
      other if other.is_critical() => {
        return Err(UnsupportedFormatError::UnknownCriticalChunk(other.0).into())
      }
      other => trace!("skipping ancillary chunk {other} ({} bytes)", chunk.data.len()),
    }
    in_idat_run = chunk.ty == PngChunkTy::IDAT;
  }
  if idat_runs == 0 {
    return Err(FormatError::MissingImageData.into());
  }
  if !saw_iend {
    return Err(FormatError::MissingImageEnd.into());
  }

  let palette = match format {
    PngPixelFormat::I8 => match plte {
      Some(plte) => Some(Palette::from_chunks(plte, trns)?),
      None => return Err(FormatError::MissingPalette.into()),
    },
    PngPixelFormat::RGBA8 => {
      if plte.is_some() {
        trace!("ignoring the suggested palette of an RGBA image");
      }
      if trns.is_some() {
        warn!("ignoring tRNS in an RGBA image");
      }
      None
    }
  };

  let filtered_len = ihdr.filtered_len(format)?;
  let mut data = zlib::decompress(&idat, filtered_len, options.confirm_adler)?;
  drop(idat);
  if data.len() < filtered_len {
    return Err(CorruptStreamError::NotEnoughImageData.into());
  }
  reconstruct_in_place(
    &mut data,
    format.bytes_per_scanline(ihdr.width),
    format.bytes_per_pixel(),
  )?;

  let (width, height) = (ihdr.width, ihdr.height);
  let image = match (palette, options.want_palette) {
    (Some(palette), true) => {
      palette.check_indexes(&data)?;
      Image { width, height, pixels: data, palette: Some(palette) }
    }
    (Some(palette), false) => {
      Image { width, height, pixels: palette.resolve(&data)?, palette: None }
    }
    (None, true) => {
      let (palette, indexes) = Palette::build(&data)?;
      Image { width, height, pixels: indexes, palette: Some(palette) }
    }
    (None, false) => Image { width, height, pixels: data, palette: None },
  };
  Ok(image)
}

/// Reads the header info of a PNG without decoding any pixels.
///
/// Only the signature and the `IHDR` chunk have to be valid. After that the
/// data is only scanned for a `PLTE` chunk, and any problem just ends the
/// scan, so a PNG with broken image data still gets its info read.
///
/// The header is checked for structure and dimensions, not for whether this
/// crate can decode it.
pub fn peek_info(bytes: &[u8]) -> PngResult<PngInfo> {
  let mut it = PngChunkIter::from_png_bytes(bytes)?;
  let first = match it.next() {
    Some(chunk) => chunk?,
    None => return Err(FormatError::FirstChunkNotIhdr.into()),
  };
  if first.ty != PngChunkTy::IHDR {
    return Err(FormatError::FirstChunkNotIhdr.into());
  }
  first.check_crc()?;
  let ihdr = IHDR::try_from(first.data)?;

  let mut colormap_entries = 0;
  if ihdr.color_type == PngColorType::Index as u8 {
    for chunk in it.map_while(Result::ok) {
      match chunk.ty {
        PngChunkTy::IDAT | PngChunkTy::IEND => break,
        PngChunkTy::PLTE => {
          if chunk.check_crc().is_ok() && chunk.data.len() % 3 == 0 {
            colormap_entries = (chunk.data.len() / 3).min(Palette::MAX_ENTRIES);
          }
          break;
        }
        _ => (),
      }
    }
  }
  Ok(PngInfo {
    width: ihdr.width,
    height: ihdr.height,
    colormap_entries,
    bit_depth: ihdr.bit_depth,
    color_type: ihdr.color_type,
  })
}

#[cfg(test)]
fn png_of(chunks: &[PngChunk<'_>]) -> Vec<u8> {
  serialize_chunks(chunks)
}

#[cfg(test)]
fn tiny_ihdr(format: PngPixelFormat) -> [u8; 13] {
  IHDR::new(1, 1, format).to_bytes()
}

#[test]
fn test_decode_needs_ihdr_first() {
  let bytes = png_of(&[PngChunk::new(PngChunkTy::IDAT, &[])]);
  assert_eq!(decode(&bytes, false).unwrap_err(), PngError::Format(FormatError::FirstChunkNotIhdr));
}

#[test]
fn test_decode_missing_chunks() {
  let ihdr = tiny_ihdr(PngPixelFormat::RGBA8);
  let mut bytes = PNG_SIGNATURE.to_vec();
  write_chunk(&mut bytes, PngChunkTy::IHDR, &ihdr);
  assert_eq!(decode(&bytes, false).unwrap_err(), PngError::Format(FormatError::MissingImageData));

  let idat = zlib::compress(&[0, 1, 2, 3, 4], CompressionLevel::DEFAULT);
  write_chunk(&mut bytes, PngChunkTy::IDAT, &idat);
  assert_eq!(decode(&bytes, false).unwrap_err(), PngError::Format(FormatError::MissingImageEnd));

  write_chunk(&mut bytes, PngChunkTy::IEND, &[]);
  let image = decode(&bytes, false).unwrap();
  assert_eq!(image.pixels, [1, 2, 3, 4]);
}

#[test]
fn test_decode_indexed_needs_palette() {
  let idat = zlib::compress(&[0, 0], CompressionLevel::DEFAULT);
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &tiny_ihdr(PngPixelFormat::I8)),
    PngChunk::new(PngChunkTy::IDAT, &idat),
  ]);
  assert_eq!(decode(&bytes, false).unwrap_err(), PngError::Format(FormatError::MissingPalette));

  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &tiny_ihdr(PngPixelFormat::I8)),
    PngChunk::new(PngChunkTy::IDAT, &idat),
    PngChunk::new(PngChunkTy::PLTE, &[1, 2, 3]),
  ]);
  assert_eq!(
    decode(&bytes, false).unwrap_err(),
    PngError::Format(FormatError::PaletteAfterImageData)
  );
}

#[test]
fn test_decode_skips_ancillary_rejects_critical() {
  let idat = zlib::compress(&[0, 9, 8, 7, 6], CompressionLevel::FAST);
  let ihdr = tiny_ihdr(PngPixelFormat::RGBA8);
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &ihdr),
    PngChunk::new(PngChunkTy(*b"tEXt"), b"Comment\0hello"),
    PngChunk::new(PngChunkTy::IDAT, &idat),
  ]);
  assert_eq!(decode(&bytes, false).unwrap().pixels, [9, 8, 7, 6]);

  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &ihdr),
    PngChunk::new(PngChunkTy(*b"ZZZZ"), &[]),
    PngChunk::new(PngChunkTy::IDAT, &idat),
  ]);
  assert_eq!(
    decode(&bytes, false).unwrap_err(),
    PngError::UnsupportedFormat(UnsupportedFormatError::UnknownCriticalChunk(*b"ZZZZ"))
  );
}

#[test]
fn test_decode_split_idat() {
  let idat = zlib::compress(&[0, 9, 8, 7, 6], CompressionLevel::NONE);
  let (a, b) = idat.split_at(5);
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &tiny_ihdr(PngPixelFormat::RGBA8)),
    PngChunk::new(PngChunkTy::IDAT, a),
    PngChunk::new(PngChunkTy::IDAT, b),
  ]);
  assert_eq!(decode(&bytes, false).unwrap().pixels, [9, 8, 7, 6]);
}

#[test]
fn test_decode_joins_idat_runs_split_by_other_chunks() {
  let idat = zlib::compress(&[0, 9, 8, 7, 6], CompressionLevel::NONE);
  let (a, b) = idat.split_at(5);
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &tiny_ihdr(PngPixelFormat::RGBA8)),
    PngChunk::new(PngChunkTy::IDAT, a),
    PngChunk::new(PngChunkTy(*b"tEXt"), b"Comment\0hi"),
    PngChunk::new(PngChunkTy::IDAT, b),
  ]);
  assert_eq!(decode(&bytes, false).unwrap().pixels, [9, 8, 7, 6]);
}

#[test]
fn test_decode_duplicate_palette() {
  let idat = zlib::compress(&[0, 0], CompressionLevel::NONE);
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &tiny_ihdr(PngPixelFormat::I8)),
    PngChunk::new(PngChunkTy::PLTE, &[1, 2, 3]),
    PngChunk::new(PngChunkTy::PLTE, &[1, 2, 3]),
    PngChunk::new(PngChunkTy::IDAT, &idat),
  ]);
  assert_eq!(decode(&bytes, false).unwrap_err(), PngError::Format(FormatError::DuplicatePalette));
}

#[test]
fn test_decode_ignores_trns_on_rgba() {
  let idat = zlib::compress(&[0, 9, 8, 7, 6], CompressionLevel::DEFAULT);
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &tiny_ihdr(PngPixelFormat::RGBA8)),
    PngChunk::new(PngChunkTy::tRNS, &[0, 9, 0, 8, 0, 7]),
    PngChunk::new(PngChunkTy::IDAT, &idat),
  ]);
  let image = decode(&bytes, false).unwrap();
  assert_eq!(image.pixels, [9, 8, 7, 6]);
  assert!(image.palette.is_none());
}

#[test]
fn test_decode_short_image_data() {
  // one row of a 1x2 image
  let ihdr = IHDR::new(1, 2, PngPixelFormat::RGBA8).to_bytes();
  let idat = zlib::compress(&[0, 9, 8, 7, 6], CompressionLevel::DEFAULT);
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &ihdr),
    PngChunk::new(PngChunkTy::IDAT, &idat),
  ]);
  assert_eq!(
    decode(&bytes, false).unwrap_err(),
    PngError::CorruptStream(CorruptStreamError::NotEnoughImageData)
  );
}

#[test]
fn test_decode_limits() {
  let ihdr = IHDR::new(300, 1, PngPixelFormat::RGBA8).to_bytes();
  let bytes = png_of(&[PngChunk::new(PngChunkTy::IHDR, &ihdr)]);
  let opts = DecoderOptions::default().set_max_width(299);
  assert_eq!(
    decode_with(&bytes, &opts).unwrap_err(),
    PngError::InvalidDimensions { width: 300, height: 1 }
  );
}

#[test]
fn test_peek_info_indexed() {
  let bytes = png_of(&[
    PngChunk::new(PngChunkTy::IHDR, &IHDR::new(7, 5, PngPixelFormat::I8).to_bytes()),
    PngChunk::new(PngChunkTy::PLTE, &[0; 3 * 17]),
    PngChunk::new(PngChunkTy::IDAT, b"garbage"),
  ]);
  let info = peek_info(&bytes).unwrap();
  assert_eq!(
    info,
    PngInfo { width: 7, height: 5, colormap_entries: 17, bit_depth: 8, color_type: 3 }
  );
  // the garbage image data only matters to a full decode
  assert!(decode(&bytes, true).is_err());
}
