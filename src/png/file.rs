use super::*;
use std::path::Path;

/// Reads a PNG file and decodes it to `RGBA8` pixels.
#[inline]
pub fn decode_file(path: impl AsRef<Path>) -> PngResult<Image> {
  decode_file_with(path, &DecoderOptions::default())
}

/// Reads a PNG file and decodes it.
pub fn decode_file_with(path: impl AsRef<Path>, options: &DecoderOptions) -> PngResult<Image> {
  let bytes = std::fs::read(path)?;
  decode_with(&bytes, options)
}

/// Encodes an image and writes it to a file.
#[inline]
pub fn encode_file(path: impl AsRef<Path>, image: &Image) -> PngResult<()> {
  encode_file_with(path, image, &EncoderOptions::default())
}

/// Encodes an image and writes it to a file.
///
/// The file is only created once encoding has succeeded.
pub fn encode_file_with(
  path: impl AsRef<Path>, image: &Image, options: &EncoderOptions,
) -> PngResult<()> {
  let bytes = encode_with(image, options)?;
  std::fs::write(path, bytes)?;
  Ok(())
}

/// Reads a PNG file's header info, see [`peek_info`].
pub fn peek_info_file(path: impl AsRef<Path>) -> PngResult<PngInfo> {
  let bytes = std::fs::read(path)?;
  peek_info(&bytes)
}
