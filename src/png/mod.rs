//! Reading and writing PNG data.
//!
//! ## Automated PNG Decoding
//! If you just want the pixels, use [`decode`] (or [`decode_with`] for more
//! control). You get back an [`Image`] with the width, height, and the pixel
//! data, either as `RGBA8` or as palette indexes plus the palette.
//!
//! The encoding side is [`encode`] and [`encode_with`].
//!
//! Only 8-bit RGBA (color type 6) and 8-bit indexed color (color type 3)
//! without interlacing are supported. Anything else is reported as an
//! [`UnsupportedFormatError`] rather than being converted.
//!
//! ## How A PNG Is Laid Out
//!
//! After an 8 byte signature, a PNG is a series of "chunks". Each chunk has a
//! length, a four letter type, some data, and a CRC of the type and data. You
//! can walk them yourself with [`PngChunkIter`], or get them all at once with
//! [`parse_chunks`]. There's four "critical" chunk types:
//! * **Header** (`IHDR`) - Has the image's dimensions, pixel format, and if
//!   the image is interlaced or not. It must be the very first chunk.
//! * **Palette** (`PLTE`) - If an image uses indexed color it will have a
//!   palette of what index values map to what `RGB8` values. Any alpha for the
//!   palette entries is in an ancillary `tRNS` chunk.
//! * **Image Data** (`IDAT`) - One or more chunks of compressed data. All of
//!   the compressed data forms a single zlib data stream.
//! * **End** (`IEND`) - The last chunk, lets you know you had the full PNG and
//!   your data wasn't truncated accidentally.
//!
//! When storing the PNG, each row of raw pixel values is first "filtered" (to
//! try and make them more compression-friendly), and then all the rows are
//! compressed into a zlib data stream. Decoding reverses this: decompress,
//! then unfilter each row using the row above it.

use crate::{error::*, image::*, options::*};
use alloc::vec::Vec;
use pixel_formats::r8g8b8a8_Srgb;

/// The 8 bytes every PNG starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

pub mod crc32;

pub mod chunk;
pub use chunk::*;

mod ihdr;
pub use ihdr::*;

pub mod filtering;
pub use filtering::{unfilter_row, filter_row, FilterType};
pub(crate) use filtering::{filter_image, reconstruct_in_place};

pub mod palette;
pub use palette::*;

mod decode;
pub use decode::*;

mod encode;
pub use encode::*;

#[cfg(feature = "std")]
mod file;
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
pub use file::*;
