#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]

//! A small PNG codec.
//!
//! Reads and writes 8-bit RGBA and 8-bit indexed color PNG images, using its
//! own DEFLATE engine. Every call is a plain function from bytes to an
//! [`Image`] or back, nothing is kept between calls.
//!
//! ```
//! # use pngcore::*;
//! let red = Image::from_rgba(2, 2, [255, 0, 0, 255].repeat(4)).unwrap();
//! let png: Vec<u8> = encode_bytes(&red).unwrap();
//! assert_eq!(peek_info(&png).unwrap().width, 2);
//! assert_eq!(decode_bytes(&png).unwrap(), red);
//! ```
//!
//! The pieces the codec is built from are public as well:
//! * [`png::crc32`] for chunk CRCs.
//! * [`deflate`] for raw DEFLATE and [`deflate::zlib`] for zlib streams.
//! * [`png::chunk`] to walk or write chunks.
//! * [`png::filtering`] for the scanline filters.
//! * [`png::palette`] for building and resolving palettes.
//!
//! ## Features
//! * `std` (default): file system entry points such as [`decode_file`], and
//!   `std::error::Error` for [`PngError`].

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

mod options;
pub use options::*;

pub mod deflate;

mod image;
pub use image::*;

pub mod png;
pub use png::{decode_bytes, encode_bytes, peek_info, Palette};
#[cfg(feature = "std")]
#[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
pub use png::{decode_file, decode_file_with, encode_file, encode_file_with, peek_info_file};
