//! Lossless encoder and decoder for QOI-style chunked RGBA image streams.
//!
//! An image is stored as a 14-byte header, a sequence of variable-length
//! chunks (cache index, small diff, luma diff, run, literal RGB, literal RGBA)
//! and an 8-byte end marker. Pixels are always 8-bit RGBA in memory.
//!
//! ### Examples
//!
//! ```rust
//! use qoi::{decode_to_vec, encode_to_vec, Channels, ColorSpace};
//!
//! let pixels = [10, 10, 10, 255, 10, 10, 10, 255];
//! let encoded = encode_to_vec(&pixels, 2, 1, Channels::Rgba, ColorSpace::Srgb)?;
//! let (header, decoded) = decode_to_vec(&encoded)?;
//!
//! assert_eq!(header.width, 2);
//! assert_eq!(decoded, pixels);
//! # Ok::<(), qoi::Error>(())
//! ```
#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::inline_always,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cargo_common_metadata,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

mod decode;
mod encode;
mod error;
mod header;
mod ops;
mod pixel;
mod types;
mod utils;

#[doc(hidden)]
pub mod consts;

pub use crate::decode::{decode_header, decode_to_buf, decode_to_vec, Decoder};
pub use crate::encode::{encode_max_len, encode_to_buf, encode_to_vec, Encoder};
pub use crate::error::{Error, ErrorKind, Result, Warning};
pub use crate::header::Header;
pub use crate::pixel::Pixel;
pub use crate::types::{Channels, ColorSpace};
