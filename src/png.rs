#![forbid(unsafe_code)]

//! Module for finding text metadata in PNG data.
//!
//! * [Portable Network Graphics Specification (Third Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png/
//!
//! A PNG is an 8 byte signature followed by a series of "chunks". Each chunk
//! is a 4 byte big-endian length, a 4 byte type tag, `length` bytes of data,
//! and then a 4 byte CRC of the type and data.
//!
//! Image generators store their settings in textual data chunks. There's
//! three kinds:
//! * `tEXt`: a keyword, a null byte, then Latin-1 text.
//! * `zTXt`: a keyword, a null byte, a compression method byte, then a zlib
//!   stream of Latin-1 text.
//! * `iTXt`: a keyword, a null byte, compression flag and method bytes, a
//!   language tag, a translated keyword, then UTF-8 text (possibly zlib
//!   compressed).
//!
//! All three are searched the same way: the first chunk whose keyword matches
//! exactly is the one you get. AUTOMATIC1111's WebUI and its forks use the
//! keyword [`DEFAULT_TEXT_KEY`].
//!
//! ## Streams And Slices
//!
//! * [`read_text_chunk`] works on any [`Read`](std::io::Read). Chunks are
//!   skipped without being buffered, so it's fine to point it at a large file.
//! * [`extract_text_chunk`] works on bytes that are already in memory, using
//!   [`PngRawChunkIter`].
//!
//! Both give the same answer for the same PNG, with one exception: when the
//! matching chunk's data is all there but the stream ends within its 4 CRC
//! bytes, [`read_text_chunk`] still finds it (unless CRCs are being checked)
//! while [`extract_text_chunk`] doesn't, because [`PngRawChunkIter`] only
//! gives whole chunks.
//!
//! ## Parsing Errors
//!
//! Quoting [section 13.2 of the PNG
//! spec](https://www.w3.org/TR/2003/REC-PNG-20031110/#13Decoders.Errors):
//!
//! > Errors that have little or no effect on the processing of the image may be
//! > ignored, while those that affect critical data shall be dealt with in a
//! > manner appropriate to the application.
//!
//! Metadata is never critical data, so a bad signature, a truncated chunk, or
//! a malformed text chunk all just mean "not found". CRCs are ignored unless
//! you ask for them with [`ReadOptions::verify_crc`].

use core::{
  fmt::{Debug, Write},
  mem::size_of,
};

use bytemuck::{pod_read_unaligned, Pod, Zeroable};
use log::{debug, trace, warn};

use crate::error::{ExtractError, ExtractResult};

mod crc32;
pub use crc32::*;

mod raw_chunk;
pub use raw_chunk::*;

mod text;
pub use text::*;

mod reader;
pub use reader::*;


/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The keyword generators store their parameters under.
pub const DEFAULT_TEXT_KEY: &str = "parameters";

/// Checks if the PNG signature is correct.
#[inline]
#[must_use]
pub const fn is_png_signature_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// Finds the text of the first text chunk with the given keyword, within PNG
/// bytes that are all in memory.
///
/// Gives `None` if the signature is wrong or there's no such chunk.
#[inline]
#[must_use]
pub fn extract_text_chunk(bytes: &[u8], key: &str) -> Option<String> {
  extract_text_chunk_with(bytes, key, &ReadOptions::default())
}

/// As [`extract_text_chunk`], with non-default [`ReadOptions`].
#[must_use]
pub fn extract_text_chunk_with(bytes: &[u8], key: &str, options: &ReadOptions) -> Option<String> {
  if !is_png_signature_correct(bytes) {
    debug!("bytes don't start with the PNG signature");
    return None;
  }
  if key.len() > MAX_KEYWORD_LEN {
    return None;
  }
  for raw in PngRawChunkIter::new(bytes) {
    if raw.chunk_type() == PngRawChunkType::IEND {
      break;
    }
    let text_chunk = match PngTextChunk::try_from(raw) {
      Ok(text_chunk) if text_chunk.keyword_is(key) => text_chunk,
      _ => continue,
    };
    if options.verify_crc && !raw.is_crc_valid() {
      warn!("CRC mismatch on a `{key}` {:?} chunk, ignoring it", raw.chunk_type());
      continue;
    }
    if let Some(text) = text_chunk.payload.decode(options.max_text_len) {
      debug!("found `{key}` in a {:?} chunk, {} bytes of text", raw.chunk_type(), text.len());
      return Some(text);
    }
  }
  debug!("no `{key}` chunk");
  None
}
