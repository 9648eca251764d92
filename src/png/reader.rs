use super::*;

use std::{
  fs::File,
  io::{self, BufReader, Read},
  path::Path,
};

/// The longest keyword a text chunk is allowed to have.
pub const MAX_KEYWORD_LEN: usize = 79;

/// Default limit on the inflated size of compressed text (1 MiB).
pub const DEFAULT_MAX_TEXT_LEN: usize = 1024 * 1024;

/// Options for finding a text chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadOptions {
  /// Check the CRC of the matching chunk. A chunk that fails the check is
  /// ignored and the search goes on. Off by default, the same as every other
  /// checksum in PNG.
  pub verify_crc: bool,
  /// Compressed text (`zTXt`, or compressed `iTXt`) won't be inflated past
  /// this many bytes.
  pub max_text_len: usize,
}
impl Default for ReadOptions {
  #[inline]
  #[must_use]
  fn default() -> Self {
    Self { verify_crc: false, max_text_len: DEFAULT_MAX_TEXT_LEN }
  }
}

/// Finds the text of the first text chunk with the given keyword, reading the
/// PNG as a stream.
///
/// * `Ok(Some(text))`: the chunk was found.
/// * `Ok(None)`: no such chunk. This includes streams that aren't PNG at all,
///   and streams that are cut short partway through.
/// * `Err(_)`: the stream couldn't even be read up to the signature.
///
/// Chunks that don't match are skipped over without being buffered. For text
/// chunks only the keyword is read before deciding.
#[inline]
pub fn read_text_chunk<R: Read>(reader: R, key: &str) -> ExtractResult<Option<String>> {
  read_text_chunk_with(reader, key, &ReadOptions::default())
}

/// As [`read_text_chunk`], with non-default [`ReadOptions`].
pub fn read_text_chunk_with<R: Read>(
  mut reader: R, key: &str, options: &ReadOptions,
) -> ExtractResult<Option<String>> {
  let mut signature = [0_u8; PNG_SIGNATURE.len()];
  match reader.read_exact(&mut signature) {
    Ok(()) => (),
    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
      debug!("stream is too short to be a PNG");
      return Ok(None);
    }
    Err(e) => return Err(e.into()),
  }
  if !is_png_signature_correct(&signature) {
    debug!("stream doesn't start with the PNG signature");
    return Ok(None);
  }
  match walk_chunks(&mut reader, key, options) {
    Ok(found) => Ok(found),
    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
      debug!("PNG stream ended before a `{key}` chunk was found");
      Ok(None)
    }
    Err(e) => {
      warn!("stopped reading PNG stream: {e}");
      Ok(None)
    }
  }
}

/// Opens a file and runs [`read_text_chunk_with`] on it.
pub fn read_text_chunk_from_path(
  path: impl AsRef<Path>, key: &str, options: &ReadOptions,
) -> ExtractResult<Option<String>> {
  let path = path.as_ref();
  let file =
    File::open(path).map_err(|source| ExtractError::Open { path: path.to_path_buf(), source })?;
  read_text_chunk_with(BufReader::new(file), key, options)
}

fn walk_chunks<R: Read>(
  reader: &mut R, key: &str, options: &ReadOptions,
) -> io::Result<Option<String>> {
  loop {
    let mut header = PngChunkHeader::default();
    reader.read_exact(bytemuck::bytes_of_mut(&mut header))?;
    let chunk_ty = header.chunk_ty();
    let length = u64::from(header.length());
    if chunk_ty == PngRawChunkType::IEND {
      debug!("reached IEND, no `{key}` chunk");
      return Ok(None);
    }
    if !chunk_ty.is_text() {
      trace!("skipping {chunk_ty:?} chunk ({length} bytes)");
      skip_bytes(reader, length + 4)?;
      continue;
    }

    // keyword, null byte, and maybe a little of the text after that.
    let mut prefix = [0_u8; MAX_KEYWORD_LEN + 1];
    let prefix_len = (length as usize).min(prefix.len());
    reader.read_exact(&mut prefix[..prefix_len])?;
    let prefix = &prefix[..prefix_len];
    let keyword_end = match prefix.iter().position(|&u| u == 0) {
      Some(end) if &prefix[..end] == key.as_bytes() => end,
      _ => {
        trace!("skipping {chunk_ty:?} chunk with another keyword");
        skip_bytes(reader, length - prefix_len as u64 + 4)?;
        continue;
      }
    };

    let mut data = prefix.to_vec();
    let remaining = length - prefix_len as u64;
    let got = reader.by_ref().take(remaining).read_to_end(&mut data)?;
    if (got as u64) < remaining {
      return Err(io::ErrorKind::UnexpectedEof.into());
    }
    if options.verify_crc {
      let mut crc = [0_u8; 4];
      reader.read_exact(&mut crc)?;
      if u32::from_be_bytes(crc) != chunk_crc(chunk_ty.0, &data) {
        warn!("CRC mismatch on a `{key}` {chunk_ty:?} chunk, ignoring it");
        continue;
      }
    }
    match PngTextPayload::parse(chunk_ty, &data[keyword_end + 1..])
      .and_then(|payload| payload.decode(options.max_text_len))
    {
      Some(text) => {
        debug!("found `{key}` in a {chunk_ty:?} chunk, {} bytes of text", text.len());
        return Ok(Some(text));
      }
      None => {
        debug!("couldn't decode a `{key}` {chunk_ty:?} chunk, continuing");
        if !options.verify_crc {
          skip_bytes(reader, 4)?;
        }
      }
    }
  }
}

fn skip_bytes<R: Read>(reader: &mut R, count: u64) -> io::Result<()> {
  let skipped = io::copy(&mut reader.by_ref().take(count), &mut io::sink())?;
  if skipped < count {
    Err(io::ErrorKind::UnexpectedEof.into())
  } else {
    Ok(())
  }
}
