use super::*;

/// The body of a textual data chunk, after the keyword and its null byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PngTextPayload<'b> {
  /// `tEXt`: Latin-1 text, stored as-is.
  Latin1(&'b [u8]),
  /// `zTXt`: a zlib stream that inflates to Latin-1 text.
  Compressed(&'b [u8]),
  /// `iTXt`: UTF-8 text, possibly zlib compressed.
  International {
    is_compressed: bool,
    lang: &'b [u8],
    translated_keyword: &'b [u8],
    text: &'b [u8],
  },
}
impl<'b> PngTextPayload<'b> {
  /// Splits up the bytes that follow the keyword's null byte.
  ///
  /// Gives `None` for non-text chunk types, or if the chunk's fields are
  /// malformed (eg: an unknown compression method).
  #[must_use]
  pub fn parse(chunk_ty: PngRawChunkType, body: &'b [u8]) -> Option<Self> {
    match chunk_ty {
      PngRawChunkType::tEXt => Some(Self::Latin1(body)),
      PngRawChunkType::zTXt => match body {
        [0, zlib_data @ ..] => Some(Self::Compressed(zlib_data)),
        _ => None,
      },
      PngRawChunkType::iTXt => {
        let (is_compressed, rest) = match body {
          [0, _, rest @ ..] => (false, rest),
          [1, 0, rest @ ..] => (true, rest),
          _ => return None,
        };
        let mut it = rest.splitn(3, |u| u == &0_u8);
        let lang = it.next()?;
        let translated_keyword = it.next()?;
        let text = it.next()?;
        Some(Self::International { is_compressed, lang, translated_keyword, text })
      }
      _ => None,
    }
  }

  /// Decodes the payload into a string.
  ///
  /// Compressed text is inflated to at most `max_len` bytes. That needs the
  /// `miniz_oxide` feature, without it compressed payloads give `None`.
  #[must_use]
  pub fn decode(&self, max_len: usize) -> Option<String> {
    match *self {
      Self::Latin1(text) => Some(decode_latin1(text)),
      Self::Compressed(zlib_data) => inflate(zlib_data, max_len).map(|v| decode_latin1(&v)),
      Self::International { is_compressed: false, text, .. } => {
        Some(String::from_utf8_lossy(text).into_owned())
      }
      Self::International { is_compressed: true, text, .. } => {
        inflate(text, max_len).map(|v| String::from_utf8_lossy(&v).into_owned())
      }
    }
  }
}

/// A parsed `tEXt`, `zTXt`, or `iTXt` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PngTextChunk<'b> {
  /// Should be 1-79 bytes of Latin-1.
  pub keyword: &'b [u8],
  pub payload: PngTextPayload<'b>,
}
impl<'b> TryFrom<PngRawChunk<'b>> for PngTextChunk<'b> {
  type Error = PngRawChunk<'b>;
  #[inline]
  fn try_from(raw: PngRawChunk<'b>) -> Result<Self, Self::Error> {
    let mut it = raw.data.splitn(2, |u| u == &0_u8);
    let keyword = it.next().ok_or(raw)?;
    let body = it.next().ok_or(raw)?;
    let payload = PngTextPayload::parse(raw.type_, body).ok_or(raw)?;
    Ok(Self { keyword, payload })
  }
}
impl PngTextChunk<'_> {
  #[inline]
  #[must_use]
  pub fn keyword_is(&self, key: &str) -> bool {
    self.keyword == key.as_bytes()
  }
}

/// Text that's meant to be Latin-1 is very often UTF-8 in practice, so valid
/// UTF-8 is taken as such and anything else is mapped byte-per-char.
#[must_use]
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
  match core::str::from_utf8(bytes) {
    Ok(s) => s.to_owned(),
    Err(_) => bytes.iter().map(|&u| u as char).collect(),
  }
}

#[cfg(feature = "miniz_oxide")]
fn inflate(zlib_data: &[u8], max_len: usize) -> Option<Vec<u8>> {
  match miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(zlib_data, max_len) {
    Ok(v) => Some(v),
    Err(e) => {
      log::warn!("text chunk decompression failed: {e:?}");
      None
    }
  }
}

#[cfg(not(feature = "miniz_oxide"))]
fn inflate(_zlib_data: &[u8], _max_len: usize) -> Option<Vec<u8>> {
  log::debug!("skipping compressed text, the `miniz_oxide` feature is disabled");
  None
}

#[test]
fn test_decode_latin1() {
  assert_eq!(decode_latin1(b"plain"), "plain");
  assert_eq!(decode_latin1("caf\u{e9}".as_bytes()), "caf\u{e9}");
  // 0xE9 alone isn't UTF-8, so it's Latin-1 e-acute.
  assert_eq!(decode_latin1(b"caf\xE9"), "caf\u{e9}");
}

#[test]
fn test_itxt_payload_fields() {
  let body = b"\x00\x00en\x00Parameter\x00hello";
  let payload = PngTextPayload::parse(PngRawChunkType::iTXt, body).unwrap();
  assert_eq!(
    payload,
    PngTextPayload::International {
      is_compressed: false,
      lang: b"en",
      translated_keyword: b"Parameter",
      text: b"hello",
    }
  );
  assert_eq!(payload.decode(1024).as_deref(), Some("hello"));
  // bad compression method
  assert_eq!(PngTextPayload::parse(PngRawChunkType::iTXt, b"\x01\x07\x00\x00x"), None);
  // zTXt must use method 0
  assert_eq!(PngTextPayload::parse(PngRawChunkType::zTXt, b"\x03abc"), None);
}
