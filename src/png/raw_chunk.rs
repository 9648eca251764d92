use super::*;

/// A four byte PNG chunk type tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngRawChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl PngRawChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const IEND: Self = Self(*b"IEND");
  pub const tEXt: Self = Self(*b"tEXt");
  pub const zTXt: Self = Self(*b"zTXt");
  pub const iTXt: Self = Self(*b"iTXt");

  /// If this is one of the three textual data chunk types.
  #[inline]
  #[must_use]
  pub const fn is_text(self) -> bool {
    matches!(&self.0, b"tEXt" | b"zTXt" | b"iTXt")
  }
}
impl Debug for PngRawChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    Ok(())
  }
}

/// The 8 bytes at the start of every chunk: a big-endian length, then the
/// chunk type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct PngChunkHeader {
  pub(crate) length: [u8; 4],
  pub(crate) chunk_ty: [u8; 4],
}
impl PngChunkHeader {
  #[inline]
  #[must_use]
  pub(crate) const fn length(&self) -> u32 {
    u32::from_be_bytes(self.length)
  }

  #[inline]
  #[must_use]
  pub(crate) const fn chunk_ty(&self) -> PngRawChunkType {
    PngRawChunkType(self.chunk_ty)
  }
}

/// An unparsed chunk from a PNG.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PngRawChunk<'b> {
  pub(crate) type_: PngRawChunkType,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl Debug for PngRawChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngRawChunk")
      .field("type_", &self.type_)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl<'b> PngRawChunk<'b> {
  #[inline]
  #[must_use]
  pub const fn chunk_type(&self) -> PngRawChunkType {
    self.type_
  }

  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }

  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }

  /// The CRC computed from the chunk's type and data.
  #[inline]
  #[must_use]
  pub fn actual_crc(&self) -> u32 {
    chunk_crc(self.type_.0, self.data)
  }

  #[inline]
  #[must_use]
  pub fn is_crc_valid(&self) -> bool {
    self.actual_crc() == self.declared_crc
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// The iterator ends at the first chunk that doesn't fully fit in the
/// remaining bytes, so truncated data just gives fewer chunks. Any byte
/// sequence at all is safe to iterate, it can't panic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngRawChunkIter<'b>(pub(crate) &'b [u8]);
impl<'b> PngRawChunkIter<'b> {
  /// Pass the full PNG bytes, it will remove the PNG signature automatically.
  ///
  /// The signature bytes aren't checked, use [`is_png_signature_correct`] for
  /// that.
  #[inline]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }
}
impl<'b> Iterator for PngRawChunkIter<'b> {
  type Item = PngRawChunk<'b>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    let (header, rest) = try_pull_pod::<PngChunkHeader>(self.0)?;
    self.0 = rest;
    let chunk_len = header.length() as usize;
    let data: &'b [u8] = if self.0.len() >= chunk_len {
      let (data, rest) = self.0.split_at(chunk_len);
      self.0 = rest;
      data
    } else {
      self.0 = &[];
      return None;
    };
    let (crc_bytes, rest) = try_pull_byte_array::<4>(self.0)?;
    self.0 = rest;
    Some(PngRawChunk { type_: header.chunk_ty(), data, declared_crc: u32::from_be_bytes(crc_bytes) })
  }
}

#[inline]
fn try_pull_byte_array<const N: usize>(bytes: &[u8]) -> Option<([u8; N], &[u8])> {
  if bytes.len() >= N {
    let (head, tail) = bytes.split_at(N);
    let a: [u8; N] = head.try_into().ok()?;
    Some((a, tail))
  } else {
    None
  }
}

#[inline]
fn try_pull_pod<T: Pod>(bytes: &[u8]) -> Option<(T, &[u8])> {
  let position = size_of::<T>();
  if bytes.len() >= position {
    let (head, tail) = bytes.split_at(position);
    Some((pod_read_unaligned(head), tail))
  } else {
    None
  }
}
