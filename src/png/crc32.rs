const CRC_POLYNOMIAL: u32 = 0xEDB8_8320;

const fn crc_table_entry(index: u32) -> u32 {
  let mut c = index;
  let mut bit = 0;
  while bit < 8 {
    c = if c & 1 == 1 { CRC_POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
    bit += 1;
  }
  c
}

const CRC_TABLE: [u32; 256] = {
  let mut table = [0; 256];
  let mut i = 0;
  while i < table.len() {
    table[i] = crc_table_entry(i as u32);
    i += 1;
  }
  table
};

/// Computes the CRC a PNG chunk should declare.
///
/// The CRC covers the chunk type and the chunk data, but *not* the length.
#[inline]
#[must_use]
pub fn chunk_crc(chunk_ty: [u8; 4], data: &[u8]) -> u32 {
  let crc = chunk_ty
    .iter()
    .chain(data)
    .fold(u32::MAX, |crc, &u| CRC_TABLE[usize::from(crc as u8 ^ u)] ^ (crc >> 8));
  !crc
}

#[test]
fn test_chunk_crc_known_values() {
  // the IEND chunk of every PNG ends with these bytes.
  assert_eq!(chunk_crc(*b"IEND", &[]), 0xAE42_6082);
  // standard check value for the "123456789" string, split across the type.
  assert_eq!(chunk_crc(*b"1234", b"56789"), 0xCBF4_3926);
}
