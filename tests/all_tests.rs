#![allow(bad_style)]

mod params;
mod png;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// Builds a small PNG with the given `(chunk_type, data)` chunks placed
/// between the IHDR and IDAT chunks.
fn build_png(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
  fn push_chunk(v: &mut Vec<u8>, chunk_ty: &[u8; 4], data: &[u8]) {
    v.extend_from_slice(&(data.len() as u32).to_be_bytes());
    v.extend_from_slice(chunk_ty);
    v.extend_from_slice(data);
    v.extend_from_slice(&sdprompt::png::chunk_crc(*chunk_ty, data).to_be_bytes());
  }
  let mut v = sdprompt::png::PNG_SIGNATURE.to_vec();
  push_chunk(&mut v, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]);
  for (chunk_ty, data) in chunks {
    push_chunk(&mut v, chunk_ty, data);
  }
  push_chunk(&mut v, b"IDAT", &[0x78, 0x9C, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
  push_chunk(&mut v, b"IEND", &[]);
  v
}

fn text_data(key: &str, value: &str) -> Vec<u8> {
  let mut data = key.as_bytes().to_vec();
  data.push(0);
  data.extend_from_slice(value.as_bytes());
  data
}
