use std::io::Cursor;

use sdprompt::png::{
  extract_text_chunk, is_png_signature_correct, read_text_chunk, read_text_chunk_from_path,
  PngRawChunkIter, PngTextChunk, ReadOptions, DEFAULT_TEXT_KEY,
};
use walkdir::WalkDir;

#[test]
fn test_PngRawChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  let mut png_count = 0;
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(_) => continue,
    };
    if is_png_signature_correct(&v) {
      png_count += 1;
      assert!(PngRawChunkIter::new(&v).all(|raw| raw.is_crc_valid()), "{}", entry.path().display());
    }
    for raw in PngRawChunkIter::new(&v) {
      let _ = PngTextChunk::try_from(raw);
    }
  }
  assert!(png_count >= 3);
  // even totally random data should never panic the iterator!
  for _ in 0..10 {
    let v = super::rand_bytes(1024);
    for raw in PngRawChunkIter::new(&v) {
      let _ = PngTextChunk::try_from(raw);
    }
  }
}

#[test]
fn test_fixture_files() {
  let options = ReadOptions { verify_crc: true, ..ReadOptions::default() };
  let text = read_text_chunk_from_path("tests/fixtures/a1111_text.png", DEFAULT_TEXT_KEY, &options)
    .unwrap()
    .unwrap();
  assert!(text.starts_with("a cat sitting on a windowsill"));
  let software = read_text_chunk_from_path("tests/fixtures/a1111_text.png", "Software", &options);
  assert_eq!(software.unwrap().as_deref(), Some("sdprompt tests"));

  let params = sdprompt::read_generation_parameters("tests/fixtures/a1111_text.png").unwrap().unwrap();
  assert_eq!(params.negative_prompt.as_deref(), Some("blurry, lowres"));
  assert_eq!(params.model.name.as_deref(), Some("v1-5-pruned-emaonly"));
  assert_eq!(params.hires.denoising.as_deref(), Some("0.5"));
  assert_eq!(params.hires.calc_width, Some(1024.0));

  let params = sdprompt::read_generation_parameters("tests/fixtures/a1111_itxt.png").unwrap().unwrap();
  assert_eq!(params.prompt.as_deref(), Some("\u{732b}"));
  assert_eq!(params.sampler.as_deref(), Some("DPM++ 2M Karras"));

  let bytes = std::fs::read("tests/fixtures/no_metadata.png").unwrap();
  assert!(is_png_signature_correct(&bytes));
  assert_eq!(sdprompt::generation_parameters_from_png_bytes(&bytes), None);
  assert_eq!(sdprompt::read_generation_parameters("tests/fixtures/no_metadata.png").unwrap(), None);
}

#[test]
fn test_random_chunk_data_no_panics() {
  for _ in 0..20 {
    let junk = super::rand_bytes(300);
    for chunk_ty in [b"tEXt", b"zTXt", b"iTXt", b"abCD"] {
      let mut data = DEFAULT_TEXT_KEY.as_bytes().to_vec();
      data.push(0);
      data.extend_from_slice(&junk);
      let png = super::build_png(&[(chunk_ty, data.as_slice()), (chunk_ty, junk.as_slice())]);
      let sliced = extract_text_chunk(&png, DEFAULT_TEXT_KEY);
      let streamed = read_text_chunk(Cursor::new(&png), DEFAULT_TEXT_KEY).unwrap();
      assert_eq!(sliced, streamed);
    }
  }
}

#[test]
fn test_random_streams_are_not_found() {
  for _ in 0..10 {
    let mut v = super::rand_bytes(2048);
    assert_eq!(read_text_chunk(Cursor::new(&v), DEFAULT_TEXT_KEY).unwrap(), None);
    // a real signature, then junk
    v[..8].copy_from_slice(&sdprompt::png::PNG_SIGNATURE);
    let _ = read_text_chunk(Cursor::new(&v), DEFAULT_TEXT_KEY).unwrap();
    let _ = extract_text_chunk(&v, DEFAULT_TEXT_KEY);
  }
}

#[test]
fn test_large_chunks_are_skipped() {
  let big = vec![0xAB; 4 * 1024 * 1024];
  let text = super::text_data("parameters", "Steps: 20, Seed: 7");
  let png = super::build_png(&[(b"IDAT", big.as_slice()), (b"tEXt", text.as_slice())]);
  assert_eq!(
    read_text_chunk(Cursor::new(&png), DEFAULT_TEXT_KEY).unwrap().as_deref(),
    Some("Steps: 20, Seed: 7")
  );
}
