use sdprompt::{
  generation_parameters_from_png_bytes, params::ParamTokens, parse_parameters,
  read_generation_parameters, ExtractError, GenerationParameters, ParseLimits,
};

const TEXT: &str = "a cat\nNegative prompt: blurry\nSteps: 20, Sampler: Euler a, Size: 512x768";

#[test]
fn test_png_bytes_to_parameters() {
  let png = super::build_png(&[(b"tEXt", super::text_data("parameters", TEXT).as_slice())]);
  let params = generation_parameters_from_png_bytes(&png).unwrap();
  assert_eq!(params.prompt.as_deref(), Some("a cat"));
  assert_eq!(params.negative_prompt.as_deref(), Some("blurry"));
  assert_eq!(params.steps.as_deref(), Some("20"));
  assert_eq!(params.sampler.as_deref(), Some("Euler a"));
  assert_eq!(params.width.as_deref(), Some("512"));
  assert_eq!(params.height.as_deref(), Some("768"));
}

#[test]
fn test_no_text_is_none() {
  let png = super::build_png(&[]);
  assert_eq!(generation_parameters_from_png_bytes(&png), None);
  let png = super::build_png(&[(b"tEXt", super::text_data("parameters", " \n ").as_slice())]);
  assert_eq!(generation_parameters_from_png_bytes(&png), None);
  assert_eq!(generation_parameters_from_png_bytes(b"not a png"), None);
}

#[test]
fn test_read_from_file() {
  let png = super::build_png(&[(b"tEXt", super::text_data("parameters", TEXT).as_slice())]);
  let path = std::env::temp_dir().join(format!("sdprompt-test-{}.png", std::process::id()));
  std::fs::write(&path, &png).unwrap();
  let result = read_generation_parameters(&path);
  std::fs::remove_file(&path).unwrap();
  assert_eq!(result.unwrap(), Some(parse_parameters(TEXT)));

  let missing = std::env::temp_dir().join("sdprompt-test-this-does-not-exist.png");
  assert!(matches!(read_generation_parameters(missing), Err(ExtractError::Open { .. })));
}

#[test]
fn test_nothing_recognized() {
  let params = parse_parameters("just some words, no settings at all");
  assert!(params.negative_prompt.is_none());
  assert!(!params.model.has_info);
  assert!(!params.hires.has_info);
  assert!(!params.inpaint.has_info);
  assert!(!params.settings.has_info);
  assert!(params.unknowns.is_empty());
  assert!(!params.is_empty());
  assert!(parse_parameters("").is_empty());
}

#[test]
fn test_hires_from_upscale() {
  let params = parse_parameters("Steps: 20, Size: 512x512, Hires upscale: 2, Hires steps: 10");
  assert!(params.hires.has_info);
  assert_eq!(params.hires.calc_width, Some(1024.0));
  assert_eq!(params.hires.calc_height, Some(1024.0));
}

#[test]
fn test_unknowns_cap() {
  let line: Vec<String> = (0..70).map(|i| format!("Extra{i}: {i}")).collect();
  let params = parse_parameters(&line.join(", "));
  assert_eq!(params.unknowns.len(), sdprompt::params::MAX_UNKNOWNS);
  assert_eq!(params.unknowns.last().map(|(k, _)| k.as_str()), Some("Extra62"));

  let limits = ParseLimits { max_unknowns: 70, ..ParseLimits::default() };
  let params = GenerationParameters::parse_with_limits(&line.join(", "), limits);
  assert_eq!(params.unknowns.len(), 70);
}

#[test]
fn test_round_trip_keeps_keys_and_values() {
  let line = "Steps: 30, Sampler: Euler a, CFG scale: 6, Seed: 42, Size: 640x960, Model hash: abc123, \
              Model: \"anything, v3\", Clip skip: 2, ENSD: 31337, Eta: 0.67, Mask blur: 4, \
              Denoising strength: 0.3, Wildcard prompt: __animals__, Template: {x, y}";
  let params = parse_parameters(line);
  assert_eq!(params.inpaint.denoising.as_deref(), Some("0.3"));
  let written = params.to_parameter_line();

  let mut before: Vec<(&str, &str)> = ParamTokens::new(line).collect();
  let mut after: Vec<(&str, &str)> = ParamTokens::new(&written).collect();
  before.sort_unstable();
  after.sort_unstable();
  assert_eq!(before, after);
  assert_eq!(parse_parameters(&written), params);
}

#[test]
fn test_random_text_no_panics() {
  for _ in 0..20 {
    let bytes = super::rand_bytes(512);
    let text = String::from_utf8_lossy(&bytes);
    let params = parse_parameters(&text);
    assert_eq!(params, parse_parameters(&text));
    let _ = params.to_string();
  }
  // random printable ascii with a lot of delimiters
  for _ in 0..20 {
    let text: String = super::rand_bytes(512)
      .into_iter()
      .map(|u| match u % 8 {
        0 => ',',
        1 => ':',
        2 => '\n',
        3 => '"',
        4 => '{',
        5 => '}',
        6 => ' ',
        _ => (b'a' + u % 26) as char,
      })
      .collect();
    let _ = parse_parameters(&text);
  }
}
