#![forbid(unsafe_code)]

//! Parses Stable Diffusion generation parameters.
//!
//! The text that AUTOMATIC1111's WebUI (and the many tools that copy it)
//! embeds in an image looks like this:
//!
//! ```text
//! masterpiece, a cat sitting on a windowsill
//! Negative prompt: blurry, lowres
//! Steps: 20, Sampler: Euler a, CFG scale: 7, Seed: 1234, Size: 512x768, Model: sd15
//! ```
//!
//! * Everything up to the `Negative prompt:` line is the prompt. Prompts can
//!   span any number of lines.
//! * From the `Negative prompt:` marker up to the last line is the negative
//!   prompt. It's optional.
//! * The last line is a series of `key: value` pairs separated by commas. A
//!   value can be wrapped in `"..."` or `{...}` when it has commas of its own.
//!   The last line only counts as parameters if at least two pairs can be read
//!   from it, otherwise the whole text is prompt.
//!
//! The parser is purely syntactic. It never fails, the worst case is a record
//! with nothing in it, which [`GenerationParameters::is_empty`] tells you
//! about. Values are kept as the text they were written as, so nothing is lost
//! by reformatting numbers.
//!
//! ```
//! use sdprompt::params::parse_parameters;
//! let params = parse_parameters("a cat\nNegative prompt: blurry\nSteps: 20, Sampler: Euler a, Size: 512x768");
//! assert_eq!(params.prompt.as_deref(), Some("a cat"));
//! assert_eq!(params.negative_prompt.as_deref(), Some("blurry"));
//! assert_eq!(params.sampler.as_deref(), Some("Euler a"));
//! assert_eq!(params.width.as_deref(), Some("512"));
//! assert_eq!(params.height.as_deref(), Some("768"));
//! ```

use log::debug;

mod tokenizer;
pub use tokenizer::*;

mod fields;
pub use fields::*;

mod derived;

mod format;


/// Input past this many bytes is ignored (32 KiB).
pub const MAX_INPUT_LEN: usize = 32 * 1024;

/// Size of the slot array unknown parameters are stored in.
pub const UNKNOWNS_ARRAY_LEN: usize = 64;

/// How many unknown parameters are kept by default.
///
/// One slot of [`UNKNOWNS_ARRAY_LEN`] is held back, so this is 63. Unknown
/// parameters past this are dropped.
pub const MAX_UNKNOWNS: usize = UNKNOWNS_ARRAY_LEN - 1;

/// Bounds on how much the parser will take in and keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseLimits {
  /// Text past this many bytes is cut off (at a char boundary).
  pub max_input_len: usize,
  /// Unknown parameters past this count are silently dropped.
  pub max_unknowns: usize,
}
impl Default for ParseLimits {
  #[inline]
  #[must_use]
  fn default() -> Self {
    Self { max_input_len: MAX_INPUT_LEN, max_unknowns: MAX_UNKNOWNS }
  }
}

/// The checkpoint used.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelInfo {
  pub name: Option<String>,
  pub hash: Option<String>,
  pub has_info: bool,
}

/// The "hires. fix" second pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HiresInfo {
  pub upscaler: Option<String>,
  pub steps: Option<String>,
  pub upscale: Option<String>,
  pub width: Option<String>,
  pub height: Option<String>,
  pub denoising: Option<String>,
  /// Computed upscale factor, only when `upscale` is missing.
  pub calc_upscale: Option<f32>,
  /// Computed final width, only when `width` is missing.
  pub calc_width: Option<f32>,
  /// Computed final height, only when `height` is missing.
  pub calc_height: Option<f32>,
  pub has_info: bool,
}

/// Inpainting settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InpaintInfo {
  pub denoising: Option<String>,
  pub mask_blur: Option<String>,
  pub has_info: bool,
}

/// Override settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettingsInfo {
  pub eta: Option<String>,
  pub ensd: Option<String>,
  pub clip_skip: Option<String>,
  pub has_info: bool,
}

/// Everything recognized in a block of generation parameters text.
///
/// Every string that's present is non-empty and trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationParameters {
  pub prompt: Option<String>,
  pub negative_prompt: Option<String>,
  pub wildcard_prompt: Option<String>,
  pub sampler: Option<String>,
  pub steps: Option<String>,
  pub cfg_scale: Option<String>,
  pub seed: Option<String>,
  pub width: Option<String>,
  pub height: Option<String>,
  /// `Denoising strength`, when it doesn't belong to the inpaint or hires
  /// group.
  pub denoising: Option<String>,
  pub model: ModelInfo,
  pub hires: HiresInfo,
  pub inpaint: InpaintInfo,
  pub settings: SettingsInfo,
  /// `(key, value)` pairs with keys that aren't in [`KNOWN_KEYS`], in the
  /// order they appeared.
  pub unknowns: Vec<(String, String)>,
}

/// Parses generation parameters text using the default [`ParseLimits`].
#[inline]
#[must_use]
pub fn parse_parameters(text: &str) -> GenerationParameters {
  GenerationParameters::parse(text)
}

impl GenerationParameters {
  /// Parses generation parameters text using the default [`ParseLimits`].
  #[inline]
  #[must_use]
  pub fn parse(text: &str) -> Self {
    Self::parse_with_limits(text, ParseLimits::default())
  }

  /// Parses generation parameters text.
  #[must_use]
  pub fn parse_with_limits(text: &str, limits: ParseLimits) -> Self {
    let text = truncate_at_char_boundary(text, limits.max_input_len);
    let mut out = Self::default();

    let (prompt_region, parameter_line) = split_parameter_line(text);
    let (prompt, negative_prompt) = split_negative_prompt(prompt_region);
    out.prompt = owned_trimmed(prompt);
    out.negative_prompt = negative_prompt.and_then(owned_trimmed);

    if let Some(line) = parameter_line {
      for (key, value) in ParamTokens::new(line) {
        out.set_parameter(key, value, &limits);
      }
    }

    out.finish();
    out
  }

  /// If nothing at all was recognized.
  ///
  /// Callers should show a "no metadata" state for these.
  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  fn set_parameter(&mut self, key: &str, value: &str, limits: &ParseLimits) {
    match ParamField::from_key(key) {
      Some(field) => field.assign(self, value),
      None if self.unknowns.len() < limits.max_unknowns => {
        self.unknowns.push((key.to_owned(), value.to_owned()));
      }
      None => debug!("too many unknown parameters, dropping `{key}`"),
    }
  }
}

/// Trims the text and gives an owned copy, or `None` if nothing's left.
#[inline]
#[must_use]
pub(crate) fn owned_trimmed(text: &str) -> Option<String> {
  let text = trim_param(text);
  if text.is_empty() {
    None
  } else {
    Some(text.to_owned())
  }
}

fn truncate_at_char_boundary(text: &str, max_len: usize) -> &str {
  if text.len() <= max_len {
    return text;
  }
  let mut end = max_len;
  while !text.is_char_boundary(end) {
    end -= 1;
  }
  debug!("parameters text is {} bytes, only using the first {end}", text.len());
  &text[..end]
}
