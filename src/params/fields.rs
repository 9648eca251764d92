use super::*;

/// A field of [`GenerationParameters`] that a parameter line key maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamField {
  Prompt,
  NegativePrompt,
  WildcardPrompt,
  ModelName,
  ModelHash,
  Sampler,
  Steps,
  CfgScale,
  Seed,
  Denoising,
  HiresUpscaler,
  HiresSteps,
  HiresUpscale,
  MaskBlur,
  Eta,
  Ensd,
  ClipSkip,
  /// `WIDTHxHEIGHT`, sets both `width` and `height`.
  Size,
  /// `WIDTHxHEIGHT`, sets both `hires.width` and `hires.height`.
  HiresResize,
}

/// Every recognized key, in the same order as the [`ParamField`] variants.
/// Keys are matched case-sensitively.
pub const KNOWN_KEYS: [(&str, ParamField); 19] = [
  ("Prompt", ParamField::Prompt),
  ("Negative prompt", ParamField::NegativePrompt),
  ("Wildcard prompt", ParamField::WildcardPrompt),
  ("Model", ParamField::ModelName),
  ("Model hash", ParamField::ModelHash),
  ("Sampler", ParamField::Sampler),
  ("Steps", ParamField::Steps),
  ("CFG scale", ParamField::CfgScale),
  ("Seed", ParamField::Seed),
  ("Denoising strength", ParamField::Denoising),
  ("Hires upscaler", ParamField::HiresUpscaler),
  ("Hires steps", ParamField::HiresSteps),
  ("Hires upscale", ParamField::HiresUpscale),
  ("Mask blur", ParamField::MaskBlur),
  ("Eta", ParamField::Eta),
  ("ENSD", ParamField::Ensd),
  ("Clip skip", ParamField::ClipSkip),
  ("Size", ParamField::Size),
  ("Hires resize", ParamField::HiresResize),
];

impl ParamField {
  /// Looks up a key in [`KNOWN_KEYS`].
  #[inline]
  #[must_use]
  pub fn from_key(key: &str) -> Option<Self> {
    KNOWN_KEYS.iter().find(|(k, _)| *k == key).map(|(_, field)| *field)
  }

  /// The key this field is written under.
  #[inline]
  #[must_use]
  pub const fn key(self) -> &'static str {
    // the table is in variant order
    KNOWN_KEYS[self as usize].0
  }

  /// Stores a value into the field of the record. An existing value is
  /// replaced.
  pub(crate) fn assign(self, params: &mut GenerationParameters, value: &str) {
    let slot = match self {
      Self::Size => {
        let (w, h) = split_dimensions(value);
        params.width = w;
        params.height = h;
        return;
      }
      Self::HiresResize => {
        let (w, h) = split_dimensions(value);
        params.hires.width = w;
        params.hires.height = h;
        return;
      }
      Self::Prompt => &mut params.prompt,
      Self::NegativePrompt => &mut params.negative_prompt,
      Self::WildcardPrompt => &mut params.wildcard_prompt,
      Self::ModelName => &mut params.model.name,
      Self::ModelHash => &mut params.model.hash,
      Self::Sampler => &mut params.sampler,
      Self::Steps => &mut params.steps,
      Self::CfgScale => &mut params.cfg_scale,
      Self::Seed => &mut params.seed,
      Self::Denoising => &mut params.denoising,
      Self::HiresUpscaler => &mut params.hires.upscaler,
      Self::HiresSteps => &mut params.hires.steps,
      Self::HiresUpscale => &mut params.hires.upscale,
      Self::MaskBlur => &mut params.inpaint.mask_blur,
      Self::Eta => &mut params.settings.eta,
      Self::Ensd => &mut params.settings.ensd,
      Self::ClipSkip => &mut params.settings.clip_skip,
    };
    *slot = owned_trimmed(value);
  }
}

/// Splits a `WIDTHxHEIGHT` value.
///
/// The width is the leading run of digits, then exactly one separator char is
/// skipped, and whatever's left is the height. Either side can come out
/// missing.
#[must_use]
pub fn split_dimensions(value: &str) -> (Option<String>, Option<String>) {
  let digits_end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
  let (width, rest) = value.split_at(digits_end);
  let mut chars = rest.chars();
  chars.next();
  (owned_trimmed(width), owned_trimmed(chars.as_str()))
}

#[test]
fn test_key_table_is_consistent() {
  for (key, field) in KNOWN_KEYS {
    assert_eq!(ParamField::from_key(key), Some(field));
    assert_eq!(field.key(), key);
  }
  assert_eq!(ParamField::from_key("steps"), None);
  assert_eq!(ParamField::from_key("Lora hashes"), None);
}

#[test]
fn test_split_dimensions() {
  let s = |w: &str, h: &str| (Some(w.to_owned()), Some(h.to_owned()));
  assert_eq!(split_dimensions("512x768"), s("512", "768"));
  assert_eq!(split_dimensions("1024\u{d7}576"), s("1024", "576"));
  assert_eq!(split_dimensions("512"), (Some("512".to_owned()), None));
  assert_eq!(split_dimensions("x768"), (None, Some("768".to_owned())));
  assert_eq!(split_dimensions(""), (None, None));
}
