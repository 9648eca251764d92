use super::*;

use std::{
  borrow::Cow,
  fmt::{self, Display},
};

impl HiresInfo {
  /// The hires width as text: the written value, or else the computed one
  /// with no decimals.
  #[must_use]
  pub fn width_text(&self) -> Option<Cow<'_, str>> {
    text_or_float(self.width.as_deref(), self.calc_width, 0)
  }

  /// The hires height as text: the written value, or else the computed one
  /// with no decimals.
  #[must_use]
  pub fn height_text(&self) -> Option<Cow<'_, str>> {
    text_or_float(self.height.as_deref(), self.calc_height, 0)
  }

  /// The hires upscale factor as text: the written value, or else the
  /// computed one with two decimals.
  #[must_use]
  pub fn upscale_text(&self) -> Option<Cow<'_, str>> {
    text_or_float(self.upscale.as_deref(), self.calc_upscale, 2)
  }
}

fn text_or_float(text: Option<&str>, calc: Option<f32>, precision: usize) -> Option<Cow<'_, str>> {
  match (text, calc) {
    (Some(text), _) => Some(Cow::Borrowed(text)),
    (None, Some(f)) => Some(Cow::Owned(format!("{f:.precision$}"))),
    (None, None) => None,
  }
}

impl GenerationParameters {
  /// Writes the recognized fields and the unknowns back out as a parameter
  /// line.
  ///
  /// The prompt and negative prompt aren't included, and neither are computed
  /// values. Each value is written bare if that reads back as the same value,
  /// otherwise it's wrapped in `"`.
  #[must_use]
  pub fn to_parameter_line(&self) -> String {
    let denoising = self.denoising.as_ref().or(self.inpaint.denoising.as_ref());
    let denoising = denoising.or(self.hires.denoising.as_ref());
    let known = [
      (ParamField::Steps, borrowed(self.steps.as_ref())),
      (ParamField::Sampler, borrowed(self.sampler.as_ref())),
      (ParamField::CfgScale, borrowed(self.cfg_scale.as_ref())),
      (ParamField::Seed, borrowed(self.seed.as_ref())),
      (ParamField::Size, dimensions(self.width.as_ref(), self.height.as_ref())),
      (ParamField::ModelHash, borrowed(self.model.hash.as_ref())),
      (ParamField::ModelName, borrowed(self.model.name.as_ref())),
      (ParamField::Denoising, borrowed(denoising)),
      (ParamField::ClipSkip, borrowed(self.settings.clip_skip.as_ref())),
      (ParamField::Ensd, borrowed(self.settings.ensd.as_ref())),
      (ParamField::Eta, borrowed(self.settings.eta.as_ref())),
      (ParamField::MaskBlur, borrowed(self.inpaint.mask_blur.as_ref())),
      (ParamField::HiresUpscale, borrowed(self.hires.upscale.as_ref())),
      (ParamField::HiresResize, dimensions(self.hires.width.as_ref(), self.hires.height.as_ref())),
      (ParamField::HiresSteps, borrowed(self.hires.steps.as_ref())),
      (ParamField::HiresUpscaler, borrowed(self.hires.upscaler.as_ref())),
      (ParamField::WildcardPrompt, borrowed(self.wildcard_prompt.as_ref())),
    ];
    let known = known.into_iter().filter_map(|(field, value)| Some((field.key(), value?)));
    let unknowns = self.unknowns.iter().map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str())));

    let mut line = String::new();
    for (key, value) in known.chain(unknowns) {
      if !line.is_empty() {
        line.push_str(", ");
      }
      line.push_str(key);
      line.push_str(": ");
      push_value(&mut line, &value);
    }
    line
  }
}

#[inline]
fn borrowed(value: Option<&String>) -> Option<Cow<'_, str>> {
  value.map(|v| Cow::Borrowed(v.as_str()))
}

fn dimensions<'s>(width: Option<&'s String>, height: Option<&'s String>) -> Option<Cow<'s, str>> {
  match (width, height) {
    (Some(w), Some(h)) => Some(Cow::Owned(format!("{w}x{h}"))),
    (Some(w), None) => Some(Cow::Borrowed(w.as_str())),
    (None, Some(h)) => Some(Cow::Owned(format!("x{h}"))),
    (None, None) => None,
  }
}

fn push_value(line: &mut String, value: &str) {
  if reads_back_as(value, value) {
    line.push_str(value);
  } else {
    // a few values (a `"` followed later by a `,`) can't be written in any
    // form that reads back exactly, those get quoted anyway.
    line.push('"');
    line.push_str(value);
    line.push('"');
  }
}

/// If `written`, as the last value of a parameter line, parses back as
/// exactly `value`.
fn reads_back_as(written: &str, value: &str) -> bool {
  let param = format!("k: {written}");
  match pull_raw_param(&param) {
    Some((param, "")) => split_raw_param(param).1 == value,
    _ => false,
  }
}

/// Writes the text in the shape generators embed it: the prompt, a
/// `Negative prompt:` line, and the parameter line. Empty parts are left out.
impl Display for GenerationParameters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut parts: Vec<Cow<'_, str>> = Vec::new();
    if let Some(prompt) = &self.prompt {
      parts.push(Cow::Borrowed(prompt));
    }
    if let Some(negative) = &self.negative_prompt {
      parts.push(Cow::Owned(format!("{NEGATIVE_PROMPT_MARKER} {negative}")));
    }
    let line = self.to_parameter_line();
    if !line.is_empty() {
      parts.push(Cow::Owned(line));
    }
    for (i, part) in parts.iter().enumerate() {
      if i > 0 {
        f.write_str("\n")?;
      }
      f.write_str(part)?;
    }
    Ok(())
  }
}

#[test]
fn test_hires_text_prefers_written_values() {
  let mut h = HiresInfo { calc_width: Some(1024.0), calc_upscale: Some(1.5), ..Default::default() };
  assert_eq!(h.width_text().as_deref(), Some("1024"));
  assert_eq!(h.height_text(), None);
  assert_eq!(h.upscale_text().as_deref(), Some("1.50"));
  h.width = Some("1000".into());
  assert_eq!(h.width_text().as_deref(), Some("1000"));
}

#[test]
fn test_push_value_quoting() {
  let written = |value: &str| {
    let mut line = String::new();
    push_value(&mut line, value);
    line
  };
  assert_eq!(written("foo bar"), "foo bar");
  assert_eq!(written("foo, bar"), "\"foo, bar\"");
  assert_eq!(written("{a: 1, b: 2}"), "{a: 1, b: 2}");
  // already one token as written
  assert_eq!(written("\"a, b\" extra"), "\"a, b\" extra");
  // bare, these would lose their outer quotes or never close
  assert_eq!(written("\"a\" b \"c\""), "\"\"a\" b \"c\"\"");
  assert_eq!(written("{open"), "\"{open\"");
}
