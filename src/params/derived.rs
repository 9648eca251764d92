use super::*;

impl GenerationParameters {
  /// Runs once after all the pairs have been assigned: sets the `has_info`
  /// flags, moves `denoising` into the group it belongs to, and fills in the
  /// computed hires values.
  pub(crate) fn finish(&mut self) {
    self.model.has_info = self.model.name.is_some() || self.model.hash.is_some();
    let h = &self.hires;
    self.hires.has_info = h.upscaler.is_some()
      || h.steps.is_some()
      || h.upscale.is_some()
      || h.width.is_some()
      || h.height.is_some();
    self.inpaint.has_info = self.inpaint.mask_blur.is_some();
    let s = &self.settings;
    self.settings.has_info = s.eta.is_some() || s.ensd.is_some() || s.clip_skip.is_some();

    if self.denoising.is_some() {
      if self.inpaint.has_info {
        self.inpaint.denoising = self.denoising.take();
      } else if self.hires.has_info {
        self.hires.denoising = self.denoising.take();
      }
    }

    self.compute_hires();
  }

  fn compute_hires(&mut self) {
    let width = leading_number(self.width.as_deref());
    let height = leading_number(self.height.as_deref());
    let hires_width = leading_number(self.hires.width.as_deref());
    let hires_height = leading_number(self.hires.height.as_deref());
    let upscale = leading_number(self.hires.upscale.as_deref());

    if hires_width == 0.0 && width > 0.0 && upscale > 0.0 {
      self.hires.calc_width = Some(width * upscale);
    }
    if hires_height == 0.0 && height > 0.0 && upscale > 0.0 {
      self.hires.calc_height = Some(height * upscale);
    }
    if upscale == 0.0 {
      let ratios = [(hires_width, width), (hires_height, height)];
      let (sum, count) = ratios
        .iter()
        .filter(|(num, den)| *num > 0.0 && *den > 0.0)
        .fold((0.0, 0_u32), |(sum, count), (num, den)| (sum + num / den, count + 1));
      if count > 0 {
        self.hires.calc_upscale = Some(sum / count as f32);
      }
    }
  }
}

/// Reads the number at the start of the text, the way C's `strtod` does.
///
/// Leading whitespace is skipped and anything after the number is ignored
/// (`"2.5x"` is `2.5`). Missing text, no number, or a non-finite result all
/// give `0.0`.
#[must_use]
pub(crate) fn leading_number(text: Option<&str>) -> f32 {
  let text = match text {
    Some(text) => text.trim_start(),
    None => return 0.0,
  };
  let bytes = text.as_bytes();
  let mut end = 0;
  if matches!(bytes.first(), Some(b'+' | b'-')) {
    end += 1;
  }
  let digits_start = end;
  while end < bytes.len() && bytes[end].is_ascii_digit() {
    end += 1;
  }
  let mut mantissa_digits = end - digits_start;
  if bytes.get(end) == Some(&b'.') {
    let frac_start = end + 1;
    let mut frac_end = frac_start;
    while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
      frac_end += 1;
    }
    mantissa_digits += frac_end - frac_start;
    end = frac_end;
  }
  if mantissa_digits == 0 {
    return 0.0;
  }
  // the exponent only counts if it has digits
  if matches!(bytes.get(end), Some(b'e' | b'E')) {
    let mut exp_end = end + 1;
    if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
      exp_end += 1;
    }
    let exp_digits_start = exp_end;
    while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
      exp_end += 1;
    }
    if exp_end > exp_digits_start {
      end = exp_end;
    }
  }
  match text[..end].parse::<f32>() {
    Ok(f) if f.is_finite() => f,
    _ => 0.0,
  }
}

#[test]
fn test_leading_number() {
  assert_eq!(leading_number(None), 0.0);
  assert_eq!(leading_number(Some("")), 0.0);
  assert_eq!(leading_number(Some("512")), 512.0);
  assert_eq!(leading_number(Some(" 2.5x")), 2.5);
  assert_eq!(leading_number(Some("1.")), 1.0);
  assert_eq!(leading_number(Some(".5")), 0.5);
  assert_eq!(leading_number(Some("-3")), -3.0);
  assert_eq!(leading_number(Some("1e2")), 100.0);
  assert_eq!(leading_number(Some("1e")), 1.0);
  assert_eq!(leading_number(Some("abc")), 0.0);
  assert_eq!(leading_number(Some(".")), 0.0);
  assert_eq!(leading_number(Some("1e99")), 0.0);
}

#[test]
fn test_denoising_goes_to_one_place() {
  let mut p = GenerationParameters { denoising: Some("0.4".into()), ..Default::default() };
  p.finish();
  assert_eq!(p.denoising.as_deref(), Some("0.4"));
  assert_eq!(p.hires.denoising, None);
  assert_eq!(p.inpaint.denoising, None);

  let mut p = GenerationParameters { denoising: Some("0.4".into()), ..Default::default() };
  p.hires.steps = Some("10".into());
  p.finish();
  assert_eq!(p.denoising, None);
  assert_eq!(p.hires.denoising.as_deref(), Some("0.4"));

  // inpaint wins over hires
  let mut p = GenerationParameters { denoising: Some("0.4".into()), ..Default::default() };
  p.hires.steps = Some("10".into());
  p.inpaint.mask_blur = Some("4".into());
  p.finish();
  assert_eq!(p.denoising, None);
  assert_eq!(p.hires.denoising, None);
  assert_eq!(p.inpaint.denoising.as_deref(), Some("0.4"));
  assert!(p.inpaint.has_info);
}
