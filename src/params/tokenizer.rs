//! Splitting the text into prompt, negative prompt, and `key: value` pairs.
//!
//! Everything here works on `&str` and gives back sub-slices. All of the
//! delimiters are ASCII, so any index found by scanning bytes is also a char
//! boundary.

/// The marker at the start of the negative prompt's first line.
pub const NEGATIVE_PROMPT_MARKER: &str = "Negative prompt:";

/// Trims all bytes `<= 0x20` (spaces, newlines, and other control bytes) from
/// both ends.
#[inline]
#[must_use]
pub fn trim_param(text: &str) -> &str {
  text.trim_matches(|c: char| c <= ' ')
}

#[inline]
#[must_use]
const fn is_key_byte(u: u8) -> bool {
  u.is_ascii_alphanumeric() || u == b' '
}

/// Pulls the next raw parameter (`key: value` with the trailing comma removed)
/// off of the front of a parameter line.
///
/// The grammar is:
/// * key: ascii alphanumerics and spaces,
/// * a `:`,
/// * spaces or tabs,
/// * a value running to the next `,`, or a `"..."` / `{...}` value (which may
///   hold commas), followed by anything up to the next `,`.
///
/// Gives `None` when the front of the line doesn't fit the grammar: there's no
/// `:`, the value is missing, or a quote/brace is never closed.
#[must_use]
pub fn pull_raw_param(line: &str) -> Option<(&str, &str)> {
  let bytes = line.as_bytes();
  let mut i = 0;
  while i < bytes.len() && is_key_byte(bytes[i]) {
    i += 1;
  }
  if bytes.get(i) != Some(&b':') {
    return None;
  }
  i += 1;
  while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
    i += 1;
  }
  let close = match bytes.get(i)? {
    b'\n' => return None,
    b'"' => b'"',
    b'{' => b'}',
    _ => b',',
  };
  if close != b',' {
    // step past the opening quote/brace, then it must be closed.
    i += 1;
    while i < bytes.len() && bytes[i] != close {
      i += 1;
    }
    if i == bytes.len() {
      return None;
    }
  }
  while i < bytes.len() && bytes[i] != b',' {
    i += 1;
  }
  let param = &line[..i];
  let rest = if i < bytes.len() { &line[i + 1..] } else { &line[i..] };
  Some((param, rest))
}

/// Splits a raw parameter at its first `:` into a trimmed key and value.
///
/// A value fully wrapped in double quotes has the quotes removed.
#[must_use]
pub fn split_raw_param(param: &str) -> (&str, &str) {
  let (key, value) = param.split_once(':').unwrap_or((param, ""));
  let value = trim_param(value);
  let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
    Some(inner) => trim_param(inner),
    None => value,
  };
  (trim_param(key), value)
}

/// An iterator over the `(key, value)` pairs of a parameter line.
///
/// Pairs with an empty key or value are passed over. Iteration stops at the
/// first spot that doesn't fit the grammar (see [`pull_raw_param`]), keeping
/// everything before it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamTokens<'s> {
  rest: &'s str,
}
impl<'s> ParamTokens<'s> {
  #[inline]
  #[must_use]
  pub const fn new(line: &'s str) -> Self {
    Self { rest: line }
  }
}
impl<'s> Iterator for ParamTokens<'s> {
  type Item = (&'s str, &'s str);
  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let (param, rest) = pull_raw_param(self.rest)?;
      self.rest = rest;
      match split_raw_param(param) {
        ("", _) | (_, "") => continue,
        pair => return Some(pair),
      }
    }
  }
}

/// If at least two parameters can be read from the front of the line.
#[must_use]
pub fn is_parameter_line(line: &str) -> bool {
  pull_raw_param(line).and_then(|(_, rest)| pull_raw_param(rest)).is_some()
}

/// Splits off the final line, if it's a parameter line.
///
/// A single trailing newline doesn't count as starting a new line. When the
/// text has no other newline, the whole text is the candidate line.
///
/// Gives `(prompt_region, Some(parameter_line))`, or `(text, None)` when the
/// last line isn't parameters.
#[must_use]
pub fn split_parameter_line(text: &str) -> (&str, Option<&str>) {
  let searched = text.strip_suffix('\n').unwrap_or(text);
  let line_start = match searched.rfind('\n') {
    Some(newline) => newline + 1,
    None => 0,
  };
  let line = &text[line_start..];
  if line.is_empty() || !is_parameter_line(line) {
    return (text, None);
  }
  let prompt_region = text[..line_start].strip_suffix('\n').unwrap_or(&text[..line_start]);
  (prompt_region, Some(line))
}

/// Splits the prompt region at the first line starting with
/// [`NEGATIVE_PROMPT_MARKER`].
///
/// Gives `(prompt, Some(negative_prompt))` with the marker removed from the
/// negative prompt, or `(prompt_region, None)` if there's no marker. Neither
/// part is trimmed.
#[must_use]
pub fn split_negative_prompt(prompt_region: &str) -> (&str, Option<&str>) {
  let mut line_start = 0;
  while line_start < prompt_region.len() {
    let line = &prompt_region[line_start..];
    if let Some(negative) = line.strip_prefix(NEGATIVE_PROMPT_MARKER) {
      return (&prompt_region[..line_start], Some(negative));
    }
    match line.find('\n') {
      Some(newline) => {
        // blank lines in a row are all passed over.
        let after = &line[newline..];
        line_start += newline + (after.len() - after.trim_start_matches('\n').len());
      }
      None => break,
    }
  }
  (prompt_region, None)
}

#[test]
fn test_pull_raw_param() {
  assert_eq!(pull_raw_param("Steps: 20, Seed: 1"), Some(("Steps: 20", " Seed: 1")));
  assert_eq!(pull_raw_param("Seed: 1"), Some(("Seed: 1", "")));
  assert_eq!(pull_raw_param("Model: \"a, b\", Steps: 2"), Some(("Model: \"a, b\"", " Steps: 2")));
  assert_eq!(pull_raw_param("Lora: {x: 1, y: 2} junk, Steps: 2"), Some(("Lora: {x: 1, y: 2} junk", " Steps: 2")));
  // no separator, bad key characters, missing value, unterminated values
  assert_eq!(pull_raw_param("just words"), None);
  assert_eq!(pull_raw_param("Some_key: 1, Steps: 2"), None);
  assert_eq!(pull_raw_param("Steps:   "), None);
  assert_eq!(pull_raw_param("Steps: \n"), None);
  assert_eq!(pull_raw_param("Model: \"open, Steps: 2"), None);
  assert_eq!(pull_raw_param("Lora: {open, Steps: 2"), None);
  assert_eq!(pull_raw_param(""), None);
}

#[test]
fn test_split_raw_param() {
  assert_eq!(split_raw_param(" Steps :  20 "), ("Steps", "20"));
  assert_eq!(split_raw_param("Model: \"foo, bar\""), ("Model", "foo, bar"));
  assert_eq!(split_raw_param("Lora: {a: 1}"), ("Lora", "{a: 1}"));
  assert_eq!(split_raw_param("Time: 12:30"), ("Time", "12:30"));
  assert_eq!(split_raw_param("Empty: \"\""), ("Empty", ""));
}

#[test]
fn test_param_tokens_skips_empty_pairs() {
  let pairs: Vec<_> = ParamTokens::new("Steps: 20, : 3, Seed: 5,").collect();
  assert_eq!(pairs, vec![("Steps", "20"), ("Seed", "5")]);
  let pairs: Vec<_> = ParamTokens::new("Blank: ,Seed: 5").collect();
  assert_eq!(pairs, vec![("Seed", "5")]);
}

#[test]
fn test_split_parameter_line() {
  assert_eq!(split_parameter_line(""), ("", None));
  assert_eq!(split_parameter_line("\n"), ("\n", None));
  assert_eq!(split_parameter_line("a cat"), ("a cat", None));
  assert_eq!(split_parameter_line("caf\u{e9}"), ("caf\u{e9}", None));
  assert_eq!(split_parameter_line("Steps: 1, Seed: 2"), ("", Some("Steps: 1, Seed: 2")));
  assert_eq!(split_parameter_line("a cat\nSteps: 1, Seed: 2\n"), ("a cat", Some("Steps: 1, Seed: 2\n")));
  assert_eq!(split_parameter_line("a cat\nSteps: 1"), ("a cat\nSteps: 1", None));
}

#[test]
fn test_split_negative_prompt() {
  assert_eq!(split_negative_prompt("a cat\nNegative prompt: dog"), ("a cat\n", Some(" dog")));
  assert_eq!(split_negative_prompt("Negative prompt: dog\nmore"), ("", Some(" dog\nmore")));
  assert_eq!(split_negative_prompt("a\n\n\nNegative prompt:x"), ("a\n\n\n", Some("x")));
  // only at the start of a line
  assert_eq!(split_negative_prompt("a Negative prompt: dog"), ("a Negative prompt: dog", None));
  assert_eq!(split_negative_prompt("negative prompt: dog"), ("negative prompt: dog", None));
}
