//! A crate for reading Stable Diffusion generation parameters out of PNG
//! files.
//!
//! Image generators (AUTOMATIC1111's WebUI and the many tools that follow its
//! format) store the prompt and settings an image was made with as a textual
//! chunk inside the PNG. Getting them back out is two steps:
//!
//! * [`png`]: find the text chunk with the right keyword.
//! * [`params`]: parse that text into a [`GenerationParameters`].
//!
//! The functions at the top level of the crate do both.
//!
//! ```no_run
//! # fn main() -> Result<(), sdprompt::ExtractError> {
//! match sdprompt::read_generation_parameters("image.png")? {
//!   Some(params) => println!("{}", params.prompt.unwrap_or_default()),
//!   None => println!("No Stable Diffusion parameters found in the image."),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! * `miniz_oxide` (default): read compressed text (`zTXt` and compressed
//!   `iTXt`). Without it those chunks are skipped.
//! * `serde`: `Serialize` and `Deserialize` for the parameter types.
//! * `cli`: the `sdprompt` command line program.

use std::path::Path;

use log::debug;

pub mod error;
pub use error::*;

pub mod png;

pub mod params;
pub use params::{parse_parameters, GenerationParameters, ParseLimits};

/// Reads and parses the `parameters` text of a PNG file.
///
/// * `Ok(Some(_))`: there was parameters text in the file.
/// * `Ok(None)`: there wasn't (or it's blank), or the file isn't a PNG.
/// * `Err(_)`: the file couldn't be opened or read at all.
pub fn read_generation_parameters(
  path: impl AsRef<Path>,
) -> ExtractResult<Option<GenerationParameters>> {
  let path = path.as_ref();
  let text =
    png::read_text_chunk_from_path(path, png::DEFAULT_TEXT_KEY, &png::ReadOptions::default())?;
  debug!("{}: {} bytes of parameters text", path.display(), text.as_ref().map_or(0, String::len));
  Ok(text.as_deref().and_then(parse_non_blank))
}

/// Finds and parses the `parameters` text of PNG bytes that are already in
/// memory.
///
/// Gives `None` if the bytes aren't a PNG or there's no (non-blank) text.
#[must_use]
pub fn generation_parameters_from_png_bytes(bytes: &[u8]) -> Option<GenerationParameters> {
  png::extract_text_chunk(bytes, png::DEFAULT_TEXT_KEY).as_deref().and_then(parse_non_blank)
}

fn parse_non_blank(text: &str) -> Option<GenerationParameters> {
  if params::trim_param(text).is_empty() {
    None
  } else {
    Some(parse_parameters(text))
  }
}
