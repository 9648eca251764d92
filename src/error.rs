use std::{io, path::PathBuf};

/// An error from extracting generation metadata.
///
/// Only I/O failures at the start of a stream are errors. A PNG that's
/// corrupted, truncated, or just doesn't carry the requested text is reported
/// as "not found" instead, since most images simply don't have any Stable
/// Diffusion metadata and that's not something to alarm anyone about.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
  /// The file couldn't be opened.
  #[error("could not open `{}`: {source}", path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Reading the stream failed before the PNG signature could be checked.
  #[error("read failed: {0}")]
  Io(#[from] io::Error),
}

pub type ExtractResult<T> = Result<T, ExtractError>;
