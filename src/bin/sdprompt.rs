use std::{
  io::{self, Write},
  path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use sdprompt::{
  png::{read_text_chunk_from_path, ReadOptions, DEFAULT_TEXT_KEY},
  GenerationParameters,
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "sdprompt", version, about = "Shows the Stable Diffusion parameters stored in PNG files")]
struct Args {
  /// PNG files, or directories when used with --recursive
  #[arg(required = true)]
  paths: Vec<PathBuf>,

  /// Keyword of the text chunk to read
  #[arg(long, default_value = DEFAULT_TEXT_KEY)]
  key: String,

  /// Print the text as it's stored, without parsing it
  #[arg(long, conflicts_with = "json")]
  raw: bool,

  /// Print the parsed parameters as JSON
  #[arg(long)]
  json: bool,

  /// Also print parameters that aren't recognized
  #[arg(long)]
  show_unknowns: bool,

  /// Ignore text chunks with a bad CRC
  #[arg(long)]
  verify_crc: bool,

  /// Search directories for .png files
  #[arg(short, long)]
  recursive: bool,
}

fn main() -> anyhow::Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
    .target(env_logger::Target::Stderr)
    .init();

  let args = Args::parse();
  let options = ReadOptions { verify_crc: args.verify_crc, ..ReadOptions::default() };

  let mut files = Vec::new();
  for path in &args.paths {
    if path.is_dir() {
      if args.recursive {
        collect_pngs(path, &mut files);
      } else {
        log::warn!("{} is a directory, use --recursive to search it", path.display());
      }
    } else {
      files.push(path.clone());
    }
  }

  let stdout = io::stdout();
  let mut out = stdout.lock();
  let mut failures = 0_usize;
  let show_headers = files.len() > 1 || args.recursive;
  for (i, file) in files.iter().enumerate() {
    let text = match read_text_chunk_from_path(file, &args.key, &options) {
      Ok(text) => text.filter(|t| !sdprompt::params::trim_param(t).is_empty()),
      Err(e) => {
        log::error!("{e}");
        failures += 1;
        continue;
      }
    };
    if args.json {
      let params = text.as_deref().map(GenerationParameters::parse);
      let value = serde_json::json!({ "path": file.display().to_string(), "parameters": params });
      writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
      continue;
    }
    if show_headers {
      if i > 0 {
        writeln!(out)?;
      }
      writeln!(out, "==> {} <==", file.display())?;
    }
    match text {
      None => writeln!(out, "No Stable Diffusion parameters found in the image.")?,
      Some(text) if args.raw => writeln!(out, "{text}")?,
      Some(text) => print_parameters(&mut out, &GenerationParameters::parse(&text), args.show_unknowns)?,
    }
  }
  out.flush().context("couldn't write to stdout")?;

  if failures > 0 {
    anyhow::bail!("{failures} of {} files could not be read", files.len());
  }
  Ok(())
}

fn collect_pngs(dir: &Path, files: &mut Vec<PathBuf>) {
  for entry in WalkDir::new(dir).sort_by_file_name() {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        log::warn!("{e}");
        continue;
      }
    };
    let is_png = entry.path().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if entry.file_type().is_file() && is_png {
      files.push(entry.into_path());
    }
  }
}

fn print_parameters(
  out: &mut impl Write, params: &GenerationParameters, show_unknowns: bool,
) -> io::Result<()> {
  if params.is_empty() {
    return writeln!(out, "No Stable Diffusion parameters found in the image.");
  }
  line(out, "Prompt", params.prompt.as_deref())?;
  line(out, "Negative prompt", params.negative_prompt.as_deref())?;
  line(out, "Wildcard prompt", params.wildcard_prompt.as_deref())?;
  if params.model.has_info {
    let model = match (&params.model.name, &params.model.hash) {
      (Some(name), Some(hash)) => format!("{name} [{hash}]"),
      (Some(name), None) => name.clone(),
      (None, Some(hash)) => format!("[{hash}]"),
      (None, None) => String::new(),
    };
    line(out, "Model", Some(model.as_str()))?;
  }
  line(out, "Sampler", params.sampler.as_deref())?;
  line(out, "Steps", params.steps.as_deref())?;
  line(out, "CFG scale", params.cfg_scale.as_deref())?;
  line(out, "Seed", params.seed.as_deref())?;
  if let (Some(w), Some(h)) = (&params.width, &params.height) {
    line(out, "Size", Some(format!("{w}x{h}").as_str()))?;
  }
  line(out, "Denoising strength", params.denoising.as_deref())?;
  if params.hires.has_info {
    let hires = &params.hires;
    writeln!(out, "Hires. fix:")?;
    line(out, "  Upscaler", hires.upscaler.as_deref())?;
    line(out, "  Upscale", hires.upscale_text().as_deref())?;
    if let (Some(w), Some(h)) = (hires.width_text(), hires.height_text()) {
      line(out, "  Size", Some(format!("{w}x{h}").as_str()))?;
    }
    line(out, "  Steps", hires.steps.as_deref())?;
    line(out, "  Denoising strength", hires.denoising.as_deref())?;
  }
  if params.inpaint.has_info {
    writeln!(out, "Inpaint:")?;
    line(out, "  Mask blur", params.inpaint.mask_blur.as_deref())?;
    line(out, "  Denoising strength", params.inpaint.denoising.as_deref())?;
  }
  if params.settings.has_info {
    writeln!(out, "Settings:")?;
    line(out, "  Clip skip", params.settings.clip_skip.as_deref())?;
    line(out, "  ENSD", params.settings.ensd.as_deref())?;
    line(out, "  Eta", params.settings.eta.as_deref())?;
  }
  if show_unknowns && !params.unknowns.is_empty() {
    writeln!(out, "Other:")?;
    for (key, value) in &params.unknowns {
      line(out, &format!("  {key}"), Some(value.as_str()))?;
    }
  }
  Ok(())
}

fn line(out: &mut impl Write, label: &str, value: Option<&str>) -> io::Result<()> {
  match value {
    Some(value) => writeln!(out, "{label}: {value}"),
    None => Ok(()),
  }
}
