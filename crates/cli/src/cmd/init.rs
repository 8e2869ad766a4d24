//! Implementation of the `cobble init` command.
//!
//! Generates `build.ninja` in the build directory and links the `cobble`
//! launcher next to it, so the regeneration edge can re-run generation from
//! inside the build directory.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use owo_colors::{OwoColorize, Stream};
use tracing::{debug, warn};

use cobble_lib::consts::LAUNCHER_NAME;
use cobble_lib::generate::{GenerateOptions, generate};

use crate::output::{format_duration, print_stat, print_success, symbols};

/// Execute the init command.
///
/// # Errors
///
/// Refuses when the project root is missing, when the build directory is
/// the project root, or when `build.ninja` or the launcher already exists
/// and `force` is not set.
pub fn cmd_init(root: &Path, build_dir: &Path, force: bool, targets: Vec<String>) -> Result<()> {
  let start = Instant::now();

  if !root.is_dir() {
    bail!("project root '{}' does not exist", root.display());
  }

  let launcher = build_dir.join(LAUNCHER_NAME);
  if !force && fs::symlink_metadata(&launcher).is_ok() {
    bail!("'{}' already exists (use --force to overwrite)", launcher.display());
  }

  let options = GenerateOptions {
    root: root.to_path_buf(),
    build_dir: build_dir.to_path_buf(),
    targets,
    force,
    dry_run: false,
  };
  let report = generate(&options).context("Failed to generate build file")?;

  // The regeneration edge runs the launcher, so the build file is only
  // kept once the launcher is in place.
  if let Err(e) = link_launcher(&launcher) {
    if let Some(output) = &report.output
      && let Err(remove) = fs::remove_file(output)
    {
      warn!(path = %output.display(), error = %remove, "failed to remove build file");
    }
    return Err(e);
  }

  let output = report.output.as_deref().unwrap_or(build_dir);
  print_success(&format!(
    "Generated {} {} {}",
    report.root.display(),
    symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.cyan()),
    output.display()
  ));
  print_stat("Nodes", &report.nodes.to_string());
  print_stat("Build edges", &report.products.to_string());
  print_stat("Description files", &report.description_files.to_string());
  print_stat("Time", &format_duration(start.elapsed()));

  Ok(())
}

/// Point `launcher` at the running executable, replacing whatever is there.
fn link_launcher(launcher: &Path) -> Result<()> {
  let exe = std::env::current_exe().context("Failed to locate the cobble executable")?;

  if fs::symlink_metadata(launcher).is_ok() {
    fs::remove_file(launcher).with_context(|| format!("Failed to remove {}", launcher.display()))?;
  }

  #[cfg(unix)]
  std::os::unix::fs::symlink(&exe, launcher)
    .with_context(|| format!("Failed to link {} to {}", launcher.display(), exe.display()))?;

  #[cfg(not(unix))]
  fs::copy(&exe, launcher).with_context(|| format!("Failed to copy {} to {}", exe.display(), launcher.display()))?;

  debug!(launcher = %launcher.display(), exe = %exe.display(), "launcher linked");
  Ok(())
}
