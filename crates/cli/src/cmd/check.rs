//! Implementation of the `cobble check` command.

use std::path::Path;

use anyhow::{Context, Result};

use cobble_lib::generate::{GenerateOptions, generate};

use crate::output::{OutputFormat, print_json, print_stat, print_success};

/// Run generation in dry mode and report what would be written.
///
/// Runs the same checks `init` would, including the build directory ones.
pub fn cmd_check(root: &Path, build_dir: &Path, targets: Vec<String>, output: OutputFormat) -> Result<()> {
  let options = GenerateOptions {
    root: root.to_path_buf(),
    build_dir: build_dir.to_path_buf(),
    targets,
    force: false,
    dry_run: true,
  };
  let report = generate(&options).context("Check failed")?;

  if output.is_json() {
    return print_json(&report);
  }

  print_success(&format!("{} is consistent", report.root.display()));
  print_stat("Nodes", &report.nodes.to_string());
  print_stat("Build edges", &report.products.to_string());
  print_stat("Description files", &report.description_files.to_string());
  Ok(())
}
