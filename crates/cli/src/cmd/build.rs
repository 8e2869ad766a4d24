//! Implementation of the `cobble build` command.

use std::process::{Command, ExitCode};

use anyhow::{Context, Result, bail};
use tracing::debug;

use cobble_lib::consts::NINJA_FILE_NAME;

use crate::BuildArgs;

/// Run ninja in the build directory and pass its exit status through.
pub fn cmd_build(args: &BuildArgs) -> Result<ExitCode> {
  if !args.build_dir.join(NINJA_FILE_NAME).is_file() {
    bail!(
      "no {} in '{}' (run `cobble init <root>` there first)",
      NINJA_FILE_NAME,
      args.build_dir.display()
    );
  }

  let ninja_args = ninja_args(args);
  debug!(dir = %args.build_dir.display(), args = ?ninja_args, "running ninja");

  let status = Command::new("ninja")
    .args(&ninja_args)
    .current_dir(&args.build_dir)
    .status()
    .context("Failed to run ninja")?;

  Ok(match status.code() {
    Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
    None => ExitCode::FAILURE,
  })
}

/// Map `build` flags onto ninja's command line.
fn ninja_args(args: &BuildArgs) -> Vec<String> {
  let mut out = Vec::new();
  if let Some(jobs) = args.jobs {
    out.extend(["-j".to_string(), jobs.to_string()]);
  }
  if let Some(load) = args.load {
    out.extend(["-l".to_string(), load.to_string()]);
  }
  if args.dry_run {
    out.push("-n".to_string());
  }
  if args.show_commands {
    out.push("-v".to_string());
  }
  if args.explain {
    out.extend(["-d".to_string(), "explain".to_string()]);
  }
  if args.stats {
    out.extend(["-d".to_string(), "stats".to_string()]);
  }
  out.extend(args.targets.iter().cloned());
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_flags_no_args() {
    assert!(ninja_args(&BuildArgs::default()).is_empty());
  }

  #[test]
  fn flags_map_unchanged() {
    let args = BuildArgs {
      jobs: Some(8),
      load: Some(4.5),
      dry_run: true,
      show_commands: true,
      explain: true,
      stats: true,
      targets: vec!["env/abc/app/@app/app".to_string()],
      ..Default::default()
    };
    assert_eq!(
      ninja_args(&args),
      vec![
        "-j",
        "8",
        "-l",
        "4.5",
        "-n",
        "-v",
        "-d",
        "explain",
        "-d",
        "stats",
        "env/abc/app/@app/app"
      ]
    );
  }
}
