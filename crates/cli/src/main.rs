mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// cobble - multi-variant build graph generator for Ninja
#[derive(Parser)]
#[command(name = "cobble")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by RUST_LOG)
  #[arg(long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate build.ninja for a project and link the launcher
  Init {
    /// Project root containing project.lua and BUILD.lua files
    root: PathBuf,

    /// Build directory (default: current directory)
    #[arg(short = 'b', long, default_value = ".")]
    build_dir: PathBuf,

    /// Overwrite an existing build.ninja and launcher
    #[arg(short, long)]
    force: bool,

    /// Only generate these targets and their dependencies
    #[arg(short, long = "target", value_name = "TARGET")]
    targets: Vec<String>,
  },

  /// Run ninja in the build directory
  Build(BuildArgs),

  /// Resolve the graph without writing anything
  Check {
    /// Project root
    root: PathBuf,

    /// Build directory (default: current directory)
    #[arg(short = 'b', long, default_value = ".")]
    build_dir: PathBuf,

    /// Only check these targets and their dependencies
    #[arg(short, long = "target", value_name = "TARGET")]
    targets: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

/// Flags forwarded to ninja unchanged.
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
  /// Build directory (default: current directory)
  #[arg(short = 'C', long, default_value = ".")]
  pub build_dir: PathBuf,

  /// Run N jobs in parallel
  #[arg(short, value_name = "N")]
  pub jobs: Option<u32>,

  /// Don't start new jobs if the load average is greater than N
  #[arg(short = 'l', value_name = "N")]
  pub load: Option<f64>,

  /// Dry run
  #[arg(short = 'n')]
  pub dry_run: bool,

  /// Show all command lines while building
  #[arg(short = 'v', long = "show-commands")]
  pub show_commands: bool,

  /// Explain what caused a command to execute
  #[arg(long)]
  pub explain: bool,

  /// Print operation counts and timing
  #[arg(long)]
  pub stats: bool,

  /// Ninja targets (output paths)
  pub targets: Vec<String>,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Init {
      root,
      build_dir,
      force,
      targets,
    } => cmd::cmd_init(&root, &build_dir, force, targets).map(|_| ExitCode::SUCCESS),
    Commands::Build(args) => cmd::cmd_build(&args),
    Commands::Check {
      root,
      build_dir,
      targets,
      output,
    } => cmd::cmd_check(&root, &build_dir, targets, output).map(|_| ExitCode::SUCCESS),
  };

  match result {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
