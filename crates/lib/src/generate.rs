//! The generation pipeline: load, resolve, emit, write.
//!
//! Generation is one synchronous pass. Every error aborts before anything
//! is written, and the build file is replaced atomically, so a failed run
//! leaves the previous `build.ninja` (if any) untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::consts::NINJA_FILE_NAME;
use crate::emit::{EmitError, Regeneration, emit};
use crate::load::{LoadError, Loader};
use crate::package::{Ident, IdentError};
use crate::plugin::Plugin;
use crate::resolve::{ResolveError, resolve};

#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("invalid target '{target}': {source}")]
  InvalidTarget {
    target: String,
    #[source]
    source: IdentError,
  },

  #[error("build directory must differ from the project root '{0}'")]
  BuildDirIsRoot(PathBuf),

  #[error("'{0}' already exists (use --force to overwrite)")]
  OutputExists(PathBuf),

  #[error(transparent)]
  Load(#[from] LoadError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Emit(#[from] EmitError),

  #[error("failed to write '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Options for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
  pub root: PathBuf,
  pub build_dir: PathBuf,
  /// Targets to resolve; empty means every target in the project.
  pub targets: Vec<String>,
  /// Replace an existing build file.
  pub force: bool,
  /// Run every check but write nothing.
  pub dry_run: bool,
}

/// What a generation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
  pub root: PathBuf,
  pub nodes: usize,
  pub products: usize,
  pub description_files: usize,
  /// Path of the written build file, `None` on a dry run.
  pub output: Option<PathBuf>,
  #[serde(skip)]
  pub content: String,
}

/// Run generation with the built-in plugins.
pub fn generate(options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
  generate_with(options, &[])
}

/// Run generation with additional plugins registered after the project's.
pub fn generate_with(options: &GenerateOptions, plugins: &[&dyn Plugin]) -> Result<GenerateReport, GenerateError> {
  let targets = options
    .targets
    .iter()
    .map(|t| {
      Ident::parse(t).map_err(|source| GenerateError::InvalidTarget {
        target: t.clone(),
        source,
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  let build_dir = absolute(&options.build_dir)?;
  let mut loader = Loader::open(&options.root, std::slice::from_ref(&build_dir))?;
  if same_dir(&build_dir, loader.root()) {
    return Err(GenerateError::BuildDirIsRoot(loader.root().to_path_buf()));
  }

  let output = build_dir.join(NINJA_FILE_NAME);
  if !options.dry_run && !options.force && output.exists() {
    return Err(GenerateError::OutputExists(output));
  }

  for plugin in plugins {
    loader.register_plugin(*plugin)?;
  }

  let graph = resolve(&mut loader, &targets)?;

  let regen = Regeneration {
    root: loader.root().to_path_buf(),
    targets: options.targets.clone(),
    inputs: loader.loaded_files().map(Path::to_path_buf).collect(),
  };
  let content = emit(&graph, &loader.registry(), &regen)?;

  let mut report = GenerateReport {
    root: loader.root().to_path_buf(),
    nodes: graph.len(),
    products: graph.product_count(),
    description_files: regen.inputs.len(),
    output: None,
    content,
  };

  if options.dry_run {
    info!(nodes = report.nodes, products = report.products, "dry run, nothing written");
    return Ok(report);
  }

  write_atomic(&build_dir, &output, &report.content)?;
  info!(path = %output.display(), "build file written");
  report.output = Some(output);
  Ok(report)
}

fn absolute(path: &Path) -> Result<PathBuf, GenerateError> {
  std::path::absolute(path).map_err(|source| GenerateError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn same_dir(a: &Path, b: &Path) -> bool {
  match (dunce::canonicalize(a), dunce::canonicalize(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => a == b,
  }
}

/// Write `content` to a temporary file in `dir`, then rename it over `path`.
fn write_atomic(dir: &Path, path: &Path, content: &str) -> Result<(), GenerateError> {
  let io_err = |source| GenerateError::Io {
    path: path.to_path_buf(),
    source,
  };

  fs::create_dir_all(dir).map_err(io_err)?;
  let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
  temp.write_all(content.as_bytes()).map_err(io_err)?;
  temp.persist(path).map_err(|e| io_err(e.error))?;
  Ok(())
}
