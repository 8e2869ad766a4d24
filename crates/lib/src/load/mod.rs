//! Lazy package loading.
//!
//! [`Loader::open`] reads `project.lua` and walks the project tree to find
//! every `BUILD.lua`, but does not evaluate any of them. A package is
//! evaluated the first time it is requested and cached by path, so only
//! packages reachable from the requested targets are ever run, and
//! re-requesting a package returns the same [`Rc`].

mod project;

pub use project::ProjectConfig;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use mlua::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::consts::{BUILD_FILE_NAME, PROJECT_FILE_NAME};
use crate::lua::globals::{PackageCtx, register_declarations};
use crate::lua::runtime;
use crate::package::{Ident, Package, Target, is_valid_package_path};
use crate::plugin::{Plugin, PluginError, PluginRegistry};

/// Errors raised while locating or evaluating description units.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error("project root '{0}' does not exist")]
  MissingRoot(PathBuf),

  #[error("failed to read project tree at '{path}': {message}")]
  Walk { path: PathBuf, message: String },

  #[error("{path}: {message}")]
  Project { path: PathBuf, message: String },

  #[error("package '//{package}': {message}")]
  Lua { package: String, message: String },

  #[error("package '//{package}': description unit kept a reference to its package")]
  Retained { package: String },

  #[error("unknown package '//{0}'")]
  UnknownPackage(String),

  #[error("unknown target '{0}'")]
  UnknownTarget(Ident),

  #[error(transparent)]
  Plugin(#[from] PluginError),
}

/// Directory-based index of packages, evaluated on demand.
pub struct Loader {
  root: PathBuf,
  config: ProjectConfig,
  registry: Rc<PluginRegistry>,
  discovered: BTreeMap<String, PathBuf>,
  packages: BTreeMap<String, Rc<Package>>,
  loaded_files: BTreeSet<PathBuf>,
}

impl Loader {
  /// Open the project at `root`.
  ///
  /// Directories in `exclude` (typically the build directory) and hidden
  /// directories are not searched for packages.
  pub fn open(root: &Path, exclude: &[PathBuf]) -> Result<Self, LoadError> {
    if !root.is_dir() {
      return Err(LoadError::MissingRoot(root.to_path_buf()));
    }
    let root = dunce::canonicalize(root).map_err(|e| LoadError::Walk {
      path: root.to_path_buf(),
      message: e.to_string(),
    })?;

    let mut loaded_files = BTreeSet::new();
    let project_file = root.join(PROJECT_FILE_NAME);
    let config = if project_file.is_file() {
      loaded_files.insert(project_file.clone());
      ProjectConfig::from_file(&project_file).map_err(|e| LoadError::Project {
        path: project_file.clone(),
        message: render_lua_error(&e),
      })?
    } else {
      debug!(root = %root.display(), "no {} found, using defaults", PROJECT_FILE_NAME);
      ProjectConfig::default()
    };

    let registry = Rc::new(PluginRegistry::with_builtins(&config.plugins)?);
    let exclude: Vec<PathBuf> = exclude
      .iter()
      .map(|p| dunce::canonicalize(p).unwrap_or_else(|_| p.clone()))
      .collect();
    let discovered = discover(&root, &exclude)?;

    info!(
      root = %root.display(),
      packages = discovered.len(),
      plugins = ?config.plugins,
      "project opened"
    );

    Ok(Self {
      root,
      config,
      registry,
      discovered,
      packages: BTreeMap::new(),
      loaded_files,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn config(&self) -> &ProjectConfig {
    &self.config
  }

  pub fn registry(&self) -> Rc<PluginRegistry> {
    self.registry.clone()
  }

  /// Register a plugin in addition to the ones named in `project.lua`.
  ///
  /// Its kinds become available to packages evaluated afterwards.
  pub fn register_plugin(&mut self, plugin: &dyn Plugin) -> Result<(), LoadError> {
    Rc::make_mut(&mut self.registry).register(plugin)?;
    Ok(())
  }

  /// Paths of every discovered package, sorted.
  pub fn package_paths(&self) -> Vec<String> {
    self.discovered.keys().cloned().collect()
  }

  /// Description files evaluated so far, including `project.lua`, sorted.
  pub fn loaded_files(&self) -> impl Iterator<Item = &Path> {
    self.loaded_files.iter().map(PathBuf::as_path)
  }

  /// Get a package, evaluating its description unit on first request.
  pub fn package(&mut self, path: &str) -> Result<Rc<Package>, LoadError> {
    if let Some(package) = self.packages.get(path) {
      return Ok(package.clone());
    }

    let build_file = self
      .discovered
      .get(path)
      .cloned()
      .ok_or_else(|| LoadError::UnknownPackage(path.to_string()))?;

    let package = Rc::new(self.evaluate(path, &build_file)?);
    self.loaded_files.insert(build_file);
    self.packages.insert(path.to_string(), package.clone());
    Ok(package)
  }

  /// Look up a target, loading its package if needed.
  pub fn target(&mut self, ident: &Ident) -> Result<Rc<Target>, LoadError> {
    let package = self.package(ident.package())?;
    package
      .target(ident.name())
      .cloned()
      .ok_or_else(|| LoadError::UnknownTarget(ident.clone()))
  }

  fn evaluate(&self, path: &str, build_file: &Path) -> Result<Package, LoadError> {
    debug!(package = %path, file = %build_file.display(), "evaluating package");
    let lua_err = |e: LuaError| LoadError::Lua {
      package: path.to_string(),
      message: render_lua_error(&e),
    };

    let package = Rc::new(RefCell::new(Package::new(path, build_file)));
    let ctx = PackageCtx {
      path: path.to_string(),
      root: self.root.clone(),
    };

    // Every Lua handle must be gone before the package can be unwrapped.
    {
      let lua = runtime::create_runtime(&format!("//{}", path)).map_err(lua_err)?;
      let env = lua.create_table().map_err(lua_err)?;
      register_declarations(&lua, &env, &ctx, self.registry.kind_names(), package.clone()).map_err(lua_err)?;
      runtime::load_unit(&lua, build_file, env).map_err(lua_err)?;
    }

    let package = Rc::try_unwrap(package)
      .map_err(|_| LoadError::Retained {
        package: path.to_string(),
      })?
      .into_inner();

    debug!(package = %path, targets = package.len(), "package evaluated");
    Ok(package)
  }
}

/// Flatten a Lua error and its causes into one message.
///
/// Lua errors are neither `Send` nor `Sync`, so they are rendered here
/// rather than carried as a source.
fn render_lua_error(err: &LuaError) -> String {
  let mut message = err.to_string();
  let mut cause = std::error::Error::source(err);
  while let Some(inner) = cause {
    let text = inner.to_string();
    if !message.contains(&text) {
      message.push_str(": ");
      message.push_str(&text);
    }
    cause = inner.source();
  }
  message
}

/// Walk `root` and map each package path to its description file.
fn discover(root: &Path, exclude: &[PathBuf]) -> Result<BTreeMap<String, PathBuf>, LoadError> {
  let mut packages = BTreeMap::new();

  let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
    if entry.depth() == 0 {
      return true;
    }
    let hidden = entry.file_name().to_string_lossy().starts_with('.');
    !hidden && !exclude.iter().any(|e| e == entry.path())
  });

  for entry in walker {
    let entry = entry.map_err(|e| LoadError::Walk {
      path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
      message: e.to_string(),
    })?;

    if !entry.file_type().is_file() || entry.file_name() != BUILD_FILE_NAME {
      continue;
    }

    let dir = entry.path().parent().unwrap_or(root);
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let path = rel
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    if !is_valid_package_path(&path) {
      warn!(dir = %dir.display(), "skipping directory with an invalid package path");
      continue;
    }
    packages.insert(path, entry.path().to_path_buf());
  }

  Ok(packages)
}
