//! Package/target model.
//!
//! A [`Package`] is a directory of the project holding a `BUILD.lua`
//! description unit; it owns the [`Target`]s declared there. Targets name a
//! kind (a capability registered by a plugin), carry typed declared
//! parameters, and list their dependencies as [`DepRef`]s: a reference to
//! another target plus an optional [`Delta`] applied before resolving it.
//!
//! Packages and targets are created once by the loader and are immutable
//! afterwards.

mod ident;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::env::{Delta, ParameterError, Value};

pub use ident::{Ident, IdentError};
pub(crate) use ident::is_valid_package_path;

/// Declared parameters of a target.
pub type Params = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
  #[error("duplicate target: {0}")]
  DuplicateTarget(Ident),

  #[error("target {target} declared in package '{package}'")]
  WrongPackage { target: Ident, package: String },
}

/// A dependency reference: the target to resolve and the delta to apply to
/// the requester's environment first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepRef {
  pub target: Ident,
  pub delta: Delta,
}

impl DepRef {
  pub fn new(target: Ident) -> Self {
    Self {
      target,
      delta: Delta::new(),
    }
  }

  pub fn with_delta(target: Ident, delta: Delta) -> Self {
    Self { target, delta }
  }
}

/// A declared target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  ident: Ident,
  kind: String,
  params: Params,
  deps: Vec<DepRef>,
}

impl Target {
  pub fn new(ident: Ident, kind: impl Into<String>, params: Params, deps: Vec<DepRef>) -> Self {
    Self {
      ident,
      kind: kind.into(),
      params,
      deps,
    }
  }

  pub fn ident(&self) -> &Ident {
    &self.ident
  }

  pub fn name(&self) -> &str {
    self.ident.name()
  }

  pub fn package(&self) -> &str {
    self.ident.package()
  }

  /// Name of the target kind that evaluates this target.
  pub fn kind(&self) -> &str {
    &self.kind
  }

  pub fn params(&self) -> &Params {
    &self.params
  }

  pub fn param(&self, key: &str) -> Option<&Value> {
    self.params.get(key)
  }

  pub fn deps(&self) -> &[DepRef] {
    &self.deps
  }

  /// Read a parameter as a list of strings; scalars count as one item and an
  /// absent parameter is an empty list.
  pub fn str_list(&self, key: &str) -> Vec<String> {
    self.params.get(key).map(Value::to_strings).unwrap_or_default()
  }

  /// Read a required string parameter.
  pub fn require_str(&self, key: &str) -> Result<&str, ParameterError> {
    match self.params.get(key) {
      None => Err(ParameterError::Missing { key: key.to_string() }),
      Some(value) => value.as_str().ok_or_else(|| ParameterError::TypeConflict {
        key: key.to_string(),
        expected: crate::env::ValueType::Str,
        found: value.value_type(),
      }),
    }
  }
}

/// A loaded package.
#[derive(Debug)]
pub struct Package {
  path: String,
  build_file: PathBuf,
  targets: BTreeMap<String, Rc<Target>>,
}

impl Package {
  pub fn new(path: impl Into<String>, build_file: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      build_file: build_file.into(),
      targets: BTreeMap::new(),
    }
  }

  /// Path of this package relative to the project root (empty for the root).
  pub fn path(&self) -> &str {
    &self.path
  }

  /// The description unit this package was loaded from.
  pub fn build_file(&self) -> &Path {
    &self.build_file
  }

  pub fn add_target(&mut self, target: Target) -> Result<(), ModelError> {
    if target.package() != self.path {
      return Err(ModelError::WrongPackage {
        target: target.ident().clone(),
        package: self.path.clone(),
      });
    }
    if self.targets.contains_key(target.name()) {
      return Err(ModelError::DuplicateTarget(target.ident().clone()));
    }
    self.targets.insert(target.name().to_string(), Rc::new(target));
    Ok(())
  }

  pub fn target(&self, name: &str) -> Option<&Rc<Target>> {
    self.targets.get(name)
  }

  /// Targets in name order.
  pub fn targets(&self) -> impl Iterator<Item = &Rc<Target>> {
    self.targets.values()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }
}
