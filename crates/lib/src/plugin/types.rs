use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::consts::{ENV_OUT_DIR, TARGET_DIR_MARKER};
use crate::env::{Environment, ParameterError, ValueType};
use crate::package::{DepRef, Ident, Target};
use crate::util::hash::Fingerprint;

/// Errors raised by plugins or while checking what they returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
  #[error("unknown plugin '{0}'")]
  UnknownPlugin(String),

  #[error("plugin '{plugin}' registers target kind '{kind}' which already exists")]
  DuplicateKind { plugin: String, kind: String },

  #[error("plugin '{plugin}' registers rule '{rule}' which already exists")]
  DuplicateRule { plugin: String, rule: String },

  #[error("{target}: unknown target kind '{kind}'")]
  UnknownKind { target: Ident, kind: String },

  #[error("{target}: product references unregistered rule '{rule}'")]
  UnknownRule { target: Ident, rule: String },

  #[error("{target}: product with rule '{rule}' has no outputs")]
  NoOutputs { target: Ident, rule: String },

  #[error("{target}: product input refers to dependency #{index}, but only {count} were requested")]
  DepOutOfRange { target: Ident, index: usize, count: usize },

  #[error("{target}: export '{path}' is not produced by any of its products")]
  ExportNotProduced { target: Ident, path: String },

  #[error("products form a cycle through '{path}'")]
  ProductCycle { path: String },

  #[error("{target}: {source}")]
  Parameter {
    target: Ident,
    #[source]
    source: ParameterError,
  },
}

/// Declared parameter accepted by a target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
  pub name: &'static str,
  pub ty: ValueType,
  pub required: bool,
}

impl ParamSpec {
  pub const fn required(name: &'static str, ty: ValueType) -> Self {
    Self { name, ty, required: true }
  }

  pub const fn optional(name: &'static str, ty: ValueType) -> Self {
    Self {
      name,
      ty,
      required: false,
    }
  }
}

/// A named command template for the executor.
///
/// `command` may reference `$in`, `$out`, and any variable a product binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
  pub name: String,
  pub command: String,
  pub description: Option<String>,
  pub depfile: Option<String>,
  pub deps: Option<String>,
  pub generator: bool,
}

impl Rule {
  pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      command: command.into(),
      description: None,
      depfile: None,
      deps: None,
      generator: false,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Header dependency discovery (`depfile` plus the `deps` style, e.g. `gcc`).
  pub fn with_depfile(mut self, depfile: impl Into<String>, deps: impl Into<String>) -> Self {
    self.depfile = Some(depfile.into());
    self.deps = Some(deps.into());
    self
  }

  pub fn generator(mut self) -> Self {
    self.generator = true;
    self
  }
}

/// An input of a product.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Input {
  /// A literal path: a source under the project root or an output of this
  /// or another product.
  File(String),
  /// The exports of the node behind dependency request `n` of the same
  /// evaluation.
  Dep(usize),
}

/// One build action as returned by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
  pub rule: String,
  pub outputs: Vec<String>,
  pub inputs: Vec<Input>,
  pub implicit: Vec<Input>,
  pub variables: BTreeMap<String, String>,
}

impl Product {
  pub fn new(rule: impl Into<String>) -> Self {
    Self {
      rule: rule.into(),
      outputs: Vec::new(),
      inputs: Vec::new(),
      implicit: Vec::new(),
      variables: BTreeMap::new(),
    }
  }

  pub fn output(mut self, path: impl Into<String>) -> Self {
    self.outputs.push(path.into());
    self
  }

  pub fn input(mut self, input: Input) -> Self {
    self.inputs.push(input);
    self
  }

  pub fn inputs(mut self, inputs: impl IntoIterator<Item = Input>) -> Self {
    self.inputs.extend(inputs);
    self
  }

  /// Inputs that trigger a rebuild but do not appear in `$in`.
  pub fn implicit(mut self, input: Input) -> Self {
    self.implicit.push(input);
    self
  }

  pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.variables.insert(key.into(), value.into());
    self
  }
}

/// Result of evaluating one target in one narrowed environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
  pub products: Vec<Product>,
  pub deps: Vec<DepRef>,
  /// Outputs offered to dependents through [`Input::Dep`].
  pub exports: Vec<String>,
}

/// Everything an evaluation may look at.
///
/// Carries the project root and the current package explicitly; there is no
/// ambient "current package" state.
pub struct EvalCtx<'a> {
  root: &'a Path,
  target: &'a Target,
  env: &'a Environment,
  digest: &'a Fingerprint,
}

impl<'a> EvalCtx<'a> {
  pub fn new(root: &'a Path, target: &'a Target, env: &'a Environment, digest: &'a Fingerprint) -> Self {
    Self {
      root,
      target,
      env,
      digest,
    }
  }

  pub fn target(&self) -> &'a Target {
    self.target
  }

  pub fn ident(&self) -> &'a Ident {
    self.target.ident()
  }

  /// The narrowed environment.
  pub fn env(&self) -> &'a Environment {
    self.env
  }

  pub fn digest(&self) -> &'a Fingerprint {
    self.digest
  }

  /// Path of a source file.
  ///
  /// `//dir/file` is relative to the project root, anything else to the
  /// current package's directory.
  pub fn inpath(&self, rel: &str) -> String {
    let path = match rel.strip_prefix("//") {
      Some(from_root) => self.root.join(from_root),
      None => self.root.join(self.target.package()).join(rel),
    };
    path.to_string_lossy().into_owned()
  }

  /// Path of an output, relative to the build directory.
  ///
  /// Laid out as `env/<digest>/<package>/@<target>/<rel>`. The marked
  /// target segment keeps `//a:b` and `//a/b:c` apart.
  pub fn outpath(&self, rel: &str) -> String {
    let target_dir = format!("{}{}", TARGET_DIR_MARKER, self.target.name());
    let mut parts = vec![ENV_OUT_DIR, self.digest.as_str()];
    if !self.target.package().is_empty() {
      parts.push(self.target.package());
    }
    parts.push(&target_dir);
    parts.push(rel);
    parts.join("/")
  }

  /// Attach the current target to a parameter error.
  pub fn param_error(&self, source: ParameterError) -> PluginError {
    PluginError::Parameter {
      target: self.ident().clone(),
      source,
    }
  }

  /// Read a required string from the environment.
  pub fn env_str(&self, key: &str) -> Result<&'a str, PluginError> {
    match self.env.get_str(key) {
      Ok(Some(s)) => Ok(s),
      Ok(None) => Err(self.param_error(ParameterError::Missing { key: key.to_string() })),
      Err(e) => Err(self.param_error(e)),
    }
  }

  /// Read an optional parameter from the environment as strings.
  pub fn env_strings(&self, key: &str) -> Vec<String> {
    self.env.get(key).map(|v| v.to_strings()).unwrap_or_default()
  }
}
