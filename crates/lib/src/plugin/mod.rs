//! Plugin contract.
//!
//! A [`Plugin`] contributes target kinds and rule templates. The loader
//! exposes one constructor per registered [`TargetKind`] to description
//! units; the resolver calls [`TargetKind::evaluate`]; the emitter declares
//! every [`Rule`] a product references. None of them know anything about a
//! specific plugin beyond this contract.
//!
//! # Evaluation
//!
//! [`TargetKind::evaluate`] receives an [`EvalCtx`] holding the declaration
//! and the narrowed environment, and returns an [`Evaluation`]: the products
//! to emit, the dependencies to resolve, and the exports offered to
//! dependents. It must be a pure function of its context. Path helpers on the
//! context compute deterministic strings and never touch the filesystem.
//!
//! # Submodules
//!
//! - [`c`] - C toolchain plugin (`c_library`, `c_binary`)

pub mod c;
mod types;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::env::ParameterError;
use crate::package::Target;

pub use types::*;

/// The capability interface of one target kind.
pub trait TargetKind {
  /// Variant tag, also the name of the constructor in description units.
  fn name(&self) -> &str;

  /// Environment keys this kind reads. Everything else is dropped before
  /// identity is computed.
  fn sensitivity(&self) -> &[&str];

  /// Declared parameters this kind accepts.
  fn parameters(&self) -> &[ParamSpec];

  /// Whether the exports of this kind's dependencies are re-exported to its
  /// own dependents.
  fn transparent(&self) -> bool {
    true
  }

  fn evaluate(&self, ctx: &EvalCtx<'_>) -> Result<Evaluation, PluginError>;
}

/// A bundle of target kinds and rule templates.
pub trait Plugin {
  fn name(&self) -> &str;

  fn kinds(&self) -> Vec<Rc<dyn TargetKind>>;

  fn rules(&self) -> Vec<Rule>;
}

/// Names of the plugins compiled into this crate.
pub const BUILTIN_PLUGINS: &[&str] = &["c"];

/// Look up a built-in plugin by name.
pub fn builtin_plugin(name: &str) -> Option<Box<dyn Plugin>> {
  match name {
    "c" => Some(Box::new(c::CPlugin)),
    _ => None,
  }
}

/// All target kinds and rules available to a project.
#[derive(Clone, Default)]
pub struct PluginRegistry {
  kinds: BTreeMap<String, Rc<dyn TargetKind>>,
  rules: BTreeMap<String, Rule>,
}

impl PluginRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry holding the named built-in plugins.
  pub fn with_builtins<S: AsRef<str>>(names: &[S]) -> Result<Self, PluginError> {
    let mut registry = Self::new();
    for name in names {
      let name = name.as_ref();
      let plugin = builtin_plugin(name).ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))?;
      registry.register(plugin.as_ref())?;
    }
    Ok(registry)
  }

  pub fn register(&mut self, plugin: &dyn Plugin) -> Result<(), PluginError> {
    for kind in plugin.kinds() {
      let name = kind.name().to_string();
      if self.kinds.contains_key(&name) {
        return Err(PluginError::DuplicateKind {
          plugin: plugin.name().to_string(),
          kind: name,
        });
      }
      self.kinds.insert(name, kind);
    }
    for rule in plugin.rules() {
      if self.rules.contains_key(&rule.name) {
        return Err(PluginError::DuplicateRule {
          plugin: plugin.name().to_string(),
          rule: rule.name,
        });
      }
      self.rules.insert(rule.name.clone(), rule);
    }
    Ok(())
  }

  pub fn kind(&self, name: &str) -> Option<&Rc<dyn TargetKind>> {
    self.kinds.get(name)
  }

  pub fn kind_names(&self) -> impl Iterator<Item = &str> {
    self.kinds.keys().map(String::as_str)
  }

  pub fn rule(&self, name: &str) -> Option<&Rule> {
    self.rules.get(name)
  }

  /// Validate a target's declared parameters against its kind.
  pub fn check_params(kind: &dyn TargetKind, target: &Target) -> Result<(), ParameterError> {
    let specs = kind.parameters();
    for (key, value) in target.params() {
      let spec = specs
        .iter()
        .find(|s| s.name == key.as_str())
        .ok_or_else(|| ParameterError::Unknown { key: key.clone() })?;
      value.expect_type(key, spec.ty)?;
    }
    for spec in specs.iter().filter(|s| s.required) {
      if target.param(spec.name).is_none() {
        return Err(ParameterError::Missing {
          key: spec.name.to_string(),
        });
      }
    }
    Ok(())
  }
}
