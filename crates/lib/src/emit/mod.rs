//! Build file emission.
//!
//! Serializes a [`ResolvedGraph`] into Ninja syntax:
//!
//! ```text
//! ninja_required_version = 1.3
//!
//! rule cc
//!   command = $cc $cflags -MMD -MF $out.d -c $in -o $out
//!   ...
//!
//! # //lib/util:util@3f9a0c1be27d4a55
//! build env/3f9a0c1be27d4a55/lib/util/@util/util.c.o: cc /src/lib/util/util.c
//!   cc = cc
//!   cflags = -O2
//! ...
//!
//! rule cobble_regen
//!   command = ./cobble init --force /src
//!   generator = 1
//!
//! build build.ninja: cobble_regen /src/project.lua /src/lib/util/BUILD.lua
//! ```
//!
//! Only rules referenced by some product are declared, sorted by name.
//! Edges follow node identity order, then the order a plugin returned its
//! products in, so identical graphs always produce identical bytes.

mod ninja;

pub use ninja::{NinjaWriter, escape_path, escape_value, shell_quote};

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::consts::{LAUNCHER_NAME, NINJA_FILE_NAME, REGEN_RULE_NAME};
use crate::plugin::{PluginRegistry, Rule};
use crate::resolve::{NodeId, ResolvedGraph};

#[derive(Debug, Error)]
pub enum EmitError {
  #[error("{node}: product references unregistered rule '{rule}'")]
  UnknownRule { node: NodeId, rule: String },

  #[error("path '{0}' contains a newline")]
  InvalidPath(String),

  #[error("value of variable '{key}' contains a newline")]
  InvalidValue { key: String },
}

/// How the build file regenerates itself.
#[derive(Debug, Clone, Default)]
pub struct Regeneration {
  /// Absolute project root passed back to `init`.
  pub root: PathBuf,
  /// Targets originally requested, in request order.
  pub targets: Vec<String>,
  /// Every description file that was evaluated.
  pub inputs: Vec<PathBuf>,
}

impl Regeneration {
  /// The command re-running generation from inside the build directory.
  pub fn command(&self) -> String {
    let mut args = vec![
      format!("./{}", LAUNCHER_NAME),
      "init".to_string(),
      "--force".to_string(),
      shell_quote(&self.root.to_string_lossy()),
    ];
    for target in &self.targets {
      args.push("--target".to_string());
      args.push(shell_quote(target));
    }
    args.join(" ")
  }

  fn rule(&self) -> Rule {
    Rule::new(REGEN_RULE_NAME, self.command().replace('$', "$$"))
      .with_description(format!("Regenerating {}", NINJA_FILE_NAME))
      .generator()
  }
}

/// Render `graph` as a Ninja build file.
pub fn emit(graph: &ResolvedGraph, registry: &PluginRegistry, regen: &Regeneration) -> Result<String, EmitError> {
  let mut writer = NinjaWriter::new();
  writer.comment(&format!(
    "Generated by cobble from {}. Changes will be overwritten.",
    regen.root.display()
  ));
  writer.variable("ninja_required_version", "1.3", false);
  writer.newline();

  // Rule name to the first node using it, for error reporting.
  let mut used: BTreeMap<&str, &NodeId> = BTreeMap::new();
  for (id, product) in graph.products() {
    used.entry(product.rule.as_str()).or_insert(id);
  }
  for (name, node) in &used {
    let rule = registry.rule(name).ok_or_else(|| EmitError::UnknownRule {
      node: (*node).clone(),
      rule: name.to_string(),
    })?;
    writer.rule(rule);
  }

  for node in graph.nodes() {
    if node.products.is_empty() {
      continue;
    }
    writer.comment(&node.id.to_string());
    for product in &node.products {
      writer.build(
        product.outputs.iter().map(String::as_str),
        &product.rule,
        product.inputs.iter().map(String::as_str),
        product.implicit.iter().map(String::as_str),
        product.variables.iter().map(|(k, v)| (k.as_str(), v.as_str())),
      )?;
    }
    writer.newline();
  }

  writer.rule(&regen.rule());
  let regen_inputs: Vec<String> = regen
    .inputs
    .iter()
    .map(|p| p.to_string_lossy().into_owned())
    .collect();
  writer.build(
    [NINJA_FILE_NAME],
    REGEN_RULE_NAME,
    regen_inputs.iter().map(String::as_str),
    std::iter::empty(),
    std::iter::empty(),
  )?;

  let out = writer.finish();
  debug!(
    rules = used.len(),
    edges = graph.product_count() + 1,
    bytes = out.len(),
    "build file rendered"
  );
  Ok(out)
}
