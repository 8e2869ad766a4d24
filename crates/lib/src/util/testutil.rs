//! On-disk project fixtures and a stub plugin for unit tests.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use tempfile::TempDir;

use crate::consts::{BUILD_FILE_NAME, PROJECT_FILE_NAME};
use crate::env::{Value, ValueType};
use crate::plugin::{EvalCtx, Evaluation, Input, ParamSpec, Plugin, PluginError, Product, Rule, TargetKind};

/// A throwaway project tree in a temporary directory.
pub struct ProjectFixture {
  dir: TempDir,
}

impl ProjectFixture {
  pub fn new() -> Self {
    Self {
      dir: TempDir::new().expect("failed to create temp dir"),
    }
  }

  pub fn root(&self) -> &Path {
    self.dir.path()
  }

  /// Write `project.lua`.
  pub fn project(self, content: &str) -> Self {
    self.file(PROJECT_FILE_NAME, content)
  }

  /// Write the `BUILD.lua` of package `path` (`""` for the root package).
  pub fn package(self, path: &str, content: &str) -> Self {
    let rel = if path.is_empty() {
      BUILD_FILE_NAME.to_string()
    } else {
      format!("{}/{}", path, BUILD_FILE_NAME)
    };
    self.file(&rel, content)
  }

  pub fn file(self, rel: &str, content: &str) -> Self {
    let path = self.dir.path().join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).expect("failed to create fixture dir");
    }
    fs::write(&path, content).expect("failed to write fixture file");
    self
  }
}

/// A minimal plugin whose products are single `stamp` actions.
///
/// - `lib`: sensitive to `arch`, transparent, exports its output. An `out`
///   parameter replaces the namespaced output path.
/// - `app`: sensitive to `arch`, opaque, consumes every dependency's exports.
/// - `group`: no sensitivity and no products, re-exports its dependencies.
/// - `knot`: two products that consume each other's outputs.
pub struct StampPlugin;

pub const STAMP_RULE: &str = "stamp";

struct StampKind {
  name: &'static str,
  sensitivity: &'static [&'static str],
  transparent: bool,
}

const STAMP_PARAMS: &[ParamSpec] = &[ParamSpec::optional("out", ValueType::Str)];

impl TargetKind for StampKind {
  fn name(&self) -> &str {
    self.name
  }

  fn sensitivity(&self) -> &[&str] {
    self.sensitivity
  }

  fn parameters(&self) -> &[ParamSpec] {
    STAMP_PARAMS
  }

  fn transparent(&self) -> bool {
    self.transparent
  }

  fn evaluate(&self, ctx: &EvalCtx<'_>) -> Result<Evaluation, PluginError> {
    let target = ctx.target();
    let deps = target.deps().to_vec();
    let out = match target.param("out").and_then(Value::as_str) {
      Some(out) => out.to_string(),
      None => ctx.outpath(self.name),
    };

    let evaluation = match self.name {
      "group" => Evaluation {
        deps,
        ..Default::default()
      },
      "knot" => {
        let (a, b) = (ctx.outpath("a"), ctx.outpath("b"));
        Evaluation {
          products: vec![
            Product::new(STAMP_RULE).output(a.clone()).input(Input::File(b.clone())),
            Product::new(STAMP_RULE).output(b).input(Input::File(a)),
          ],
          deps,
          exports: Vec::new(),
        }
      }
      _ => {
        let inputs = (0..deps.len()).map(Input::Dep);
        let exports = if self.name == "lib" { vec![out.clone()] } else { Vec::new() };
        Evaluation {
          products: vec![Product::new(STAMP_RULE).output(out).inputs(inputs)],
          deps,
          exports,
        }
      }
    };
    Ok(evaluation)
  }
}

impl Plugin for StampPlugin {
  fn name(&self) -> &str {
    "stamp"
  }

  fn kinds(&self) -> Vec<Rc<dyn TargetKind>> {
    let kind = |name: &'static str, sensitivity: &'static [&'static str], transparent: bool| -> Rc<dyn TargetKind> {
      Rc::new(StampKind {
        name,
        sensitivity,
        transparent,
      })
    };
    vec![
      kind("lib", &["arch"], true),
      kind("app", &["arch"], false),
      kind("group", &[], true),
      kind("knot", &[], false),
    ]
  }

  fn rules(&self) -> Vec<Rule> {
    vec![Rule::new(STAMP_RULE, "touch $out")]
  }
}
