//! Shared fixtures for library integration tests.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use cobble_lib::consts::{BUILD_FILE_NAME, NINJA_FILE_NAME, PROJECT_FILE_NAME};
use cobble_lib::env::ValueType;
use cobble_lib::generate::{GenerateError, GenerateOptions, GenerateReport, generate_with};
use cobble_lib::plugin::{EvalCtx, Evaluation, Input, ParamSpec, Plugin, PluginError, Product, Rule, TargetKind};
use tempfile::TempDir;

/// A project tree plus a separate build directory.
pub struct TestProject {
  root: TempDir,
  build: TempDir,
}

impl TestProject {
  pub fn new(project_lua: &str) -> Self {
    let project = Self {
      root: TempDir::new().expect("failed to create project dir"),
      build: TempDir::new().expect("failed to create build dir"),
    };
    project.write(PROJECT_FILE_NAME, project_lua);
    project
  }

  pub fn package(self, path: &str, content: &str) -> Self {
    let rel = if path.is_empty() {
      BUILD_FILE_NAME.to_string()
    } else {
      format!("{}/{}", path, BUILD_FILE_NAME)
    };
    self.write(&rel, content);
    self
  }

  pub fn write(&self, rel: &str, content: &str) {
    let path = self.root.path().join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).expect("failed to create dir");
    }
    fs::write(path, content).expect("failed to write file");
  }

  pub fn root(&self) -> &Path {
    self.root.path()
  }

  pub fn build_dir(&self) -> &Path {
    self.build.path()
  }

  pub fn options(&self, targets: &[&str]) -> GenerateOptions {
    GenerateOptions {
      root: self.root().to_path_buf(),
      build_dir: self.build_dir().to_path_buf(),
      targets: targets.iter().map(|t| t.to_string()).collect(),
      force: true,
      dry_run: false,
    }
  }

  pub fn generate(&self, targets: &[&str]) -> Result<GenerateReport, GenerateError> {
    generate_with(&self.options(targets), &[&ToyPlugin])
  }

  pub fn ninja(&self) -> Option<String> {
    fs::read_to_string(self.build_dir().join(NINJA_FILE_NAME)).ok()
  }
}

/// `build` lines of a rendered file, excluding the regeneration edge.
pub fn product_edges(ninja: &str) -> Vec<&str> {
  ninja
    .lines()
    .filter(|l| l.starts_with("build ") && !l.starts_with("build build.ninja:"))
    .collect()
}

pub fn regen_edges(ninja: &str) -> Vec<&str> {
  ninja.lines().filter(|l| l.starts_with("build build.ninja:")).collect()
}

/// One product per target.
///
/// - `toy_lib`: sensitive to `arch`, exports its output
/// - `toy_app`: sensitive to `arch`, consumes dependency exports
/// - `toy_file`: no sensitivity, writes to the path given by `out`
pub struct ToyPlugin;

struct ToyKind(&'static str);

const ARCH: &[&str] = &["arch"];
const FILE_PARAMS: &[ParamSpec] = &[ParamSpec::required("out", ValueType::Str)];

impl TargetKind for ToyKind {
  fn name(&self) -> &str {
    self.0
  }

  fn sensitivity(&self) -> &[&str] {
    match self.0 {
      "toy_file" => &[],
      _ => ARCH,
    }
  }

  fn parameters(&self) -> &[ParamSpec] {
    match self.0 {
      "toy_file" => FILE_PARAMS,
      _ => &[],
    }
  }

  fn transparent(&self) -> bool {
    self.0 == "toy_lib"
  }

  fn evaluate(&self, ctx: &EvalCtx<'_>) -> Result<Evaluation, PluginError> {
    let target = ctx.target();
    let deps = target.deps().to_vec();
    let out = match self.0 {
      "toy_file" => target
        .require_str("out")
        .map_err(|e| ctx.param_error(e))?
        .to_string(),
      _ => ctx.outpath("out.txt"),
    };
    let product = Product::new("toy")
      .output(out.clone())
      .inputs((0..deps.len()).map(Input::Dep))
      .var("arch", ctx.env().get_str("arch").ok().flatten().unwrap_or("none"));

    Ok(Evaluation {
      products: vec![product],
      deps,
      exports: vec![out],
    })
  }
}

impl Plugin for ToyPlugin {
  fn name(&self) -> &str {
    "toy"
  }

  fn kinds(&self) -> Vec<Rc<dyn TargetKind>> {
    vec![
      Rc::new(ToyKind("toy_lib")),
      Rc::new(ToyKind("toy_app")),
      Rc::new(ToyKind("toy_file")),
    ]
  }

  fn rules(&self) -> Vec<Rule> {
    vec![Rule::new("toy", "echo $arch > $out").with_description("TOY $out")]
  }
}
