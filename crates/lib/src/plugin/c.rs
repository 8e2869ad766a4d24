//! C toolchain plugin.
//!
//! Provides two kinds:
//!
//! - `c_library`: compiles `sources` to objects and archives them. It is
//!   transparent, so a binary linking it also links the libraries it
//!   depends on.
//! - `c_binary`: compiles `sources` and links them with the exports of its
//!   dependencies.
//!
//! Both read `cc`, `ar`, `cflags`, `ldflags`, and `arch` from the
//! environment. `arch` does not feed a command line; it separates variants
//! that use different toolchains under the same `cc` name.
//!
//! ```lua
//! c_library {
//!   name = "util",
//!   sources = { "util.c" },
//!   includes = { "include" },
//! }
//!
//! c_binary {
//!   name = "app",
//!   sources = { "main.c" },
//!   deps = { ":util", dep("//third_party/z", { arch = "host" }) },
//! }
//! ```

use std::rc::Rc;

use crate::emit::shell_quote;
use crate::env::ValueType;

use super::{EvalCtx, Evaluation, Input, ParamSpec, Plugin, PluginError, Product, Rule, TargetKind};

const SENSITIVITY: &[&str] = &["arch", "cc", "ar", "cflags", "ldflags"];

const LIBRARY_PARAMS: &[ParamSpec] = &[
  ParamSpec::required("sources", ValueType::List),
  ParamSpec::optional("cflags", ValueType::List),
  ParamSpec::optional("includes", ValueType::List),
];

const BINARY_PARAMS: &[ParamSpec] = &[
  ParamSpec::required("sources", ValueType::List),
  ParamSpec::optional("cflags", ValueType::List),
  ParamSpec::optional("includes", ValueType::List),
  ParamSpec::optional("ldflags", ValueType::List),
  ParamSpec::optional("libs", ValueType::List),
];

pub struct CPlugin;

impl Plugin for CPlugin {
  fn name(&self) -> &str {
    "c"
  }

  fn kinds(&self) -> Vec<Rc<dyn TargetKind>> {
    vec![Rc::new(CLibrary), Rc::new(CBinary)]
  }

  fn rules(&self) -> Vec<Rule> {
    vec![
      Rule::new("cc", "$cc $cflags -MMD -MF $out.d -c $in -o $out")
        .with_description("CC $out")
        .with_depfile("$out.d", "gcc"),
      Rule::new("ar", "rm -f $out && $ar rcs $out $in").with_description("AR $out"),
      Rule::new("link", "$cc $ldflags -o $out $in $libs").with_description("LINK $out"),
    ]
  }
}

pub struct CLibrary;

impl TargetKind for CLibrary {
  fn name(&self) -> &str {
    "c_library"
  }

  fn sensitivity(&self) -> &[&str] {
    SENSITIVITY
  }

  fn parameters(&self) -> &[ParamSpec] {
    LIBRARY_PARAMS
  }

  fn evaluate(&self, ctx: &EvalCtx<'_>) -> Result<Evaluation, PluginError> {
    let (mut products, objects) = compile(ctx)?;

    let archive = ctx.outpath(&format!("lib{}.a", ctx.target().name()));
    products.push(
      Product::new("ar")
        .output(archive.clone())
        .inputs(objects.into_iter().map(Input::File))
        .var("ar", ctx.env_str("ar")?),
    );

    Ok(Evaluation {
      products,
      deps: ctx.target().deps().to_vec(),
      exports: vec![archive],
    })
  }
}

pub struct CBinary;

impl TargetKind for CBinary {
  fn name(&self) -> &str {
    "c_binary"
  }

  fn sensitivity(&self) -> &[&str] {
    SENSITIVITY
  }

  fn parameters(&self) -> &[ParamSpec] {
    BINARY_PARAMS
  }

  fn transparent(&self) -> bool {
    false
  }

  fn evaluate(&self, ctx: &EvalCtx<'_>) -> Result<Evaluation, PluginError> {
    let target = ctx.target();
    let (mut products, objects) = compile(ctx)?;
    let deps = target.deps().to_vec();

    let mut ldflags = ctx.env_strings("ldflags");
    ldflags.extend(target.str_list("ldflags"));
    let libs: Vec<String> = target.str_list("libs").iter().map(|l| format!("-l{}", l)).collect();

    let binary = ctx.outpath(target.name());
    products.push(
      Product::new("link")
        .output(binary.clone())
        .inputs(objects.into_iter().map(Input::File))
        .inputs((0..deps.len()).map(Input::Dep))
        .var("cc", ctx.env_str("cc")?)
        .var("ldflags", ldflags.join(" "))
        .var("libs", libs.join(" ")),
    );

    Ok(Evaluation {
      products,
      deps,
      exports: vec![binary],
    })
  }
}

/// One `cc` product per source. Returns the products and the object paths.
fn compile(ctx: &EvalCtx<'_>) -> Result<(Vec<Product>, Vec<String>), PluginError> {
  let target = ctx.target();
  let cc = ctx.env_str("cc")?;

  let mut cflags = ctx.env_strings("cflags");
  cflags.extend(target.str_list("cflags"));
  cflags.extend(
    target
      .str_list("includes")
      .iter()
      .map(|dir| format!("-I{}", shell_quote(&ctx.inpath(dir)))),
  );
  let cflags = cflags.join(" ");

  let mut products = Vec::new();
  let mut objects = Vec::new();
  for source in target.str_list("sources") {
    let object = ctx.outpath(&format!("{}.o", source.trim_start_matches('/')));
    products.push(
      Product::new("cc")
        .output(object.clone())
        .input(Input::File(ctx.inpath(&source)))
        .var("cc", cc)
        .var("cflags", cflags.clone()),
    );
    objects.push(object);
  }
  Ok((products, objects))
}
