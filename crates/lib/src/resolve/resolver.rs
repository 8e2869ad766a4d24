//! Depth-first resolution with an explicit stack.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::env::{Delta, Environment, ParameterError, Schema};
use crate::load::{LoadError, Loader};
use crate::package::{Ident, Target};
use crate::plugin::{EvalCtx, Evaluation, Input, PluginError, PluginRegistry, TargetKind};

use super::dag::check_products;
use super::types::{Node, NodeId, ResolveError, ResolvedGraph, ResolvedProduct};

/// Number of variants of one target above which a warning is logged.
const VARIANT_WARN_THRESHOLD: usize = 8;

/// A node whose dependencies are still being resolved.
struct Frame {
  id: NodeId,
  kind: Rc<dyn TargetKind>,
  env: Environment,
  evaluation: Evaluation,
  next: usize,
  dep_ids: Vec<NodeId>,
}

enum Entered {
  Resolved(NodeId),
  Pending(Box<Frame>),
}

/// Resolve targets into a deduplicated node graph.
///
/// With no `targets`, every target of every package is resolved under the
/// project's default environment. Otherwise only the named targets and
/// their transitive dependencies are.
pub fn resolve(loader: &mut Loader, targets: &[Ident]) -> Result<ResolvedGraph, ResolveError> {
  let seeds = match targets {
    [] => all_targets(loader)?,
    named => named.to_vec(),
  };

  let mut resolver = Resolver::new(loader);
  let mut roots = BTreeSet::new();
  for ident in &seeds {
    let env = resolver.root_env.clone();
    roots.insert(resolver.resolve_request(ident, env)?);
  }

  let graph = ResolvedGraph::new(resolver.nodes, roots.into_iter().collect());
  check_products(&graph)?;

  info!(
    nodes = graph.len(),
    products = graph.product_count(),
    "graph resolved"
  );
  Ok(graph)
}

fn all_targets(loader: &mut Loader) -> Result<Vec<Ident>, LoadError> {
  let mut idents = Vec::new();
  for path in loader.package_paths() {
    let package = loader.package(&path)?;
    idents.extend(package.targets().map(|t| t.ident().clone()));
  }
  Ok(idents)
}

struct Resolver<'l> {
  loader: &'l mut Loader,
  registry: Rc<PluginRegistry>,
  schema: Schema,
  root_env: Environment,
  nodes: BTreeMap<NodeId, Node>,
  variants: BTreeMap<Ident, usize>,
}

impl<'l> Resolver<'l> {
  fn new(loader: &'l mut Loader) -> Self {
    let root_env = loader.config().environment.clone();
    Self {
      registry: loader.registry(),
      schema: Schema::from_environment(&root_env),
      root_env,
      loader,
      nodes: BTreeMap::new(),
      variants: BTreeMap::new(),
    }
  }

  fn resolve_request(&mut self, ident: &Ident, env: Environment) -> Result<NodeId, ResolveError> {
    let mut stack: Vec<Box<Frame>> = Vec::new();
    let root = match self.enter(ident, env, None, &stack)? {
      Entered::Resolved(id) => return Ok(id),
      Entered::Pending(frame) => {
        let id = frame.id.clone();
        stack.push(frame);
        id
      }
    };

    while let Some(top) = stack.last() {
      if let Some(dep) = top.evaluation.deps.get(top.next) {
        let from = top.id.target.clone();
        let env = self.dependency_env(&from, &top.env, &dep.delta)?;
        match self.enter(&dep.target, env, Some(&from), &stack)? {
          Entered::Resolved(id) => record_dep(&mut stack, id),
          Entered::Pending(frame) => stack.push(frame),
        }
        continue;
      }

      if let Some(frame) = stack.pop() {
        let node = self.finish(*frame);
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        record_dep(&mut stack, id);
      }
    }

    Ok(root)
  }

  /// The environment a dependency is requested with.
  ///
  /// Starts from the project defaults, overlays the requester's narrowed
  /// environment, then applies the edge's delta. Keys outside the
  /// requester's sensitivity set revert to their defaults, which keeps the
  /// result a function of the requester's identity.
  fn dependency_env(
    &self,
    from: &Ident,
    narrowed: &Environment,
    delta: &Delta,
  ) -> Result<Environment, ResolveError> {
    self.schema.check(delta).map_err(|e| match e {
      ParameterError::Unknown { key } => ResolveError::UnknownParameter {
        target: from.clone(),
        key,
      },
      source => ResolveError::Parameter {
        target: from.clone(),
        source,
      },
    })?;

    self
      .root_env
      .derive(&narrowed.to_delta().then(delta))
      .map_err(|source| ResolveError::Parameter {
        target: from.clone(),
        source,
      })
  }

  fn enter(
    &mut self,
    ident: &Ident,
    env: Environment,
    from: Option<&Ident>,
    stack: &[Box<Frame>],
  ) -> Result<Entered, ResolveError> {
    let target = self.loader.target(ident).map_err(|e| match (e, from) {
      (LoadError::UnknownTarget(_) | LoadError::UnknownPackage(_), Some(from)) => ResolveError::UnknownDependency {
        from: from.clone(),
        target: ident.clone(),
      },
      (e, _) => ResolveError::Load(e),
    })?;

    let kind = self
      .registry
      .kind(target.kind())
      .cloned()
      .ok_or_else(|| PluginError::UnknownKind {
        target: ident.clone(),
        kind: target.kind().to_string(),
      })?;

    let narrowed = env.narrow(kind.sensitivity().iter().copied());
    let id = NodeId {
      target: ident.clone(),
      digest: narrowed.digest(),
    };

    if self.nodes.contains_key(&id) {
      return Ok(Entered::Resolved(id));
    }

    // The chain runs from the requested target down to the repeated node.
    if stack.iter().any(|f| f.id == id) {
      let mut chain: Vec<NodeId> = stack.iter().map(|f| f.id.clone()).collect();
      chain.push(id);
      return Err(ResolveError::Cycle { chain });
    }

    debug!(node = %id, kind = kind.name(), "evaluating target");
    PluginRegistry::check_params(kind.as_ref(), &target).map_err(|source| ResolveError::Parameter {
      target: ident.clone(),
      source,
    })?;

    let evaluation = {
      let ctx = EvalCtx::new(self.loader.root(), &target, &narrowed, &id.digest);
      kind.evaluate(&ctx)?
    };
    self.validate(&target, &evaluation)?;

    let count = self.variants.entry(ident.clone()).or_default();
    *count += 1;
    if *count > 1 {
      debug!(target = %ident, variants = *count, "additional variant");
    }
    if *count == VARIANT_WARN_THRESHOLD + 1 {
      warn!(target = %ident, "more than {} variants of one target", VARIANT_WARN_THRESHOLD);
    }

    Ok(Entered::Pending(Box::new(Frame {
      id,
      kind,
      env: narrowed,
      evaluation,
      next: 0,
      dep_ids: Vec::new(),
    })))
  }

  /// Check what a plugin returned against the contract.
  fn validate(&self, target: &Target, evaluation: &Evaluation) -> Result<(), PluginError> {
    let ident = target.ident();
    let dep_count = evaluation.deps.len();
    let mut outputs = BTreeSet::new();

    for product in &evaluation.products {
      if self.registry.rule(&product.rule).is_none() {
        return Err(PluginError::UnknownRule {
          target: ident.clone(),
          rule: product.rule.clone(),
        });
      }
      if product.outputs.is_empty() {
        return Err(PluginError::NoOutputs {
          target: ident.clone(),
          rule: product.rule.clone(),
        });
      }
      for input in product.inputs.iter().chain(&product.implicit) {
        if let Input::Dep(index) = input
          && *index >= dep_count
        {
          return Err(PluginError::DepOutOfRange {
            target: ident.clone(),
            index: *index,
            count: dep_count,
          });
        }
      }
      outputs.extend(product.outputs.iter().map(String::as_str));
    }

    for export in &evaluation.exports {
      if !outputs.contains(export.as_str()) {
        return Err(PluginError::ExportNotProduced {
          target: ident.clone(),
          path: export.clone(),
        });
      }
    }
    Ok(())
  }

  /// Build the node once every dependency is resolved.
  fn finish(&self, frame: Frame) -> Node {
    let Frame {
      id,
      kind,
      env,
      evaluation,
      dep_ids,
      ..
    } = frame;

    let products = evaluation
      .products
      .iter()
      .map(|p| ResolvedProduct {
        rule: p.rule.clone(),
        outputs: p.outputs.clone(),
        inputs: self.expand(&dep_ids, &p.inputs),
        implicit: self.expand(&dep_ids, &p.implicit),
        variables: p.variables.clone(),
      })
      .collect();

    let mut exports = evaluation.exports;
    if kind.transparent() {
      for index in 0..dep_ids.len() {
        exports.extend(self.exports_of(&dep_ids, index).iter().cloned());
      }
    }

    debug!(node = %id, deps = dep_ids.len(), "node resolved");
    Node {
      id,
      kind: kind.name().to_string(),
      env,
      products,
      deps: dedup(dep_ids),
      exports: dedup_last(exports),
    }
  }

  fn exports_of(&self, dep_ids: &[NodeId], index: usize) -> &[String] {
    dep_ids
      .get(index)
      .and_then(|dep| self.nodes.get(dep))
      .map(|n| n.exports.as_slice())
      .unwrap_or_default()
  }

  /// Replace every [`Input::Dep`] with the exports of that dependency.
  fn expand(&self, dep_ids: &[NodeId], inputs: &[Input]) -> Vec<String> {
    let mut expanded = Vec::new();
    for input in inputs {
      match input {
        Input::File(path) => expanded.push(path.clone()),
        Input::Dep(index) => expanded.extend(self.exports_of(dep_ids, *index).iter().cloned()),
      }
    }
    dedup_last(expanded)
  }
}

/// Record a resolved dependency on the frame waiting for it.
fn record_dep(stack: &mut [Box<Frame>], id: NodeId) {
  if let Some(parent) = stack.last_mut() {
    parent.dep_ids.push(id);
    parent.next += 1;
  }
}

/// Remove repeated items, keeping the first occurrence.
fn dedup<T: Ord + Clone>(items: Vec<T>) -> Vec<T> {
  let mut seen = BTreeSet::new();
  items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

/// Remove repeated items, keeping the last occurrence.
///
/// Export lists place every library before the libraries it uses. Keeping
/// the last copy of a shared library preserves that across merged lists,
/// which is the order a single-pass linker needs.
fn dedup_last<T: Ord + Clone>(items: Vec<T>) -> Vec<T> {
  let mut seen = BTreeSet::new();
  let mut kept: Vec<T> = items.into_iter().rev().filter(|item| seen.insert(item.clone())).collect();
  kept.reverse();
  kept
}
