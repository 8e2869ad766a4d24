use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::env::{Environment, ParameterError};
use crate::load::LoadError;
use crate::package::Ident;
use crate::plugin::PluginError;
use crate::util::hash::Fingerprint;

/// Identity of a resolved node: the target plus the digest of its narrowed
/// environment. This is the only deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId {
  pub target: Ident,
  pub digest: Fingerprint,
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.target, self.digest)
  }
}

/// A product with dependency inputs expanded to concrete paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProduct {
  pub rule: String,
  pub outputs: Vec<String>,
  pub inputs: Vec<String>,
  pub implicit: Vec<String>,
  pub variables: BTreeMap<String, String>,
}

/// One (target, narrowed environment) pair after evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
  pub id: NodeId,
  pub kind: String,
  pub env: Environment,
  pub products: Vec<ResolvedProduct>,
  /// Nodes this one depends on, deduplicated, in request order.
  pub deps: Vec<NodeId>,
  /// Outputs offered to dependents.
  pub exports: Vec<String>,
}

/// The deduplicated node DAG of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedGraph {
  nodes: BTreeMap<NodeId, Node>,
  roots: Vec<NodeId>,
}

impl ResolvedGraph {
  pub(crate) fn new(nodes: BTreeMap<NodeId, Node>, roots: Vec<NodeId>) -> Self {
    Self { nodes, roots }
  }

  /// Nodes sorted by identity.
  pub fn nodes(&self) -> impl Iterator<Item = &Node> {
    self.nodes.values()
  }

  pub fn node(&self, id: &NodeId) -> Option<&Node> {
    self.nodes.get(id)
  }

  /// Nodes of `target`, one per distinct narrowed environment.
  pub fn variants<'a>(&'a self, target: &Ident) -> impl Iterator<Item = &'a Node> + use<'a> {
    let target = target.clone();
    self.nodes.values().filter(move |n| n.id.target == target)
  }

  /// Nodes the resolution was seeded with, sorted and deduplicated.
  pub fn roots(&self) -> &[NodeId] {
    &self.roots
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Every product in emission order: by node identity, then declaration
  /// order within the node.
  pub fn products(&self) -> impl Iterator<Item = (&NodeId, &ResolvedProduct)> {
    self
      .nodes
      .values()
      .flat_map(|n| n.products.iter().map(move |p| (&n.id, p)))
  }

  pub fn product_count(&self) -> usize {
    self.nodes.values().map(|n| n.products.len()).sum()
  }
}

/// Errors that abort graph resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error(transparent)]
  Load(#[from] LoadError),

  #[error(transparent)]
  Plugin(#[from] PluginError),

  #[error("{from} depends on unknown target '{target}'")]
  UnknownDependency { from: Ident, target: Ident },

  #[error("dependency cycle: {}", format_chain(.chain))]
  Cycle { chain: Vec<NodeId> },

  #[error("{target}: dependency delta sets unknown parameter '{key}'")]
  UnknownParameter { target: Ident, key: String },

  #[error("{target}: {source}")]
  Parameter {
    target: Ident,
    #[source]
    source: ParameterError,
  },

  #[error("output '{path}' is produced by both {first} and {second}")]
  Collision { path: String, first: NodeId, second: NodeId },

  #[error("output '{path}' of {node} lies inside output '{parent}' of {parent_node}")]
  NestedOutput {
    path: String,
    node: NodeId,
    parent: String,
    parent_node: NodeId,
  },

  #[error("{node} claims reserved output '{path}'")]
  ReservedOutput { path: String, node: NodeId },
}

fn format_chain(chain: &[NodeId]) -> String {
  chain.iter().map(|id| id.target.to_string()).collect::<Vec<_>>().join(" -> ")
}
