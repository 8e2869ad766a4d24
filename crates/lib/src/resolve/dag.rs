//! Whole-graph checks run after every node is resolved.

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::consts::NINJA_FILE_NAME;
use crate::plugin::PluginError;

use super::types::{NodeId, ResolveError, ResolvedGraph, ResolvedProduct};

/// Check that output paths are unique and that products form a DAG.
pub fn check_products(graph: &ResolvedGraph) -> Result<(), ResolveError> {
  let producers = check_collisions(graph)?;
  check_nesting(&producers)?;
  check_acyclic(graph, &producers)
}

/// Map every output path to the product that declares it.
///
/// Paths are compared as written; plugins build them with the context's
/// path helpers, which never produce `.` or `..` segments.
fn check_collisions(graph: &ResolvedGraph) -> Result<BTreeMap<&str, (usize, &NodeId)>, ResolveError> {
  let mut producers: BTreeMap<&str, (usize, &NodeId)> = BTreeMap::new();

  for (index, (id, product)) in graph.products().enumerate() {
    for output in &product.outputs {
      if output == NINJA_FILE_NAME {
        return Err(ResolveError::ReservedOutput {
          path: output.clone(),
          node: id.clone(),
        });
      }
      if let Some((_, first)) = producers.insert(output, (index, id)) {
        return Err(ResolveError::Collision {
          path: output.clone(),
          first: first.clone(),
          second: id.clone(),
        });
      }
    }
  }

  Ok(producers)
}

/// Reject an output that sits below another output, which would need the
/// same path to be both a file and a directory.
fn check_nesting(producers: &BTreeMap<&str, (usize, &NodeId)>) -> Result<(), ResolveError> {
  for (path, (_, node)) in producers {
    let parents = path.match_indices('/').map(|(i, _)| &path[..i]);
    for parent in parents {
      if let Some((_, parent_node)) = producers.get(parent) {
        return Err(ResolveError::NestedOutput {
          path: path.to_string(),
          node: (*node).clone(),
          parent: parent.to_string(),
          parent_node: (*parent_node).clone(),
        });
      }
    }
  }
  Ok(())
}

fn check_acyclic(graph: &ResolvedGraph, producers: &BTreeMap<&str, (usize, &NodeId)>) -> Result<(), ResolveError> {
  let products: Vec<&ResolvedProduct> = graph.products().map(|(_, p)| p).collect();

  let mut dag: DiGraph<usize, ()> = DiGraph::new();
  let indices: Vec<NodeIndex> = (0..products.len()).map(|i| dag.add_node(i)).collect();

  for (consumer, product) in products.iter().enumerate() {
    for input in product.inputs.iter().chain(&product.implicit) {
      if let Some((producer, _)) = producers.get(input.as_str()) {
        dag.add_edge(indices[*producer], indices[consumer], ());
      }
    }
  }

  toposort(&dag, None).map_err(|cycle| {
    let product = products[dag[cycle.node_id()]];
    PluginError::ProductCycle {
      path: product.outputs.first().cloned().unwrap_or_default(),
    }
  })?;
  Ok(())
}
