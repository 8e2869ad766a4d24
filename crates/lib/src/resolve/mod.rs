//! Graph resolution.
//!
//! Turns requested targets into a deduplicated DAG of nodes, one per
//! (target, narrowed environment) pair:
//!
//! 1. A request `(target, env)` is narrowed to the kind's sensitivity set and
//!    identified by `(target, digest(narrowed))`.
//! 2. A known identity is reused. An identity already on the resolution
//!    stack is a [`ResolveError::Cycle`].
//! 3. Otherwise the target is evaluated with the narrowed environment and
//!    each dependency request is resolved with the environment derived from
//!    the narrowed one and the edge's delta.
//! 4. Once the dependencies are resolved, [`Input::Dep`](crate::plugin::Input)
//!    inputs are expanded to the dependencies' exports and the node is
//!    recorded.
//!
//! Because dependency environments only depend on the requester's
//! identity, the node set and edges do not depend on request order. A final
//! pass rejects output collisions and product-level cycles.

mod dag;
mod resolver;
mod types;

pub use resolver::resolve;
pub use types::*;
